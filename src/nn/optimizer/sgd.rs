/*
 * @Author       : 老董
 * @Date         : 2026-03-07
 * @Description  : SGD 优化器：θ = θ - α * ∇θ
 */

use super::{Optimizer, ensure_unique_names};
use crate::nn::{GraphError, Var};

pub struct SGD {
    params: Vec<(String, Var)>,
    lr: f32,
}

impl SGD {
    pub fn new(params: Vec<(String, Var)>, lr: f32) -> Result<Self, GraphError> {
        ensure_unique_names(&params)?;
        Ok(Self { params, lr })
    }
}

impl Optimizer for SGD {
    fn zero_grad(&mut self) {
        for (_, param) in &self.params {
            param.clear_grad();
        }
    }

    fn step(&mut self) -> Result<(), GraphError> {
        for (_, param) in &self.params {
            if let Some(grad) = param.grad() {
                let new_value = param.value() - &grad * self.lr;
                param.set_value(&new_value)?;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn reset(&mut self) {
        // SGD 无状态
    }
}
