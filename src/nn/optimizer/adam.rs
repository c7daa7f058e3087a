/*
 * @Author       : 老董
 * @Date         : 2026-03-07
 * @Description  : Adam 优化器
 *
 * - m = β1 * m + (1 - β1) * g
 * - v = β2 * v + (1 - β2) * g²
 * - α_t = α * √(1 - β2^t) / (1 - β1^t)
 * - θ = θ - α_t * m / (√v + ε)
 *
 * 矩估计以参数名为键，可导出为 `AdamState` 持久化后再恢复。
 */

use super::{Optimizer, ensure_unique_names};
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Adam {
    params: Vec<(String, Var)>,
    /// 学习率（α）
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计
    m: BTreeMap<String, Tensor>,
    /// 二阶矩估计
    v: BTreeMap<String, Tensor>,
    /// 时间步
    t: u64,
}

/// Adam 的可序列化状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamState {
    pub lr: f32,
    pub t: u64,
    pub m: BTreeMap<String, Tensor>,
    pub v: BTreeMap<String, Tensor>,
}

impl Adam {
    pub fn new(params: Vec<(String, Var)>, lr: f32, beta1: f32, beta2: f32) -> Result<Self, GraphError> {
        Self::with_epsilon(params, lr, beta1, beta2, 1e-8)
    }

    pub fn with_epsilon(
        params: Vec<(String, Var)>,
        lr: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    ) -> Result<Self, GraphError> {
        ensure_unique_names(&params)?;
        Ok(Self {
            params,
            lr,
            beta1,
            beta2,
            epsilon,
            m: BTreeMap::new(),
            v: BTreeMap::new(),
            t: 0,
        })
    }

    pub const fn steps(&self) -> u64 {
        self.t
    }

    /// 所有绑定参数的梯度（名字, 梯度），没有梯度的参数不出现
    pub fn gradients(&self) -> Vec<(&str, Tensor)> {
        self.params
            .iter()
            .filter_map(|(name, param)| param.grad().map(|g| (name.as_str(), g)))
            .collect()
    }

    pub fn state(&self) -> AdamState {
        AdamState {
            lr: self.lr,
            t: self.t,
            m: self.m.clone(),
            v: self.v.clone(),
        }
    }

    /// 恢复状态；矩估计的名字须都属于绑定的参数且形状一致
    pub fn load_state(&mut self, state: AdamState) -> Result<(), GraphError> {
        for (name, moment) in state.m.iter().chain(state.v.iter()) {
            let Some((_, param)) = self.params.iter().find(|(n, _)| n == name) else {
                return Err(GraphError::InvalidOperation(format!(
                    "优化器状态中的参数{name}不属于本优化器"
                )));
            };
            if param.shape() != moment.shape() {
                return Err(GraphError::ShapeMismatch {
                    expected: param.shape(),
                    got: moment.shape().to_vec(),
                    message: format!("参数{name}的矩估计形状"),
                });
            }
        }
        self.lr = state.lr;
        self.t = state.t;
        self.m = state.m;
        self.v = state.v;
        Ok(())
    }
}

impl Optimizer for Adam {
    fn zero_grad(&mut self) {
        for (_, param) in &self.params {
            param.clear_grad();
        }
    }

    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;
        let t = self.t as i32;
        let lr_t = self.lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));
        for (name, param) in &self.params {
            let Some(grad) = param.grad() else {
                continue;
            };
            let m = self
                .m
                .entry(name.clone())
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *m *= self.beta1;
            *m += &grad * (1.0 - self.beta1);

            let v = self
                .v
                .entry(name.clone())
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *v *= self.beta2;
            *v += &(&grad * &grad) * (1.0 - self.beta2);

            let update = &*m / &(v.sqrt() + self.epsilon);
            let new_value = param.value() - update * lr_t;
            param.set_value(&new_value)?;
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
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }
}
