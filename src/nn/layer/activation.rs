/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : 无参数的层：激活函数与逐样本重塑
 */

use super::Layer;
use crate::nn::{GraphError, Var, VarActivationOps, VarShapeOps};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Relu,
    LeakyRelu(f32),
    Tanh,
}

impl Layer for Activation {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        Ok(match self {
            Self::Relu => x.relu(),
            Self::LeakyRelu(slope) => x.leaky_relu(*slope),
            Self::Tanh => x.tanh(),
        })
    }
}

/// 保持第0维（批）不变，把每个样本重塑为`sample_shape`
#[derive(Debug, Clone)]
pub struct Reshape {
    sample_shape: Vec<usize>,
}

impl Reshape {
    pub fn new(sample_shape: &[usize]) -> Self {
        Self {
            sample_shape: sample_shape.to_vec(),
        }
    }
}

impl Layer for Reshape {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let batch = x.shape().first().copied().unwrap_or(1);
        let mut shape = vec![batch];
        shape.extend_from_slice(&self.sample_shape);
        x.reshape(&shape)
    }
}
