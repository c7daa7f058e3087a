/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Linear (全连接) 层
 */

use super::Layer;
use crate::nn::{Graph, GraphError, Init, Var, VarMatrixOps, VarShapeOps};

/// Linear (全连接) 层：`output = x @ W + b`
///
/// # 输入/输出形状
/// - 输入：[batch_size, in_features]，更高阶的输入会先展平为[batch_size, ...]
/// - 输出：[batch_size, out_features]
pub struct Linear {
    /// 权重参数 [in_features, out_features]
    weights: Var,
    /// 偏置参数 [1, out_features]
    bias: Var,
    in_features: usize,
    out_features: usize,
    name: String,
}

impl Linear {
    pub fn new(
        graph: &Graph,
        in_features: usize,
        out_features: usize,
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let weights = graph.parameter(&[in_features, out_features], init, &format!("{name}_W"))?;
        let bias = graph.parameter(&[1, out_features], Init::Zeros, &format!("{name}_b"))?;
        Ok(Self {
            weights,
            bias,
            in_features,
            out_features,
            name: name.to_string(),
        })
    }

    pub const fn in_features(&self) -> usize {
        self.in_features
    }

    pub const fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Layer for Linear {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let x = if x.shape().len() == 2 {
            x.clone()
        } else {
            x.flatten()?
        };
        let features = x.shape()[1];
        if features != self.in_features {
            return Err(GraphError::ShapeMismatch {
                expected: vec![x.shape()[0], self.in_features],
                got: x.shape(),
                message: format!("{}层的输入特征数不符", self.name),
            });
        }
        x.matmul(&self.weights)?.try_add(&self.bias)
    }

    fn named_parameters(&self) -> Vec<(String, Var)> {
        vec![
            (format!("{}_W", self.name), self.weights.clone()),
            (format!("{}_b", self.name), self.bias.clone()),
        ]
    }
}
