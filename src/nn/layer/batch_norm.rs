/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : BatchNorm 层
 *
 * - 2阶输入[B, C]按第0维统计，4阶输入[B, C, H, W]按第0、2、3维统计（逐通道）
 * - 训练模式用当前批次统计量并更新运行统计量，eval 模式只读运行统计量
 * - 运行方差用无偏估计（乘以 m/(m-1)）更新，衰减率默认0.9，eps 默认2e-5
 */

use super::Layer;
use crate::nn::{Graph, GraphError, Init, Var, VarActivationOps, VarShapeOps};
use crate::tensor::Tensor;

pub const DEFAULT_EPS: f32 = 2e-5;
pub const DEFAULT_DECAY: f32 = 0.9;

/// 归一化层的运行均值与运行方差（形状均为[C]），不参与梯度计算
#[derive(Clone)]
pub struct RunningStats {
    pub mean: Var,
    pub var: Var,
}

impl RunningStats {
    fn new(graph: &Graph, channels: usize, name: &str) -> Self {
        Self {
            mean: graph.input_named(&Tensor::zeros(&[channels]), &format!("{name}_avg_mean")),
            var: graph.input_named(&Tensor::ones(&[channels]), &format!("{name}_avg_var")),
        }
    }
}

pub struct BatchNorm {
    /// 缩放 [C]，`use_gamma`为 false 时不存在（等价于恒为1）
    gamma: Option<Var>,
    /// 平移 [C]
    beta: Var,
    stats: RunningStats,
    channels: usize,
    eps: f32,
    decay: f32,
    name: String,
}

impl BatchNorm {
    pub fn new(graph: &Graph, channels: usize, use_gamma: bool, name: &str) -> Result<Self, GraphError> {
        let gamma = if use_gamma {
            Some(graph.parameter(&[channels], Init::Ones, &format!("{name}_gamma"))?)
        } else {
            None
        };
        let beta = graph.parameter(&[channels], Init::Zeros, &format!("{name}_beta"))?;
        Ok(Self {
            gamma,
            beta,
            stats: RunningStats::new(graph, channels, name),
            channels,
            eps: DEFAULT_EPS,
            decay: DEFAULT_DECAY,
            name: name.to_string(),
        })
    }

    pub const fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// 统计所沿的维度以及可与输入广播的参数形状
    fn layout(&self, shape: &[usize]) -> Result<(Vec<usize>, Vec<usize>), GraphError> {
        let (axes, param_shape) = match shape.len() {
            2 => (vec![0], vec![1, self.channels]),
            4 => (vec![0, 2, 3], vec![1, self.channels, 1, 1]),
            n => {
                return Err(GraphError::DimensionMismatch {
                    expected: 4,
                    got: n,
                    message: format!("{}层只接受2阶或4阶输入", self.name),
                });
            }
        };
        if shape[1] != self.channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![shape[0], self.channels],
                got: shape.to_vec(),
                message: format!("{}层的通道数不符", self.name),
            });
        }
        Ok((axes, param_shape))
    }

    /// 用本批次统计量更新运行统计量
    fn update_running_stats(&self, mean: &Tensor, var: &Tensor, count: usize) -> Result<(), GraphError> {
        let shape = [self.channels];
        let unbiased = count as f32 / (count.saturating_sub(1).max(1)) as f32;
        let new_mean = self.stats.mean.value() * self.decay + mean.reshape(&shape) * (1.0 - self.decay);
        let new_var = self.stats.var.value() * self.decay
            + var.reshape(&shape) * ((1.0 - self.decay) * unbiased);
        self.stats.mean.set_value(&new_mean)?;
        self.stats.var.set_value(&new_var)
    }
}

impl Layer for BatchNorm {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let shape = x.shape();
        let (axes, param_shape) = self.layout(&shape)?;
        let graph = x.get_graph();

        let normalized = if graph.is_train() {
            let mean = x.mean_axes_keepdims(&axes)?;
            let centered = x.try_sub(&mean)?;
            let var = centered.square().mean_axes_keepdims(&axes)?;
            let count = axes.iter().map(|&a| shape[a]).product();
            self.update_running_stats(&mean.value(), &var.value(), count)?;
            centered.try_div(&var.add_scalar(self.eps).sqrt())?
        } else {
            let mean = graph.constant(&self.stats.mean.value().reshape(&param_shape));
            let std = graph.constant(
                &(self.stats.var.value().reshape(&param_shape) + self.eps).sqrt(),
            );
            x.try_sub(&mean)?.try_div(&std)?
        };

        let scaled = match &self.gamma {
            Some(gamma) => normalized.try_mul(&gamma.reshape(&param_shape)?)?,
            None => normalized,
        };
        scaled.try_add(&self.beta.reshape(&param_shape)?)
    }

    fn named_parameters(&self) -> Vec<(String, Var)> {
        let mut params = Vec::with_capacity(2);
        if let Some(gamma) = &self.gamma {
            params.push((format!("{}_gamma", self.name), gamma.clone()));
        }
        params.push((format!("{}_beta", self.name), self.beta.clone()));
        params
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        vec![(self.name.clone(), self.stats.clone())]
    }
}
