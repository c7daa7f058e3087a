/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Layer 模块
 *
 * 网络由有序的 `LayerKind` 序列组合而成；每个层只暴露三件事：
 * 前向计算、带名字的可训练参数、带名字的归一化运行统计量。
 * 参数名统一为`{层名}_{后缀}`，同一网络内须唯一。
 */

mod activation;
mod batch_norm;
mod conv2d;
mod deconv2d;
mod linear;
mod res_block;

pub use activation::{Activation, Reshape};
pub use batch_norm::{BatchNorm, RunningStats};
pub use conv2d::Conv2d;
pub use deconv2d::Deconv2d;
pub use linear::Linear;
pub use res_block::{ResBlockDown, ResBlockUp};

use crate::nn::{GraphError, Var};
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait Layer {
    fn forward(&self, x: &Var) -> Result<Var, GraphError>;

    fn named_parameters(&self) -> Vec<(String, Var)> {
        Vec::new()
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        Vec::new()
    }
}

#[enum_dispatch(Layer)]
pub enum LayerKind {
    Linear,
    Conv2d,
    Deconv2d,
    BatchNorm,
    Activation,
    Reshape,
    ResBlockUp,
    ResBlockDown,
}

/// 依次通过各层
pub fn forward_sequence(layers: &[LayerKind], x: &Var) -> Result<Var, GraphError> {
    layers
        .iter()
        .try_fold(x.clone(), |h, layer| layer.forward(&h))
}

#[cfg(test)]
mod tests;
