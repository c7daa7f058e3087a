/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-07 10:12:41
 * @Description  : 负责神经网络（neural network）的构建：即时求值的自动微分、层与优化器
 */

mod graph;
pub mod layer;
mod module;
pub(crate) mod nodes;
pub mod optimizer;
mod var;
mod var_ops;

pub use graph::{Graph, GraphError, GraphInner};
pub use layer::{Layer, LayerKind, RunningStats};
pub use module::Module;
pub use nodes::NodeId;
pub use optimizer::{Adam, AdamState, Optimizer, SGD};
pub use var::{Init, Var};
pub use var_ops::{VarActivationOps, VarConvOps, VarMatrixOps, VarShapeOps};

#[cfg(test)]
mod tests;
