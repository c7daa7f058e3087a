/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : Var 的运算扩展 trait：激活、矩阵、形状、卷积
 */

mod activation;
mod conv;
mod matrix;
mod shape;

pub use activation::VarActivationOps;
pub use conv::VarConvOps;
pub use matrix::VarMatrixOps;
pub use shape::VarShapeOps;
