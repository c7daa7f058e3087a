/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 计算图：句柄、共享状态、错误类型与反向传播
 */

mod backward;
mod error;
mod handle;
mod inner;

pub use error::GraphError;
pub use handle::Graph;
pub use inner::GraphInner;
