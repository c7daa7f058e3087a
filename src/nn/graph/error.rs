/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : Graph 模块的错误类型
 */

use thiserror::Error;

/// Graph 操作错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("非法操作：{0}")]
    InvalidOperation(String),
    #[error("形状不匹配：期望{expected:?}，实际{got:?}（{message}）")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("维数不匹配：期望{expected}维，实际{got}维（{message}）")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        message: String,
    },
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("名称重复：{0}")]
    DuplicateName(String),
    #[error("参与运算的变量不属于同一张计算图")]
    GraphMismatch,
}
