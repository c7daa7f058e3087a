/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 张量层面的错误
 *
 * 张量运算的形状错误属于调用方的编程错误，多以本模块错误的消息 panic；
 * `stack`等可由数据决定成败的操作则返回`Result<_, TensorError>`。
 */

use std::fmt::{self, Display};
use thiserror::Error;

/// 张量的二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Mul,
    MulAssign,
    Div,
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "相加",
            Self::AddAssign => "自相加",
            Self::Sub => "相减",
            Self::SubAssign => "自相减",
            Self::Mul => "相乘",
            Self::MulAssign => "自相乘",
            Self::Div => "相除",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("前一个张量的列数必须等于后一个张量的行数：{lhs:?} × {rhs:?}")]
    MatMulShape { lhs: Vec<usize>, rhs: Vec<usize> },

    /// im2col/col2im 的输入与卷积几何不符，或卷积核大于填充后的图像
    #[error("卷积输入形状{got:?}与期望的{expected:?}不符")]
    ConvShape { expected: Vec<usize>, got: Vec<usize> },

    #[error("张量列表为空")]
    EmptyList,
    #[error("张量形状不一致")]
    InconsistentShape,
    #[error("张量形状不兼容")]
    IncompatibleShape,
    #[error("需要交换的维度必须是唯一且在[0, <张量维数>)范围内")]
    PermuteNeedUniqueAndInRange,
}
