/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 计算图节点。节点在前向时即刻求值（eager），并通过 Rc 持有父节点，
 *                 因而图的生命周期由最后一个引用它的 Var 决定，无需全局节点表。
 */

use crate::nn::var::Var;
use crate::tensor::{ConvGeometry, Tensor};
use std::cell::RefCell;
use std::fmt;

/// 节点在所属图内的唯一编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 节点的运算类型及其父节点
///
/// 每种运算的反向传播都只用本枚举内的运算表达，所以梯度本身还能再求导。
#[derive(Clone)]
pub(crate) enum Op {
    /// 输入（含常量、被 detach 的结果）
    Input,
    /// 可训练参数
    Parameter,
    Add(Var, Var),
    Sub(Var, Var),
    Mul(Var, Var),
    Div(Var, Var),
    Neg(Var),
    Scale(Var, f32),
    AddScalar(Var, f32),
    Exp(Var),
    Ln(Var),
    Sqrt(Var),
    Tanh(Var),
    Sigmoid(Var),
    Softplus(Var),
    /// 分段线性激活：正半轴斜率1，负半轴斜率为`f32`（ReLU 为0）
    PiecewiseLinear(Var, f32),
    MatMul(Var, Var),
    Reshape(Var),
    Permute(Var, Vec<usize>),
    BroadcastTo(Var),
    SumTo(Var),
    Im2Col(Var, ConvGeometry),
    Col2Im(Var, ConvGeometry),
}

impl Op {
    pub(crate) fn parents(&self) -> Vec<&Var> {
        match self {
            Op::Input | Op::Parameter => vec![],
            Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) | Op::Div(a, b) | Op::MatMul(a, b) => {
                vec![a, b]
            }
            Op::Neg(a)
            | Op::Scale(a, _)
            | Op::AddScalar(a, _)
            | Op::Exp(a)
            | Op::Ln(a)
            | Op::Sqrt(a)
            | Op::Tanh(a)
            | Op::Sigmoid(a)
            | Op::Softplus(a)
            | Op::PiecewiseLinear(a, _)
            | Op::Reshape(a)
            | Op::Permute(a, _)
            | Op::BroadcastTo(a)
            | Op::SumTo(a)
            | Op::Im2Col(a, _)
            | Op::Col2Im(a, _) => vec![a],
        }
    }

    pub(crate) const fn type_name(&self) -> &'static str {
        match self {
            Op::Input => "Input",
            Op::Parameter => "Parameter",
            Op::Add(..) => "Add",
            Op::Sub(..) => "Sub",
            Op::Mul(..) => "Mul",
            Op::Div(..) => "Div",
            Op::Neg(..) => "Neg",
            Op::Scale(..) => "Scale",
            Op::AddScalar(..) => "AddScalar",
            Op::Exp(..) => "Exp",
            Op::Ln(..) => "Ln",
            Op::Sqrt(..) => "Sqrt",
            Op::Tanh(..) => "Tanh",
            Op::Sigmoid(..) => "Sigmoid",
            Op::Softplus(..) => "Softplus",
            Op::PiecewiseLinear(..) => "PiecewiseLinear",
            Op::MatMul(..) => "MatMul",
            Op::Reshape(..) => "Reshape",
            Op::Permute(..) => "Permute",
            Op::BroadcastTo(..) => "BroadcastTo",
            Op::SumTo(..) => "SumTo",
            Op::Im2Col(..) => "Im2Col",
            Op::Col2Im(..) => "Col2Im",
        }
    }
}

pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) op: Op,
    pub(crate) value: RefCell<Tensor>,
    /// 仅叶子节点会累积梯度（由`Var::backward`写入）
    pub(crate) grad: RefCell<Option<Tensor>>,
    pub(crate) requires_grad: bool,
}
