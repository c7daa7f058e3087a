/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : Smart Var - 智能变量句柄，支持算子重载和链式调用
 *
 * Var 持有节点的 Rc 以及所属图的 Rc：节点在创建时即完成前向计算，
 * 父节点由子节点持有，因而任何仍被引用的结果都可以随时反向传播（包括对梯度再求梯度）。
 */

use super::graph::{Graph, GraphInner};
use super::nodes::{Node, Op};
use super::{GraphError, NodeId};
use crate::tensor::{Tensor, broadcast_shape};
use rand::Rng;
use std::cell::{Ref, RefCell};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 全一
    Ones,
    /// 正态分布（使用 Graph 的 RNG）
    Normal { mean: f32, std: f32 },
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
        }
    }
}

// ==================== Var 结构 ====================

/// 智能变量句柄 - 携带图引用，支持算子重载和链式调用
///
/// # 设计原则
/// - 持有节点与图的 `Rc`，Clone 开销极低
/// - 图处于“记录”状态且任一父节点需要梯度时，运算结果才记录父节点；否则结果即常量
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new();
/// let x = graph.input(&images);           // 返回 Var
/// let h = x.relu();                       // 链式调用
/// let y = h.matmul(&w)?;                  // 方法调用
/// let z = &y + &b;                        // 算子重载
/// let loss = z.softplus().mean();
/// loss.backward()?;                       // 直接在 Var 上调用
/// ```
#[derive(Clone)]
pub struct Var {
    node: Rc<Node>,
    graph: Rc<RefCell<GraphInner>>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.node.id)
            .field("op", &self.node.op.type_name())
            .field("shape", &self.shape())
            .finish()
    }
}

impl Var {
    /// 在图中新建一个节点（内部使用）
    pub(crate) fn new_node(
        graph: &Rc<RefCell<GraphInner>>,
        op: Op,
        value: Tensor,
        requires_grad: bool,
        name: Option<String>,
    ) -> Self {
        let id = graph.borrow_mut().next_node_id();
        let node = Node {
            id,
            name,
            op,
            value: RefCell::new(value),
            grad: RefCell::new(None),
            requires_grad,
        };
        Self {
            node: Rc::new(node),
            graph: Rc::clone(graph),
        }
    }

    /// 由运算得到新节点：图在记录且有父节点需要梯度时保留父节点，否则生成常量
    pub(crate) fn from_op(&self, op: Op, value: Tensor) -> Self {
        let record = self.graph.borrow().is_grad_enabled()
            && op.parents().iter().any(|p| p.requires_grad());
        if record {
            Self::new_node(&self.graph, op, value, true, None)
        } else {
            Self::new_node(&self.graph, Op::Input, value, false, None)
        }
    }

    /// 获取节点 ID
    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }

    pub(crate) fn op(&self) -> &Op {
        &self.node.op
    }

    pub(crate) const fn graph(&self) -> &Rc<RefCell<GraphInner>> {
        &self.graph
    }

    /// 检查两个 Var 是否来自同一个 Graph
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// 两个 Var 是否指向同一节点
    pub fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// 获取 Var 所属的 Graph handle
    pub fn get_graph(&self) -> Graph {
        Graph::from_rc(Rc::clone(&self.graph))
    }

    pub(crate) fn ensure_same_graph(&self, other: &Self) -> Result<(), GraphError> {
        if self.same_graph(other) {
            Ok(())
        } else {
            Err(GraphError::GraphMismatch)
        }
    }

    pub fn requires_grad(&self) -> bool {
        self.node.requires_grad
    }

    /// 叶子节点：输入、常量或参数
    pub fn is_leaf(&self) -> bool {
        matches!(self.node.op, Op::Input | Op::Parameter)
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.node.op, Op::Parameter)
    }

    // ==================== 梯度流控制 ====================

    /// 截断梯度流：返回值相同、不再连接任何父节点的新 Var
    pub fn detach(&self) -> Self {
        Self::new_node(&self.graph, Op::Input, self.value(), false, None)
    }

    // ==================== 值访问和设置 ====================

    pub fn shape(&self) -> Vec<usize> {
        self.node.value.borrow().shape().to_vec()
    }

    /// 获取节点的值（克隆的 Tensor）
    pub fn value(&self) -> Tensor {
        self.node.value.borrow().clone()
    }

    pub(crate) fn value_ref(&self) -> Ref<'_, Tensor> {
        self.node.value.borrow()
    }

    /// 覆写叶子节点的值，形状须保持不变
    pub fn set_value(&self, value: &Tensor) -> Result<(), GraphError> {
        if !self.is_leaf() {
            return Err(GraphError::InvalidOperation(format!(
                "只能为叶子节点设置值，节点{}是{}节点",
                self.node.id,
                self.node.op.type_name()
            )));
        }
        let current = self.shape();
        if current != value.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: current,
                got: value.shape().to_vec(),
                message: format!("为节点{}设置值", self.node.id),
            });
        }
        *self.node.value.borrow_mut() = value.clone();
        Ok(())
    }

    /// 取标量值
    pub fn item(&self) -> Result<f32, GraphError> {
        self.node.value.borrow().number().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "item()只适用于标量，当前形状为{:?}",
                self.shape()
            ))
        })
    }

    /// 获取已累积的梯度（仅叶子节点会有）
    pub fn grad(&self) -> Option<Tensor> {
        self.node.grad.borrow().clone()
    }

    pub fn clear_grad(&self) {
        *self.node.grad.borrow_mut() = None;
    }

    pub(crate) fn accumulate_grad(&self, grad: &Tensor) {
        let mut slot = self.node.grad.borrow_mut();
        match slot.as_mut() {
            Some(existing) => *existing += grad,
            None => *slot = Some(grad.clone()),
        }
    }

    // ==================== 二元运算 ====================

    fn binary(
        &self,
        other: &Self,
        op_name: &str,
        make_op: fn(Var, Var) -> Op,
        f: impl Fn(&Tensor, &Tensor) -> Tensor,
    ) -> Result<Self, GraphError> {
        self.ensure_same_graph(other)?;
        let (a_shape, b_shape) = (self.shape(), other.shape());
        if broadcast_shape(&a_shape, &b_shape).is_none() {
            return Err(GraphError::ShapeMismatch {
                expected: a_shape,
                got: b_shape,
                message: format!("{op_name}的两个操作数无法广播"),
            });
        }
        let value = f(&self.value_ref(), &other.value_ref());
        Ok(self.from_op(make_op(self.clone(), other.clone()), value))
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, GraphError> {
        self.binary(other, "加法", Op::Add, |a, b| a + b)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, GraphError> {
        self.binary(other, "减法", Op::Sub, |a, b| a - b)
    }

    pub fn try_mul(&self, other: &Self) -> Result<Self, GraphError> {
        self.binary(other, "乘法", Op::Mul, |a, b| a * b)
    }

    pub fn try_div(&self, other: &Self) -> Result<Self, GraphError> {
        self.binary(other, "除法", Op::Div, |a, b| a / b)
    }

    // ==================== 与纯数的运算 ====================

    /// 乘以纯数
    pub fn scale(&self, factor: f32) -> Self {
        let value = &*self.value_ref() * factor;
        self.from_op(Op::Scale(self.clone(), factor), value)
    }

    /// 加上纯数
    pub fn add_scalar(&self, scalar: f32) -> Self {
        let value = &*self.value_ref() + scalar;
        self.from_op(Op::AddScalar(self.clone(), scalar), value)
    }
}

// ==================== 算子重载 ====================

macro_rules! impl_var_binary_op {
    ($trait:ident, $method:ident, $try_method:ident, $msg:literal) => {
        impl $trait for &Var {
            type Output = Var;

            fn $method(self, other: &Var) -> Var {
                self.$try_method(other).expect($msg)
            }
        }

        impl $trait for Var {
            type Output = Var;

            fn $method(self, other: Var) -> Var {
                (&self).$method(&other)
            }
        }

        impl $trait<Var> for &Var {
            type Output = Var;

            fn $method(self, other: Var) -> Var {
                self.$method(&other)
            }
        }

        impl $trait<&Var> for Var {
            type Output = Var;

            fn $method(self, other: &Var) -> Var {
                (&self).$method(other)
            }
        }
    };
}

impl_var_binary_op!(Add, add, try_add, "Var 加法失败");
impl_var_binary_op!(Sub, sub, try_sub, "Var 减法失败");
impl_var_binary_op!(Mul, mul, try_mul, "Var 乘法失败");
impl_var_binary_op!(Div, div, try_div, "Var 除法失败");

impl Mul<f32> for &Var {
    type Output = Var;

    fn mul(self, factor: f32) -> Var {
        self.scale(factor)
    }
}

impl Neg for &Var {
    type Output = Var;

    fn neg(self) -> Var {
        let value = -&*self.value_ref();
        self.from_op(Op::Neg(self.clone()), value)
    }
}

impl Neg for Var {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}
