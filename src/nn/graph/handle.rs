/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : Graph 句柄（用户级 API）
 */

use super::backward;
use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::nodes::Op;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Graph - 计算图句柄（PyTorch 风格用户 API）
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    // ==================== 创建 ====================

    /// 创建新图（参数初始化使用随机种子）
    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建带种子的图（用于确定性训练）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::from_inner(GraphInner::new_with_seed(seed))
    }

    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    /// 获取内部 GraphInner 的不可变引用
    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// 两个句柄是否指向同一张图
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ==================== 创建变量 ====================

    /// 创建输入节点（不需要梯度）
    pub fn input(&self, data: &Tensor) -> Var {
        Var::new_node(&self.inner, Op::Input, data.clone(), false, None)
    }

    /// 创建命名输入节点
    pub fn input_named(&self, data: &Tensor, name: &str) -> Var {
        Var::new_node(
            &self.inner,
            Op::Input,
            data.clone(),
            false,
            Some(name.to_string()),
        )
    }

    /// 创建需要梯度的输入节点，可作为`grad`的求导对象
    pub fn input_with_grad(&self, data: &Tensor) -> Var {
        Var::new_node(&self.inner, Op::Input, data.clone(), true, None)
    }

    /// 创建参数节点，初始值由图级别 RNG 按`init`生成
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        if shape.contains(&0) {
            return Err(GraphError::InvalidOperation(format!(
                "参数{name}的形状{shape:?}含有长度为0的维度"
            )));
        }
        let init_data = init.generate_with_rng(shape, self.inner.borrow_mut().rng_mut());
        Ok(Var::new_node(
            &self.inner,
            Op::Parameter,
            init_data,
            true,
            Some(name.to_string()),
        ))
    }

    /// 创建常量
    pub fn constant(&self, data: &Tensor) -> Var {
        self.input(data)
    }

    pub fn zeros(&self, shape: &[usize]) -> Var {
        self.input(&Tensor::zeros(shape))
    }

    pub fn ones(&self, shape: &[usize]) -> Var {
        self.input(&Tensor::ones(shape))
    }

    // ==================== 模式 ====================

    pub fn train(&self) {
        self.inner.borrow_mut().set_train_mode();
    }

    pub fn eval(&self) {
        self.inner.borrow_mut().set_eval_mode();
    }

    pub fn is_train(&self) -> bool {
        self.inner.borrow().is_train_mode()
    }

    pub fn is_grad_enabled(&self) -> bool {
        self.inner.borrow().is_grad_enabled()
    }

    /// 推理上下文：切到 eval 模式并停止记录计算图，结束后恢复原状态
    pub fn no_grad_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let was_train = self.is_train();
        self.eval();
        let result = self.without_grad(f);
        if was_train {
            self.train();
        }
        result
    }

    /// 停止记录计算图（不改变 train/eval 模式），结束后恢复原状态
    pub fn without_grad<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        self.with_grad_enabled(false, f)
    }

    pub(crate) fn with_grad_enabled<F, R>(&self, enabled: bool, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let previous = self.is_grad_enabled();
        self.inner.borrow_mut().set_grad_enabled(enabled);
        let result = f(self);
        self.inner.borrow_mut().set_grad_enabled(previous);
        result
    }

    /// 借用图级别 RNG。闭包内不得再创建变量
    pub fn with_rng<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut StdRng) -> R,
    {
        f(self.inner.borrow_mut().rng_mut())
    }

    // ==================== 求导 ====================

    /// 求`outputs`（各元素之和）对`inputs`的梯度，不写入任何节点的 grad
    ///
    /// `create_graph`为 true 时，返回的梯度本身带有计算图，可以继续参与运算并再次反向传播；
    /// 某个输入与输出无关时，其梯度为全零常量。
    pub fn grad(
        &self,
        outputs: &[Var],
        inputs: &[Var],
        create_graph: bool,
    ) -> Result<Vec<Var>, GraphError> {
        for var in outputs.iter().chain(inputs) {
            if !Rc::ptr_eq(var.graph(), &self.inner) {
                return Err(GraphError::GraphMismatch);
            }
        }
        backward::grad(self, outputs, inputs, create_graph)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
