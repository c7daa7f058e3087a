/*
 * @Author       : 老董
 * @Date         : 2026-03-07
 * @Description  : 优化器模块，实现 PyTorch 风格的梯度优化算法
 */

mod adam;
mod sgd;

pub use adam::{Adam, AdamState};
pub use sgd::SGD;

use crate::nn::{GraphError, Var};

/// Optimizer trait（PyTorch 风格）
///
/// # 设计要点
/// - Optimizer 绑定特定参数（通过带名字的 Var）
/// - `backward()` 计算所有参数的梯度（由 Var 调用）
/// - `step()` 只更新 Optimizer 绑定的参数，没有梯度的参数被跳过
///
/// # 使用示例
/// ```ignore
/// let mut optimizer = Adam::new(model.named_parameters(), 2e-4, 0.5, 0.999);
///
/// optimizer.zero_grad();
/// let loss = model.forward(&x)?.softplus().mean();
/// loss.backward()?;
/// optimizer.step()?;
///
/// // 或者一步完成
/// let loss_val = optimizer.minimize(&loss)?;
/// ```
pub trait Optimizer {
    /// 清零所有参数的梯度
    fn zero_grad(&mut self);

    /// 更新参数（只更新 Optimizer 绑定的参数）
    fn step(&mut self) -> Result<(), GraphError>;

    /// 一步完成：zero_grad + backward + step，返回 loss 的标量值
    fn minimize(&mut self, loss: &Var) -> Result<f32, GraphError> {
        self.zero_grad();
        let loss_val = loss.backward()?;
        self.step()?;
        Ok(loss_val)
    }

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, lr: f32);

    /// 重置累积状态（如 Adam 的动量）
    fn reset(&mut self);
}

pub(crate) fn ensure_unique_names(params: &[(String, Var)]) -> Result<(), GraphError> {
    let mut seen = std::collections::HashSet::new();
    for (name, _) in params {
        if !seen.insert(name.as_str()) {
            return Err(GraphError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}
