/*
 * @Author       : 老董
 * @Date         : 2026-03-07
 * @Description  : Module trait 定义
 */

use super::Var;
use super::layer::RunningStats;

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - 参数与运行统计量都带名字，名字在同一模块内唯一且顺序固定，
///   参数同步、快照与优化器状态都按名字对齐
///
/// # 使用示例
///
/// ```ignore
/// struct Critic {
///     fc1: Linear,
///     fc2: Linear,
/// }
///
/// impl Module for Critic {
///     fn named_parameters(&self) -> Vec<(String, Var)> {
///         [self.fc1.named_parameters(), self.fc2.named_parameters()].concat()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数（名字, 参数）
    fn named_parameters(&self) -> Vec<(String, Var)>;

    /// 获取所有归一化层的运行统计量（层名, 统计量）
    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        Vec::new()
    }

    /// 获取所有可训练参数
    fn parameters(&self) -> Vec<Var> {
        self.named_parameters().into_iter().map(|(_, p)| p).collect()
    }

    /// 获取参数张量的个数
    fn num_params(&self) -> usize {
        self.named_parameters().len()
    }
}
