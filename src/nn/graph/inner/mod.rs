/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : GraphInner 计算图的共享状态
 *
 * 节点本身由 Var 以 Rc 持有，这里只保存图级别的状态：
 * - 节点编号分配
 * - train/eval 模式与是否记录计算图（mode.rs）
 * - 图级别的随机数生成器
 */

mod mode;

use crate::nn::NodeId;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 图的共享状态。用户通常通过 `Graph` 句柄使用此结构。
pub struct GraphInner {
    pub(in crate::nn::graph) name: String,
    pub(in crate::nn::graph) next_id: u64,
    pub(in crate::nn::graph) is_eval_mode: bool,
    /// 为 false 时新建的运算结果不记录父节点（相当于常量）
    pub(in crate::nn::graph) grad_enabled: bool,
    /// 图级别的随机数生成器（用于参数初始化等）
    pub(in crate::nn::graph) rng: StdRng,
}

impl GraphInner {
    pub fn new() -> Self {
        Self::with_rng("default_graph", StdRng::from_entropy())
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng("default_graph", StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: &str, rng: StdRng) -> Self {
        Self {
            name: name.to_string(),
            next_id: 0,
            is_eval_mode: false,
            grad_enabled: true,
            rng,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn next_node_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}
