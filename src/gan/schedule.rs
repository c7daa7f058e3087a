/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 学习率的阶梯式退火
 */

use serde::{Deserialize, Serialize};

/// 第`it`次迭代满足`rate > 0`、`it >= trigger`且`it % interval == 0`时，
/// 学习率设为`base · rate^⌊(it − trigger) / interval⌋`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealSchedule {
    pub base: f32,
    pub rate: f32,
    pub trigger: u64,
    pub interval: u64,
}

impl AnnealSchedule {
    /// 该次迭代需要设置的学习率；不需要调整时为 None
    pub fn learning_rate_at(&self, iteration: u64) -> Option<f32> {
        if self.rate <= 0.0 || self.interval == 0 || iteration < self.trigger {
            return None;
        }
        if iteration % self.interval != 0 {
            return None;
        }
        let steps = (iteration - self.trigger) / self.interval;
        Some(self.base * self.rate.powi(i32::try_from(steps).unwrap_or(i32::MAX)))
    }
}
