/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : GraphInner train/eval 模式与计算图记录开关
 */

use super::GraphInner;

impl GraphInner {
    pub const fn set_train_mode(&mut self) {
        self.is_eval_mode = false;
    }

    pub const fn set_eval_mode(&mut self) {
        self.is_eval_mode = true;
    }

    pub const fn is_train_mode(&self) -> bool {
        !self.is_eval_mode
    }

    pub const fn is_grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    pub(crate) const fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }
}
