/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;
use ndarray::{ArrayD, ArrayViewD};

impl Tensor {
    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// 交出内部的 ndarray 数组（标准布局）
    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }

    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数，即`shape()`的元素个数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 仅含一个元素即视为标量，形状可以是[]、[1]、[1,1]...
    pub fn is_scalar(&self) -> bool {
        self.size() == 1
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 按行优先顺序取得底层数据
    ///
    /// # Panics
    /// 张量总保持标准布局，故正常情况下不会panic
    pub fn data_as_slice(&self) -> &[f32] {
        self.data.as_slice().expect("张量须为标准内存布局")
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// 所有元素是否均为有限值（非NaN、非无穷）
    pub fn is_all_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |acc, x| acc.max(x.abs()))
    }

    /// 两张量能否按 NumPy 规则广播
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        broadcast_shape(self.shape(), other.shape()).is_some()
    }
}

/// 按 NumPy 规则求两个形状广播后的形状：从右向左对齐，每维须相等或其一为1
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0; ndim];
    for i in 0..ndim {
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(out)
}
