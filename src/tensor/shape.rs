/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 张量的形状变换：重塑、维度置换、广播与其逆运算（按目标形状求和）、堆叠
 */

use super::Tensor;
use super::property::broadcast_shape;
use crate::errors::TensorError;
use ndarray::{Axis, IxDyn};

impl Tensor {
    /// 元素总数不变地改变形状
    pub fn reshape(&self, shape: &[usize]) -> Tensor {
        assert!(
            self.size() == shape.iter().product::<usize>(),
            "{}",
            TensorError::IncompatibleShape
        );
        let data = self.data.clone().into_shape(IxDyn(shape)).unwrap();
        Tensor::from_array(data)
    }

    /// 按`axes`重新排列维度，`axes`须为[0, 维数)的一个排列
    pub fn permute(&self, axes: &[usize]) -> Tensor {
        let mut seen = vec![false; self.dimension()];
        let valid = axes.len() == self.dimension()
            && axes.iter().all(|&a| a < seen.len() && !std::mem::replace(&mut seen[a], true));
        assert!(valid, "{}", TensorError::PermuteNeedUniqueAndInRange);
        Tensor::from_array(self.data.clone().permuted_axes(IxDyn(axes)))
    }

    /// 2阶张量的转置
    pub fn transpose(&self) -> Tensor {
        assert!(self.dimension() == 2, "转置仅适用于2阶张量");
        self.permute(&[1, 0])
    }

    /// 按 NumPy 规则广播到`shape`
    pub fn broadcast_to(&self, shape: &[usize]) -> Tensor {
        let Some(view) = self.data.broadcast(shape) else {
            panic!("{}", TensorError::IncompatibleShape);
        };
        Tensor::from_array(view.to_owned())
    }

    /// `broadcast_to`的逆运算：把被广播出来的维度求和，得到形状为`shape`的张量
    pub fn sum_to(&self, shape: &[usize]) -> Tensor {
        if self.shape() == shape {
            return self.clone();
        }
        assert!(
            shape.len() <= self.dimension()
                && broadcast_shape(shape, self.shape()).as_deref() == Some(self.shape()),
            "{}",
            TensorError::IncompatibleShape
        );
        let lead = self.dimension() - shape.len();
        let mut data = self.data.clone();
        for axis in (lead..self.dimension()).rev() {
            if shape[axis - lead] == 1 && data.shape()[axis] != 1 {
                data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
            }
        }
        for _ in 0..lead {
            data = data.sum_axis(Axis(0));
        }
        Tensor::from_array(data)
    }

    /// 把若干同形状张量沿新的第0维堆叠
    pub fn stack(tensors: &[Tensor]) -> Result<Tensor, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        if tensors.iter().any(|t| !t.is_same_shape(first)) {
            return Err(TensorError::InconsistentShape);
        }
        let views = tensors
            .iter()
            .map(|t| t.data.view())
            .collect::<Vec<_>>();
        let data = ndarray::stack(Axis(0), &views).map_err(|_| TensorError::InconsistentShape)?;
        Ok(Tensor::from_array(data))
    }

    /// 取第0维上的第`index`个切片
    pub fn index_axis0(&self, index: usize) -> Tensor {
        Tensor::from_array(self.data.index_axis(Axis(0), index).to_owned())
    }
}
