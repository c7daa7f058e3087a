/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 形状相关运算：重塑、置换、广播与按形状求和、归约、最近邻上采样
 */

use crate::nn::GraphError;
use crate::nn::nodes::Op;
use crate::nn::var::Var;
use crate::tensor::broadcast_shape;

pub trait VarShapeOps {
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError>;
    fn permute(&self, axes: &[usize]) -> Result<Var, GraphError>;
    /// 保留第0维，其余各维展平：[B, ...] → [B, N]
    fn flatten(&self) -> Result<Var, GraphError>;
    fn broadcast_to(&self, shape: &[usize]) -> Result<Var, GraphError>;
    /// `broadcast_to`的逆运算
    fn sum_to(&self, shape: &[usize]) -> Result<Var, GraphError>;
    /// 全部元素求和，得到0阶标量
    fn sum(&self) -> Var;
    fn mean(&self) -> Var;
    fn sum_axes_keepdims(&self, axes: &[usize]) -> Result<Var, GraphError>;
    fn mean_axes_keepdims(&self, axes: &[usize]) -> Result<Var, GraphError>;
    /// [B, C, H, W]在空间维上按最近邻放大`factor`倍
    fn upsample_nearest2d(&self, factor: usize) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError> {
        let current = self.shape();
        if current == shape {
            return Ok(self.clone());
        }
        if current.iter().product::<usize>() != shape.iter().product::<usize>() {
            return Err(GraphError::ShapeMismatch {
                expected: shape.to_vec(),
                got: current,
                message: "reshape前后元素总数须一致".to_string(),
            });
        }
        let value = self.value_ref().reshape(shape);
        Ok(self.from_op(Op::Reshape(self.clone()), value))
    }

    fn permute(&self, axes: &[usize]) -> Result<Var, GraphError> {
        let ndim = self.shape().len();
        let mut sorted = axes.to_vec();
        sorted.sort_unstable();
        if sorted != (0..ndim).collect::<Vec<_>>() {
            return Err(GraphError::InvalidOperation(format!(
                "{axes:?}不是[0, {ndim})的一个排列"
            )));
        }
        let value = self.value_ref().permute(axes);
        Ok(self.from_op(Op::Permute(self.clone(), axes.to_vec()), value))
    }

    fn flatten(&self) -> Result<Var, GraphError> {
        let shape = self.shape();
        if shape.is_empty() {
            return Err(GraphError::DimensionMismatch {
                expected: 1,
                got: 0,
                message: "flatten需要至少1阶的张量".to_string(),
            });
        }
        self.reshape(&[shape[0], shape[1..].iter().product()])
    }

    fn broadcast_to(&self, shape: &[usize]) -> Result<Var, GraphError> {
        let current = self.shape();
        if current == shape {
            return Ok(self.clone());
        }
        if broadcast_shape(&current, shape).as_deref() != Some(shape) {
            return Err(GraphError::ShapeMismatch {
                expected: shape.to_vec(),
                got: current,
                message: "无法广播到目标形状".to_string(),
            });
        }
        let value = self.value_ref().broadcast_to(shape);
        Ok(self.from_op(Op::BroadcastTo(self.clone()), value))
    }

    fn sum_to(&self, shape: &[usize]) -> Result<Var, GraphError> {
        let current = self.shape();
        if current == shape {
            return Ok(self.clone());
        }
        if shape.len() > current.len()
            || broadcast_shape(shape, &current).as_deref() != Some(current.as_slice())
        {
            return Err(GraphError::ShapeMismatch {
                expected: shape.to_vec(),
                got: current,
                message: "目标形状须能广播回当前形状".to_string(),
            });
        }
        let value = self.value_ref().sum_to(shape);
        Ok(self.from_op(Op::SumTo(self.clone()), value))
    }

    fn sum(&self) -> Var {
        let value = self.value_ref().sum_to(&[]);
        self.from_op(Op::SumTo(self.clone()), value)
    }

    fn mean(&self) -> Var {
        let count = self.shape().iter().product::<usize>().max(1);
        self.sum().scale(1.0 / count as f32)
    }

    fn sum_axes_keepdims(&self, axes: &[usize]) -> Result<Var, GraphError> {
        let mut target = self.shape();
        for &axis in axes {
            let Some(len) = target.get_mut(axis) else {
                return Err(GraphError::InvalidOperation(format!(
                    "维度{axis}超出范围，张量只有{}维",
                    self.shape().len()
                )));
            };
            *len = 1;
        }
        self.sum_to(&target)
    }

    fn mean_axes_keepdims(&self, axes: &[usize]) -> Result<Var, GraphError> {
        let shape = self.shape();
        let summed = self.sum_axes_keepdims(axes)?;
        let count = axes.iter().map(|&a| shape[a]).product::<usize>().max(1);
        Ok(summed.scale(1.0 / count as f32))
    }

    fn upsample_nearest2d(&self, factor: usize) -> Result<Var, GraphError> {
        let shape = self.shape();
        let [b, c, h, w] = shape[..] else {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: shape.len(),
                message: "最近邻上采样需要[B, C, H, W]输入".to_string(),
            });
        };
        self.reshape(&[b, c, h, 1, w, 1])?
            .broadcast_to(&[b, c, h, factor, w, factor])?
            .reshape(&[b, c, h * factor, w * factor])
    }
}
