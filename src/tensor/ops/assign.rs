use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{AddAssign, MulAssign, SubAssign};

/// 复合赋值：右侧张量须能广播到左侧张量的形状（左侧形状不变）
fn assign_within_tensors(
    target: &mut Tensor,
    other: &Tensor,
    operator: Operator,
    f: impl Fn(&mut f32, f32),
) {
    let Some(view) = other.data.broadcast(target.data.raw_dim()) else {
        panic!(
            "{}",
            TensorError::OperatorError {
                operator,
                tensor1_shape: target.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
    };
    target.data.zip_mut_with(&view, |x, &y| f(x, y));
}

impl<'a> AddAssign<&'a Tensor> for Tensor {
    fn add_assign(&mut self, other: &'a Tensor) {
        assign_within_tensors(self, other, Operator::AddAssign, |x, y| *x += y);
    }
}
impl AddAssign<Tensor> for Tensor {
    fn add_assign(&mut self, other: Tensor) {
        *self += &other;
    }
}
impl AddAssign<f32> for Tensor {
    fn add_assign(&mut self, scalar: f32) {
        self.data.mapv_inplace(|x| x + scalar);
    }
}

impl<'a> SubAssign<&'a Tensor> for Tensor {
    fn sub_assign(&mut self, other: &'a Tensor) {
        assign_within_tensors(self, other, Operator::SubAssign, |x, y| *x -= y);
    }
}
impl SubAssign<Tensor> for Tensor {
    fn sub_assign(&mut self, other: Tensor) {
        *self -= &other;
    }
}

impl<'a> MulAssign<&'a Tensor> for Tensor {
    fn mul_assign(&mut self, other: &'a Tensor) {
        assign_within_tensors(self, other, Operator::MulAssign, |x, y| *x *= y);
    }
}
impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        self.data.mapv_inplace(|x| x * scalar);
    }
}
