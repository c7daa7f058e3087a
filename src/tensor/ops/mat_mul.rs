use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::Ix2;

impl Tensor {
    /// 实现矩阵乘法。两个张量都须为2阶，且前一个张量的列数等于后一个张量的行数，否则会触发panic。
    pub fn mat_mul(&self, other: &Tensor) -> Tensor {
        let (Ok(lhs), Ok(rhs)) = (
            self.data.view().into_dimensionality::<Ix2>(),
            other.data.view().into_dimensionality::<Ix2>(),
        ) else {
            panic!("输入的张量维度必须为2：{:?} × {:?}", self.shape(), other.shape());
        };
        if lhs.ncols() != rhs.nrows() {
            panic!(
                "{}",
                TensorError::MatMulShape {
                    lhs: self.shape().to_vec(),
                    rhs: other.shape().to_vec(),
                }
            );
        }
        Tensor::from_array(lhs.dot(&rhs).into_dyn())
    }
}
