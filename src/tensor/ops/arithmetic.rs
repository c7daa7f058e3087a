use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use crate::tensor::property::broadcast_shape;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 为某个二元运算符生成“张量 op 张量”“张量 op f32”“f32 op 张量”的全部（不）带引用组合
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:tt, $operator:expr) => {
        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 op（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait for Tensor {
            type Output = Tensor;
            fn $method(self, other: Tensor) -> Tensor {
                within_tensors(&self, &other, $operator, |a, b| a $op b)
            }
        }
        impl<'a> $trait<&'a Tensor> for Tensor {
            type Output = Tensor;
            fn $method(self, other: &'a Tensor) -> Tensor {
                within_tensors(&self, other, $operator, |a, b| a $op b)
            }
        }
        impl $trait<Tensor> for &Tensor {
            type Output = Tensor;
            fn $method(self, other: Tensor) -> Tensor {
                within_tensors(self, &other, $operator, |a, b| a $op b)
            }
        }
        impl<'b> $trait<&'b Tensor> for &Tensor {
            type Output = Tensor;
            fn $method(self, other: &'b Tensor) -> Tensor {
                within_tensors(self, other, $operator, |a, b| a $op b)
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 op（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 op f32↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<f32> for Tensor {
            type Output = Tensor;
            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(self.data.mapv(|a| a $op scalar))
            }
        }
        impl $trait<f32> for &Tensor {
            type Output = Tensor;
            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(self.data.mapv(|a| a $op scalar))
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 op f32↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

        /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓f32 op（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
        impl $trait<Tensor> for f32 {
            type Output = Tensor;
            fn $method(self, tensor: Tensor) -> Tensor {
                Tensor::from_array(tensor.data.mapv(|a| self $op a))
            }
        }
        impl<'a> $trait<&'a Tensor> for f32 {
            type Output = Tensor;
            fn $method(self, tensor: &'a Tensor) -> Tensor {
                Tensor::from_array(tensor.data.mapv(|a| self $op a))
            }
        }
        /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑f32 op（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
    };
}

impl_binary_op!(Add, add, +, Operator::Add);
impl_binary_op!(Sub, sub, -, Operator::Sub);
impl_binary_op!(Mul, mul, *, Operator::Mul);
impl_binary_op!(Div, div, /, Operator::Div);

impl Neg for Tensor {
    type Output = Tensor;
    fn neg(self) -> Tensor {
        Tensor::from_array(-self.data)
    }
}
impl Neg for &Tensor {
    type Output = Tensor;
    fn neg(self) -> Tensor {
        Tensor::from_array(self.data.mapv(|a| -a))
    }
}

/// 两个张量逐元素运算，支持 NumPy 风格广播
///
/// # Panics
/// 如果形状不兼容（无法广播）
fn within_tensors(
    tensor_1: &Tensor,
    tensor_2: &Tensor,
    operator: Operator,
    f: impl Fn(f32, f32) -> f32,
) -> Tensor {
    let Some(shape) = broadcast_shape(tensor_1.shape(), tensor_2.shape()) else {
        panic!(
            "{}",
            TensorError::OperatorError {
                operator,
                tensor1_shape: tensor_1.shape().to_vec(),
                tensor2_shape: tensor_2.shape().to_vec(),
            }
        );
    };
    let a = tensor_1.data.broadcast(shape.as_slice()).unwrap();
    let b = tensor_2.data.broadcast(shape.as_slice()).unwrap();
    let mut out = a.to_owned();
    out.zip_mut_with(&b, |x, &y| *x = f(*x, y));
    Tensor::from_array(out)
}
