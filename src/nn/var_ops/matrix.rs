/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 矩阵运算
 */

use crate::nn::nodes::Op;
use crate::nn::var::Var;
use crate::nn::{GraphError, VarShapeOps};

pub trait VarMatrixOps {
    /// 2阶矩阵乘法
    fn matmul(&self, other: &Var) -> Result<Var, GraphError>;
    /// 2阶转置
    fn transpose(&self) -> Result<Var, GraphError>;
}

impl VarMatrixOps for Var {
    fn matmul(&self, other: &Var) -> Result<Var, GraphError> {
        self.ensure_same_graph(other)?;
        let (a, b) = (self.shape(), other.shape());
        if a.len() != 2 || b.len() != 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: if a.len() != 2 { a.len() } else { b.len() },
                message: "矩阵乘法的两个操作数都必须是2阶".to_string(),
            });
        }
        if a[1] != b[0] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![a[1], b[1]],
                got: b,
                message: format!("左矩阵形状为{a:?}，其列数须等于右矩阵行数"),
            });
        }
        let value = self.value_ref().mat_mul(&other.value_ref());
        Ok(self.from_op(Op::MatMul(self.clone(), other.clone()), value))
    }

    fn transpose(&self) -> Result<Var, GraphError> {
        let ndim = self.shape().len();
        if ndim != 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: ndim,
                message: "转置仅适用于2阶张量".to_string(),
            });
        }
        self.permute(&[1, 0])
    }
}
