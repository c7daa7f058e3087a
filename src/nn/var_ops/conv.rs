/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 卷积相关运算。卷积 = im2col + 矩阵乘法；转置卷积 = 矩阵乘法 + col2im
 */

use crate::nn::nodes::Op;
use crate::nn::var::Var;
use crate::nn::{GraphError, VarMatrixOps, VarShapeOps};
use crate::tensor::ConvGeometry;

pub trait VarConvOps {
    fn im2col(&self, geometry: &ConvGeometry) -> Result<Var, GraphError>;
    fn col2im(&self, geometry: &ConvGeometry) -> Result<Var, GraphError>;
    /// 二维卷积：输入[B, C, H, W]，卷积核[O, C, kh, kw]，输出[B, O, oh, ow]
    fn conv2d(&self, kernel: &Var, stride: usize, padding: usize) -> Result<Var, GraphError>;
    /// 二维转置卷积：输入[B, Cin, H, W]，卷积核[Cin, Cout, kh, kw]，
    /// 输出[B, Cout, (H-1)*stride - 2*padding + kh, ...]
    fn conv_transpose2d(
        &self,
        kernel: &Var,
        stride: usize,
        padding: usize,
    ) -> Result<Var, GraphError>;
}

fn four_dims(shape: &[usize], what: &str) -> Result<[usize; 4], GraphError> {
    match shape {
        &[a, b, c, d] => Ok([a, b, c, d]),
        _ => Err(GraphError::DimensionMismatch {
            expected: 4,
            got: shape.len(),
            message: format!("{what}须为4阶张量"),
        }),
    }
}

impl VarConvOps for Var {
    fn im2col(&self, geometry: &ConvGeometry) -> Result<Var, GraphError> {
        let [batch, ..] = four_dims(&self.shape(), "im2col的输入")?;
        let expected = geometry.image_shape(batch);
        if self.shape() != expected || geometry.cols_shape(batch).is_none() {
            return Err(GraphError::ShapeMismatch {
                expected: expected.to_vec(),
                got: self.shape(),
                message: format!("im2col输入与卷积几何{geometry:?}不符"),
            });
        }
        let value = self.value_ref().im2col(geometry);
        Ok(self.from_op(Op::Im2Col(self.clone(), *geometry), value))
    }

    fn col2im(&self, geometry: &ConvGeometry) -> Result<Var, GraphError> {
        let shape = self.shape();
        let expected = shape
            .first()
            .and_then(|&batch| geometry.cols_shape(batch))
            .map(|s| s.to_vec());
        if expected.as_deref() != Some(shape.as_slice()) {
            return Err(GraphError::ShapeMismatch {
                expected: expected.unwrap_or_default(),
                got: shape,
                message: format!("col2im输入与卷积几何{geometry:?}不符"),
            });
        }
        let value = self.value_ref().col2im(geometry);
        Ok(self.from_op(Op::Col2Im(self.clone(), *geometry), value))
    }

    fn conv2d(&self, kernel: &Var, stride: usize, padding: usize) -> Result<Var, GraphError> {
        let [batch, channels, h, w] = four_dims(&self.shape(), "卷积输入")?;
        let [out_channels, in_channels, kh, kw] = four_dims(&kernel.shape(), "卷积核")?;
        if in_channels != channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![out_channels, channels, kh, kw],
                got: kernel.shape(),
                message: "卷积核的输入通道数与输入不符".to_string(),
            });
        }
        let geometry = ConvGeometry::new(
            channels,
            (h, w),
            (kh, kw),
            (stride, stride),
            (padding, padding),
        );
        let Some((oh, ow)) = geometry.output_hw() else {
            return Err(GraphError::InvalidOperation(format!(
                "卷积核{kh}x{kw}（步长{stride}、填充{padding}）不适用于{h}x{w}的输入"
            )));
        };
        let patch = channels * kh * kw;
        let cols = self
            .im2col(&geometry)?
            .permute(&[1, 0, 2])?
            .reshape(&[patch, batch * oh * ow])?;
        kernel
            .reshape(&[out_channels, patch])?
            .matmul(&cols)?
            .reshape(&[out_channels, batch, oh, ow])?
            .permute(&[1, 0, 2, 3])
    }

    fn conv_transpose2d(
        &self,
        kernel: &Var,
        stride: usize,
        padding: usize,
    ) -> Result<Var, GraphError> {
        let [batch, channels, h, w] = four_dims(&self.shape(), "转置卷积输入")?;
        let [in_channels, out_channels, kh, kw] = four_dims(&kernel.shape(), "转置卷积核")?;
        if in_channels != channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![channels, out_channels, kh, kw],
                got: kernel.shape(),
                message: "转置卷积核的输入通道数与输入不符".to_string(),
            });
        }
        let invalid = stride == 0
            || h == 0
            || w == 0
            || (h - 1) * stride + kh <= 2 * padding
            || (w - 1) * stride + kw <= 2 * padding;
        if invalid {
            return Err(GraphError::InvalidOperation(format!(
                "转置卷积（核{kh}x{kw}、步长{stride}、填充{padding}）不适用于{h}x{w}的输入"
            )));
        }
        let geometry = ConvGeometry::new(
            out_channels,
            (
                (h - 1) * stride + kh - 2 * padding,
                (w - 1) * stride + kw - 2 * padding,
            ),
            (kh, kw),
            (stride, stride),
            (padding, padding),
        );
        let patch = out_channels * kh * kw;
        let x = self.permute(&[1, 0, 2, 3])?.reshape(&[channels, batch * h * w])?;
        kernel
            .reshape(&[channels, patch])?
            .transpose()?
            .matmul(&x)?
            .reshape(&[patch, batch, h * w])?
            .permute(&[1, 0, 2])?
            .col2im(&geometry)
    }
}
