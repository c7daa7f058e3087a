/*
 * @Author       : 老董
 * @Date         : 2026-03-03
 * @Description  : 卷积的展开（im2col）与折叠（col2im）。
 *                 两者互为伴随：im2col 的反向传播是 col2im，反之亦然，
 *                 卷积与转置卷积都由它们加矩阵乘法组合而成。
 */

use super::Tensor;
use crate::errors::TensorError;

/// 一次二维卷积的几何描述（NCHW 布局）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    /// 图像（而非列矩阵）一侧的通道数
    pub channels: usize,
    /// 图像一侧的高、宽
    pub image_hw: (usize, usize),
    pub kernel: (usize, usize),
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl ConvGeometry {
    pub fn new(
        channels: usize,
        image_hw: (usize, usize),
        kernel: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Self {
        Self {
            channels,
            image_hw,
            kernel,
            stride,
            padding,
        }
    }

    /// 卷积输出（即列矩阵一侧）的空间尺寸；核比填充后的图像还大时返回None
    pub fn output_hw(&self) -> Option<(usize, usize)> {
        let (h, w) = self.image_hw;
        let (kh, kw) = self.kernel;
        let (sh, sw) = self.stride;
        let (ph, pw) = self.padding;
        if sh == 0 || sw == 0 || h + 2 * ph < kh || w + 2 * pw < kw {
            return None;
        }
        Some(((h + 2 * ph - kh) / sh + 1, (w + 2 * pw - kw) / sw + 1))
    }

    /// 列矩阵的形状：[batch, channels * kh * kw, oh * ow]
    pub fn cols_shape(&self, batch: usize) -> Option<[usize; 3]> {
        let (oh, ow) = self.output_hw()?;
        Some([
            batch,
            self.channels * self.kernel.0 * self.kernel.1,
            oh * ow,
        ])
    }

    pub fn image_shape(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.image_hw.0, self.image_hw.1]
    }

    /// 遍历每个(通道, 核行, 核列, 输出行, 输出列)对应的(列矩阵下标, 图像下标)，越界（填充区）的位置跳过
    fn for_each_pair(&self, batch: usize, mut f: impl FnMut(usize, usize)) {
        let (h, w) = self.image_hw;
        let (kh, kw) = self.kernel;
        let (sh, sw) = self.stride;
        let (ph, pw) = self.padding;
        let Some((oh, ow)) = self.output_hw() else {
            return;
        };
        let c = self.channels;
        let rows = c * kh * kw;
        let cols = oh * ow;
        for n in 0..batch {
            for ci in 0..c {
                for i in 0..kh {
                    for j in 0..kw {
                        let row = (ci * kh + i) * kw + j;
                        let col_base = (n * rows + row) * cols;
                        for oy in 0..oh {
                            let y = oy * sh + i;
                            if y < ph || y - ph >= h {
                                continue;
                            }
                            let img_base = ((n * c + ci) * h + (y - ph)) * w;
                            for ox in 0..ow {
                                let x = ox * sw + j;
                                if x < pw || x - pw >= w {
                                    continue;
                                }
                                f(col_base + oy * ow + ox, img_base + (x - pw));
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Tensor {
    /// 图像[B, C, H, W] → 列矩阵[B, C*kh*kw, oh*ow]
    pub fn im2col(&self, geometry: &ConvGeometry) -> Tensor {
        let batch = self.shape()[0];
        let image_shape = geometry.image_shape(batch);
        let cols_shape = match geometry.cols_shape(batch) {
            Some(cols_shape) if self.shape() == image_shape => cols_shape,
            _ => conv_shape_panic(&image_shape, self.shape()),
        };
        let src = self.data_as_slice();
        let mut out = vec![0.0; cols_shape.iter().product()];
        geometry.for_each_pair(batch, |col, img| out[col] = src[img]);
        Tensor::new(&out, &cols_shape)
    }

    /// 列矩阵[B, C*kh*kw, oh*ow] → 图像[B, C, H, W]，重叠位置累加
    pub fn col2im(&self, geometry: &ConvGeometry) -> Tensor {
        let batch = self.shape()[0];
        let cols_shape = match geometry.cols_shape(batch) {
            Some(cols_shape) if self.shape() == cols_shape => cols_shape,
            Some(cols_shape) => conv_shape_panic(&cols_shape, self.shape()),
            None => conv_shape_panic(&geometry.image_shape(batch), self.shape()),
        };
        let src = self.data_as_slice();
        let image_shape = geometry.image_shape(batch);
        let mut out = vec![0.0; image_shape.iter().product()];
        geometry.for_each_pair(batch, |col, img| out[img] += src[col]);
        Tensor::new(&out, &image_shape)
    }
}

fn conv_shape_panic(expected: &[usize], got: &[usize]) -> ! {
    panic!(
        "{}",
        TensorError::ConvShape {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    )
}
