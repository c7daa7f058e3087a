use super::Tensor;
use ndarray::Axis;

impl Tensor {
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    pub fn mean(&self) -> f32 {
        self.sum() / self.size() as f32
    }

    /// 沿给定各维求和并保留这些维（长度变为1）
    pub fn sum_axes_keepdims(&self, axes: &[usize]) -> Tensor {
        let mut data = self.data.clone();
        for &axis in axes {
            data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
        }
        Tensor::from_array(data)
    }

    pub fn mean_axes_keepdims(&self, axes: &[usize]) -> Tensor {
        let count = axes.iter().map(|&a| self.shape()[a]).product::<usize>();
        self.sum_axes_keepdims(axes) / count as f32
    }

    /// 第0维（批维）上的总体标准差，保留第0维
    pub fn std_axis0_keepdims(&self) -> Tensor {
        let mean = self.mean_axes_keepdims(&[0]);
        let centered = self - &mean;
        (&centered * &centered).mean_axes_keepdims(&[0]).sqrt()
    }
}
