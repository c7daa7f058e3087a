/*
 * @Author       : 老董
 * @Date         : 2026-03-06
 * @Description  : Conv2d 层（NCHW，正方形卷积核）
 */

use super::Layer;
use crate::nn::{Graph, GraphError, Init, Var, VarConvOps};

pub struct Conv2d {
    /// 卷积核 [out_channels, in_channels, k, k]
    kernel: Var,
    /// 偏置 [1, out_channels, 1, 1]
    bias: Var,
    stride: usize,
    padding: usize,
    name: String,
}

impl Conv2d {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        init: Init,
        name: &str,
    ) -> Result<Self, GraphError> {
        let kernel = graph.parameter(
            &[out_channels, in_channels, kernel_size, kernel_size],
            init,
            &format!("{name}_K"),
        )?;
        let bias = graph.parameter(&[1, out_channels, 1, 1], Init::Zeros, &format!("{name}_b"))?;
        Ok(Self {
            kernel,
            bias,
            stride,
            padding,
            name: name.to_string(),
        })
    }
}

impl Layer for Conv2d {
    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.conv2d(&self.kernel, self.stride, self.padding)?
            .try_add(&self.bias)
    }

    fn named_parameters(&self) -> Vec<(String, Var)> {
        vec![
            (format!("{}_K", self.name), self.kernel.clone()),
            (format!("{}_b", self.name), self.bias.clone()),
        ]
    }
}
