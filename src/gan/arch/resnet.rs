/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : ResNet 结构（128/256 像素）
 *
 * 生成器：Linear → reshape[ch, 4, 4] → 若干 ResBlockUp（首个保持 ch，之后逐级减半）
 *        → BN → ReLU → Conv(k3s1p1, 3通道) → tanh
 * 判别器：若干 ResBlockDown（3通道起，逐级加宽到 ch）→ ReLU → Linear
 */

use super::{BOTTOM_WIDTH, DiscriminatorConfig, GeneratorConfig};
use crate::nn::layer::{
    Activation, BatchNorm, Conv2d, LayerKind, Linear, Reshape, ResBlockDown, ResBlockUp,
};
use crate::nn::{Graph, GraphError, Init};

pub(super) fn generator(graph: &Graph, config: &GeneratorConfig) -> Result<Vec<LayerKind>, GraphError> {
    let init = Init::Normal { mean: 0.0, std: config.wscale };
    let ch = config.ch;
    let levels = config.arch.levels();

    let mut layers: Vec<LayerKind> = vec![
        Linear::new(graph, config.latent_dim, BOTTOM_WIDTH * BOTTOM_WIDTH * ch, init.clone(), "dense")?.into(),
        Reshape::new(&[ch, BOTTOM_WIDTH, BOTTOM_WIDTH]).into(),
    ];
    let mut in_ch = ch;
    for i in 0..levels {
        let out_ch = if i == 0 { ch } else { in_ch / 2 };
        layers.push(ResBlockUp::new(graph, in_ch, out_ch, init.clone(), &format!("up{i}"))?.into());
        in_ch = out_ch;
    }
    layers.push(BatchNorm::new(graph, in_ch, true, "final_bn")?.into());
    layers.push(Activation::Relu.into());
    layers.push(Conv2d::new(graph, in_ch, 3, 3, 1, 1, init, "final_c")?.into());
    layers.push(Activation::Tanh.into());
    Ok(layers)
}

pub(super) fn discriminator(
    graph: &Graph,
    config: &DiscriminatorConfig,
) -> Result<Vec<LayerKind>, GraphError> {
    let init = Init::Normal { mean: 0.0, std: config.wscale };
    let ch = config.ch;
    let levels = config.arch.levels();

    let mut layers: Vec<LayerKind> = Vec::with_capacity(levels + 2);
    let mut in_ch = 3;
    for i in 0..levels {
        let out_ch = ch >> (levels - 1 - i);
        layers.push(ResBlockDown::new(graph, in_ch, out_ch, init.clone(), &format!("down{i}"))?.into());
        in_ch = out_ch;
    }
    layers.push(Activation::Relu.into());
    layers.push(Linear::new(graph, BOTTOM_WIDTH * BOTTOM_WIDTH * ch, config.output_dim, init, "out")?.into());
    Ok(layers)
}
