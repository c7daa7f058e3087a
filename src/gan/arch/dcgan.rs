/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : DCGAN 结构（64/128 像素）
 *
 * 生成器：Linear → [BN] → ReLU → reshape[ch, 4, 4] → 若干级 Deconv(k4s2p1) → [BN] → ReLU，
 *        通道逐级减半，最后一级 Deconv 输出3通道并接 tanh。
 * 判别器：首个 Conv(k4s2p1) 只接 LeakyReLU；之后每级为 Conv(k4s2p1) 与 Conv(k3s1p1)，
 *        均接无 gamma 的 BN 与 LeakyReLU(0.2)，最后 Linear 到 output_dim。
 */

use super::{BOTTOM_WIDTH, DiscriminatorConfig, GeneratorConfig};
use crate::nn::layer::{Activation, BatchNorm, Conv2d, Deconv2d, LayerKind, Linear, Reshape};
use crate::nn::{Graph, GraphError, Init};

const LEAKY_SLOPE: f32 = 0.2;

pub(super) fn generator(graph: &Graph, config: &GeneratorConfig) -> Result<Vec<LayerKind>, GraphError> {
    let init = Init::Normal { mean: 0.0, std: config.wscale };
    let ch = config.ch;
    let dense = BOTTOM_WIDTH * BOTTOM_WIDTH * ch;
    let mut layers: Vec<LayerKind> = vec![Linear::new(graph, config.latent_dim, dense, init.clone(), "l0")?.into()];
    if config.use_bn {
        layers.push(BatchNorm::new(graph, dense, true, "bn0")?.into());
    }
    layers.push(Activation::Relu.into());
    layers.push(Reshape::new(&[ch, BOTTOM_WIDTH, BOTTOM_WIDTH]).into());

    let levels = config.arch.levels();
    let mut in_ch = ch;
    for i in 1..levels {
        let out_ch = in_ch / 2;
        layers.push(Deconv2d::new(graph, in_ch, out_ch, 4, 2, 1, init.clone(), &format!("dc{i}"))?.into());
        if config.use_bn {
            layers.push(BatchNorm::new(graph, out_ch, true, &format!("bn{i}"))?.into());
        }
        layers.push(Activation::Relu.into());
        in_ch = out_ch;
    }
    layers.push(Deconv2d::new(graph, in_ch, 3, 4, 2, 1, init, &format!("dc{levels}"))?.into());
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
    let leaky = || LayerKind::from(Activation::LeakyRelu(LEAKY_SLOPE));

    // 各级通道：ch/2^(levels-1), ..., ch/2, ch
    let width = |level: usize| ch >> (levels - 1 - level);

    let mut layers: Vec<LayerKind> = vec![
        Conv2d::new(graph, 3, width(0), 4, 2, 1, init.clone(), "c0_0")?.into(),
        leaky(),
    ];
    let mut in_ch = width(0);
    for level in 0..levels - 1 {
        // 每级先以步长2的卷积下采样并加宽，再接一个步长1的卷积
        let out_ch = width(level + 1);
        let down = format!("c{level}_1");
        let flat = format!("c{}_0", level + 1);
        layers.push(Conv2d::new(graph, in_ch, out_ch, 4, 2, 1, init.clone(), &down)?.into());
        layers.push(BatchNorm::new(graph, out_ch, false, &format!("bn{level}_1"))?.into());
        layers.push(leaky());
        layers.push(Conv2d::new(graph, out_ch, out_ch, 3, 1, 1, init.clone(), &flat)?.into());
        layers.push(BatchNorm::new(graph, out_ch, false, &format!("bn{}_0", level + 1))?.into());
        layers.push(leaky());
        in_ch = out_ch;
    }
    layers.push(Linear::new(graph, BOTTOM_WIDTH * BOTTOM_WIDTH * ch, config.output_dim, init, "l4")?.into());
    Ok(layers)
}
