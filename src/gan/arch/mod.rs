/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 生成器/判别器的网络结构族
 *
 * 训练更新引擎只依赖一个很窄的约定：
 * - Generator：`sample_latent(B) -> [B, latent_dim, 1, 1]`，`generate(z) -> [B, 3, H, W]`（tanh 输出）
 * - Discriminator：`score(x) -> [B, output_dim]`（无界）
 * - 两者都通过`Module`按名字枚举参数与 BatchNorm 运行统计量
 */

mod dcgan;
mod resnet;

use crate::gan::GanError;
use crate::nn::layer::{LayerKind, forward_sequence};
use crate::nn::{Graph, GraphError, Layer, Module, RunningStats, Var};
use crate::tensor::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 权重初始化的默认标准差
pub const DEFAULT_WSCALE: f32 = 0.02;
/// 网络最底层特征图的边长
pub const BOTTOM_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Dcgan64,
    Dcgan128,
    Resnet128,
    Resnet256,
}

impl Architecture {
    pub const ALL: [Self; 4] = [Self::Dcgan64, Self::Dcgan128, Self::Resnet128, Self::Resnet256];

    pub fn from_name(name: &str) -> Result<Self, GanError> {
        match name {
            "dcgan64" => Ok(Self::Dcgan64),
            "dcgan128" => Ok(Self::Dcgan128),
            "resnet128" => Ok(Self::Resnet128),
            "resnet256" => Ok(Self::Resnet256),
            other => Err(GanError::Configuration(format!(
                "未知的网络结构{other}，可选：dcgan64、dcgan128、resnet128、resnet256"
            ))),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Dcgan64 => "dcgan64",
            Self::Dcgan128 => "dcgan128",
            Self::Resnet128 => "resnet128",
            Self::Resnet256 => "resnet256",
        }
    }

    /// 该结构生成/判别的图像边长
    pub const fn image_size(self) -> usize {
        match self {
            Self::Dcgan64 => 64,
            Self::Dcgan128 | Self::Resnet128 => 128,
            Self::Resnet256 => 256,
        }
    }

    pub const fn default_ch(self) -> usize {
        match self {
            Self::Dcgan64 => 512,
            Self::Dcgan128 | Self::Resnet128 | Self::Resnet256 => 1024,
        }
    }

    /// 上/下采样的级数：图像边长 = 4 · 2^级数
    pub const fn levels(self) -> usize {
        match self {
            Self::Dcgan64 => 4,
            Self::Dcgan128 | Self::Resnet128 => 5,
            Self::Resnet256 => 6,
        }
    }

    /// 最窄一层的通道数为 ch / 该值，ch 须能被它整除
    pub const fn deepest_divisor(self) -> usize {
        match self {
            Self::Dcgan64 => 8,
            Self::Dcgan128 | Self::Resnet128 => 16,
            Self::Resnet256 => 32,
        }
    }

    fn validate_shared(self, image_size: usize, ch: usize) -> Result<(), GanError> {
        if image_size != self.image_size() {
            return Err(GanError::Configuration(format!(
                "{}只支持{}像素的图像，实际为{image_size}",
                self.name(),
                self.image_size()
            )));
        }
        if ch == 0 || ch % self.deepest_divisor() != 0 {
            return Err(GanError::Configuration(format!(
                "{}的通道数 ch 须为{}的正整数倍，实际为{ch}",
                self.name(),
                self.deepest_divisor()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = GanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// 隐变量的分布
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZDistribution {
    /// 标准正态
    Normal,
    /// [-1, 1]上的均匀分布
    Uniform,
}

impl FromStr for ZDistribution {
    type Err = GanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "uniform" => Ok(Self::Uniform),
            other => Err(GanError::UnsupportedDistribution(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub arch: Architecture,
    pub image_size: usize,
    pub latent_dim: usize,
    pub ch: usize,
    pub wscale: f32,
    pub z_distribution: ZDistribution,
    /// 只对 dcgan 结构有效
    pub use_bn: bool,
}

impl GeneratorConfig {
    /// 该结构的默认配置
    pub const fn new(arch: Architecture) -> Self {
        Self {
            arch,
            image_size: arch.image_size(),
            latent_dim: 128,
            ch: arch.default_ch(),
            wscale: DEFAULT_WSCALE,
            z_distribution: ZDistribution::Normal,
            use_bn: true,
        }
    }

    pub fn validate(&self) -> Result<(), GanError> {
        self.arch.validate_shared(self.image_size, self.ch)?;
        if self.latent_dim == 0 {
            return Err(GanError::Configuration("latent_dim 必须大于 0".to_string()));
        }
        validate_wscale(self.wscale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorConfig {
    pub arch: Architecture,
    pub image_size: usize,
    pub ch: usize,
    pub wscale: f32,
    pub output_dim: usize,
}

impl DiscriminatorConfig {
    pub const fn new(arch: Architecture) -> Self {
        Self {
            arch,
            image_size: arch.image_size(),
            ch: arch.default_ch(),
            wscale: DEFAULT_WSCALE,
            output_dim: 1,
        }
    }

    pub fn validate(&self) -> Result<(), GanError> {
        self.arch.validate_shared(self.image_size, self.ch)?;
        if self.output_dim == 0 {
            return Err(GanError::Configuration("output_dim 必须大于 0".to_string()));
        }
        validate_wscale(self.wscale)
    }
}

fn validate_wscale(wscale: f32) -> Result<(), GanError> {
    if wscale.is_finite() && wscale > 0.0 {
        Ok(())
    } else {
        Err(GanError::Configuration(format!("wscale 必须是正数，实际为{wscale}")))
    }
}

/// 参数与统计量的名字在网络内须唯一
fn ensure_unique_catalogue(layers: &[LayerKind]) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    let params = layers.iter().flat_map(Layer::named_parameters).map(|(name, _)| name);
    let stats = layers
        .iter()
        .flat_map(Layer::named_statistics)
        .map(|(name, _)| format!("{name}/stats"));
    for name in params.chain(stats) {
        if !seen.insert(name.clone()) {
            return Err(GraphError::DuplicateName(name));
        }
    }
    Ok(())
}

fn check_input_shape(x: &Var, expected: &[usize], what: &str) -> Result<(), GraphError> {
    let shape = x.shape();
    if shape.len() != expected.len() + 1 || shape[1..] != *expected {
        let mut full = vec![shape.first().copied().unwrap_or(0)];
        full.extend_from_slice(expected);
        return Err(GraphError::ShapeMismatch {
            expected: full,
            got: shape,
            message: what.to_string(),
        });
    }
    Ok(())
}

pub struct Generator {
    config: GeneratorConfig,
    layers: Vec<LayerKind>,
}

impl Generator {
    pub fn new(graph: &Graph, config: GeneratorConfig) -> Result<Self, GanError> {
        config.validate()?;
        let layers = match config.arch {
            Architecture::Dcgan64 | Architecture::Dcgan128 => dcgan::generator(graph, &config)?,
            Architecture::Resnet128 | Architecture::Resnet256 => resnet::generator(graph, &config)?,
        };
        ensure_unique_catalogue(&layers)?;
        Ok(Self { config, layers })
    }

    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub const fn latent_dim(&self) -> usize {
        self.config.latent_dim
    }

    /// 采样一批隐变量，形状[batch, latent_dim, 1, 1]
    pub fn sample_latent<R: Rng + ?Sized>(&self, batch: usize, rng: &mut R) -> Tensor {
        let shape = [batch, self.config.latent_dim, 1, 1];
        match self.config.z_distribution {
            ZDistribution::Normal => Tensor::normal_with_rng(0.0, 1.0, &shape, rng),
            ZDistribution::Uniform => Tensor::uniform_with_rng(-1.0, 1.0, &shape, rng),
        }
    }

    /// 由隐变量生成图像[B, 3, H, W]，取值在(-1, 1)
    pub fn generate(&self, z: &Var) -> Result<Var, GraphError> {
        check_input_shape(z, &[self.config.latent_dim, 1, 1], "生成器的隐变量形状")?;
        forward_sequence(&self.layers, z)
    }
}

impl Module for Generator {
    fn named_parameters(&self) -> Vec<(String, Var)> {
        self.layers.iter().flat_map(Layer::named_parameters).collect()
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        self.layers.iter().flat_map(Layer::named_statistics).collect()
    }
}

pub struct Discriminator {
    config: DiscriminatorConfig,
    layers: Vec<LayerKind>,
}

impl Discriminator {
    pub fn new(graph: &Graph, config: DiscriminatorConfig) -> Result<Self, GanError> {
        config.validate()?;
        let layers = match config.arch {
            Architecture::Dcgan64 | Architecture::Dcgan128 => dcgan::discriminator(graph, &config)?,
            Architecture::Resnet128 | Architecture::Resnet256 => {
                resnet::discriminator(graph, &config)?
            }
        };
        ensure_unique_catalogue(&layers)?;
        Ok(Self { config, layers })
    }

    pub const fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }

    /// 对图像[B, 3, H, W]打分，得到[B, output_dim]
    pub fn score(&self, x: &Var) -> Result<Var, GraphError> {
        let side = self.config.image_size;
        check_input_shape(x, &[3, side, side], "判别器的输入图像形状")?;
        forward_sequence(&self.layers, x)
    }
}

impl Module for Discriminator {
    fn named_parameters(&self) -> Vec<(String, Var)> {
        self.layers.iter().flat_map(Layer::named_parameters).collect()
    }

    fn named_statistics(&self) -> Vec<(String, RunningStats)> {
        self.layers.iter().flat_map(Layer::named_statistics).collect()
    }
}

#[cfg(test)]
mod tests;
