//! # Only GAN
//!
//! `only_gan`用纯rust实现[DRAGAN](https://arxiv.org/abs/1705.07215)风格的生成对抗网络训练：
//! 即时求值、支持二阶导的自动微分，DCGAN/ResNet 两族网络结构，
//! 以及“生成器一步 → 指数平滑 → 判别器一步（含梯度惩罚）→ 学习率退火”的训练更新引擎。
//!

pub mod data;
pub mod errors;
pub mod gan;
pub mod nn;
pub mod tensor;
pub mod utils;
pub mod vision;
