//! DRAGAN 训练模块
//!
//! 在`nn`之上实现生成器/判别器网络族、参数同步、损失、训练更新引擎以及训练循环。
//!
//! # 主要组件
//!
//! - [`Generator`]/[`Discriminator`]: dcgan64、dcgan128、resnet128、resnet256 四种结构
//! - [`hard_copy`]/[`soft_copy`]: 按名字对齐的参数与运行统计量同步
//! - [`DraganUpdater`]: 生成器一步 → 平滑生成器 → 带梯度惩罚的判别器一步 → 学习率退火
//! - [`Trainer`]: 按[`TrainConfig`]组织日志、预览与快照的训练循环
//! - [`GanError`]: 本模块的错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use only_gan::gan::{TrainConfig, Trainer};
//!
//! let config = TrainConfig {
//!     npz_path: "faces.npz".into(),
//!     max_iter: 1000,
//!     ..TrainConfig::default()
//! };
//! Trainer::new(config)?.run()?;
//! ```

pub mod arch;
pub mod config;
mod error;
pub mod loss;
pub mod preview;
pub mod schedule;
pub mod snapshot;
pub mod sync;
pub mod trainer;
pub mod updater;

// Re-exports
pub use arch::{
    Architecture, Discriminator, DiscriminatorConfig, Generator, GeneratorConfig, ZDistribution,
};
pub use config::TrainConfig;
pub use error::GanError;
pub use loss::{adversarial_fake_loss, adversarial_real_loss, gradient_penalty, l2_loss};
pub use schedule::AnnealSchedule;
pub use sync::{hard_copy, soft_copy};
pub use trainer::{LogEntry, Trainer};
pub use updater::{DraganUpdater, Report, UpdatePhase, UpdaterConfig};
