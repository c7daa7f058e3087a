//! 数据加载模块
//!
//! 提供图像数据集加载、无限循环的分批迭代与 npz 合并功能。
//!
//! # 主要组件
//!
//! - [`ImageDataset`]: 从 npz 读取的`[N, 3, H, W]`图像数据集，像素归一化到[-1, 1]
//! - [`SerialIterator`]: 每轮打乱、永不停止的批次迭代器
//! - [`BatchSource`]: 训练更新引擎所需的批次来源
//! - [`combine_npz`]: 把多个 npz 的4阶数组沿第0维拼接
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use only_gan::data::{BatchSource, ImageDataset, SerialIterator};
//!
//! let dataset = ImageDataset::from_npz("faces.npz", 64)?;
//! let mut iter = SerialIterator::new(dataset, 64, 0)?;
//! let batch = iter.next_batch()?;
//! ```

mod combine;
mod dataset;
pub mod error;
mod iterator;

#[cfg(test)]
mod tests;

// Re-exports
pub use combine::{CombineSummary, combine_npz};
pub use dataset::{ImageDataset, npz_key};
pub use error::DataError;
pub use iterator::{BatchSource, Sample, SerialIterator};
