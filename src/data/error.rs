//! 数据加载错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 读取 npz 失败
    #[error("读取 npz 失败: {0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    /// 写入 npz 失败
    #[error("写入 npz 失败: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    /// 格式错误（如缺少数组、元素类型不支持）
    #[error("格式错误: {0}")]
    FormatError(String),

    /// 形状不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 数据集为空
    #[error("数据集为空")]
    EmptyDataset,

    /// 输出文件已存在
    #[error("输出文件{0}已存在，需要强制覆盖时请传入 force")]
    OutputExists(PathBuf),

    /// 没有可处理的输入文件
    #[error("没有可处理的输入文件")]
    NoSources,
}
