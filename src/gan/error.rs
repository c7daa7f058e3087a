/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : GAN 训练相关的错误类型
 */

use crate::data::DataError;
use crate::nn::GraphError;
use crate::vision::VisionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GanError {
    /// 配置不合法（启动时即报错）
    #[error("配置错误：{0}")]
    Configuration(String),

    /// 不支持的隐变量分布
    #[error("不支持的隐变量分布：{0}")]
    UnsupportedDistribution(String),

    /// 两个网络的参数或统计量的名字、形状不一致
    #[error("网络结构不一致：{0}")]
    ArchitectureMismatch(String),

    /// 批次数据的形状不对
    #[error("批次第{index}个样本形状错误：期望{expected:?}，实际{got:?}")]
    BatchShape {
        expected: Vec<usize>,
        got: Vec<usize>,
        index: usize,
    },

    /// 损失或梯度中出现 NaN/Inf
    #[error("数值不稳定：{phase}阶段的{what}不是有限值")]
    NumericInstability { phase: String, what: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("IO 错误：{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("读取 npz 失败：{0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    #[error("写入 npz 失败：{0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    #[error("JSON 序列化失败：{0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode 序列化失败：{0}")]
    Bincode(#[from] bincode::Error),
}
