/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : 批次来源与无限循环的串行迭代器
 *
 * SerialIterator 永不停止：每轮开始时用自带的 RNG 重新打乱顺序；
 * 若一个批次跨越了轮次边界，先取完本轮剩余样本，再从新一轮的排列中补齐。
 */

use super::{DataError, ImageDataset};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// 批次中的单个样本
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// 只有图像，形状[3, H, W]
    Image(Tensor),
    /// 图像及其在数据集中的编号
    WithId(Tensor, usize),
}

impl Sample {
    /// 取出图像数据，丢弃编号
    pub fn into_data(self) -> Tensor {
        match self {
            Self::Image(data) | Self::WithId(data, _) => data,
        }
    }

    pub const fn data(&self) -> &Tensor {
        match self {
            Self::Image(data) | Self::WithId(data, _) => data,
        }
    }
}

/// 训练更新引擎获取批次的接口
pub trait BatchSource {
    fn next_batch(&mut self) -> Result<Vec<Sample>, DataError>;

    /// 已完成的轮数
    fn epoch(&self) -> usize {
        0
    }
}

pub struct SerialIterator {
    dataset: ImageDataset,
    batch_size: usize,
    with_ids: bool,
    order: Vec<usize>,
    position: usize,
    epoch: usize,
    is_new_epoch: bool,
    rng: StdRng,
}

impl SerialIterator {
    pub fn new(dataset: ImageDataset, batch_size: usize, seed: u64) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::FormatError("batch_size 必须大于 0".to_string()));
        }
        if dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(&mut rng);
        Ok(Self {
            dataset,
            batch_size,
            with_ids: false,
            order,
            position: 0,
            epoch: 0,
            is_new_epoch: false,
            rng,
        })
    }

    /// 样本附带其在数据集中的编号
    pub const fn with_ids(mut self, with_ids: bool) -> Self {
        self.with_ids = with_ids;
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 上一个批次是否让轮数增加
    pub const fn is_new_epoch(&self) -> bool {
        self.is_new_epoch
    }

    /// 已消耗的轮数（含小数部分）
    pub fn epoch_detail(&self) -> f64 {
        self.epoch as f64 + self.position as f64 / self.order.len() as f64
    }

    fn sample(&self, index: usize) -> Sample {
        let data = self.dataset.get(index);
        if self.with_ids {
            Sample::WithId(data, index)
        } else {
            Sample::Image(data)
        }
    }
}

impl BatchSource for SerialIterator {
    fn next_batch(&mut self) -> Result<Vec<Sample>, DataError> {
        let mut batch = Vec::with_capacity(self.batch_size);
        self.is_new_epoch = false;
        while batch.len() < self.batch_size {
            let take = (self.batch_size - batch.len()).min(self.order.len() - self.position);
            for i in self.position..self.position + take {
                batch.push(self.sample(self.order[i]));
            }
            self.position += take;
            if self.position == self.order.len() {
                self.order.shuffle(&mut self.rng);
                self.position = 0;
                self.epoch += 1;
                self.is_new_epoch = true;
            }
        }
        Ok(batch)
    }

    fn epoch(&self) -> usize {
        self.epoch
    }
}
