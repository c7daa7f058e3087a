/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : ImageDataset - 从 npz 读取的图像数据集
 *
 * npz 中的数组名为`size_{图像边长}`，元素为 u8 或 f32，形状为[N, 3, H, W]；
 * 读入后按 (x - 127.5) / 127.5 归一化到[-1, 1]。
 */

use super::DataError;
use crate::tensor::Tensor;
use ndarray::{ArrayD, IxDyn, OwnedRepr};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// 图像边长对应的 npz 数组名
pub fn npz_key(image_size: usize) -> String {
    format!("size_{image_size}")
}

/// npz 中读出的原始图像数组（保留元素类型）
pub(crate) enum RawImages {
    U8(ArrayD<u8>),
    F32(ArrayD<f32>),
}

impl RawImages {
    /// 按名字读取，先尝试 u8 再尝试 f32
    pub(crate) fn read<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<Self, DataError> {
        match npz.by_name::<OwnedRepr<u8>, IxDyn>(name) {
            Ok(array) => Ok(Self::U8(array)),
            Err(_) => Ok(Self::F32(npz.by_name::<OwnedRepr<f32>, IxDyn>(name)?)),
        }
    }

    pub(crate) fn shape(&self) -> &[usize] {
        match self {
            Self::U8(a) => a.shape(),
            Self::F32(a) => a.shape(),
        }
    }

    pub(crate) const fn dtype(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::F32(_) => "f32",
        }
    }

    pub(crate) fn byte_size(&self) -> usize {
        match self {
            Self::U8(a) => a.len(),
            Self::F32(a) => a.len() * std::mem::size_of::<f32>(),
        }
    }

    fn into_f32(self) -> ArrayD<f32> {
        match self {
            Self::U8(a) => a.mapv(f32::from),
            Self::F32(a) => a,
        }
    }
}

/// npz 里的数组名，兼容带或不带`.npy`后缀两种写法
pub(crate) fn array_names<R: Read + Seek>(npz: &mut NpzReader<R>) -> Result<Vec<(String, String)>, DataError> {
    Ok(npz
        .names()?
        .into_iter()
        .map(|raw| (raw.trim_end_matches(".npy").to_string(), raw))
        .collect())
}

/// 图像数据集，所有图像保存在一个[N, 3, H, W]张量中
#[derive(Debug, Clone)]
pub struct ImageDataset {
    images: Tensor,
}

impl ImageDataset {
    /// 从 npz 文件读取边长为`image_size`的图像
    pub fn from_npz(path: impl AsRef<Path>, image_size: usize) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::FileNotFound(path.to_path_buf()));
        }
        let mut npz = NpzReader::new(File::open(path)?)?;
        let key = npz_key(image_size);
        let Some((_, raw_name)) = array_names(&mut npz)?.into_iter().find(|(name, _)| *name == key) else {
            return Err(DataError::FormatError(format!(
                "{}中没有名为{key}的数组",
                path.display()
            )));
        };
        let data = RawImages::read(&mut npz, &raw_name)?.into_f32();
        let images = Tensor::from_array(data.mapv(|x| (x - 127.5) / 127.5));
        let dataset = Self::from_tensor(images)?;
        if dataset.image_size() != image_size {
            return Err(DataError::ShapeMismatch {
                expected: vec![dataset.len(), 3, image_size, image_size],
                got: dataset.images.shape().to_vec(),
            });
        }
        Ok(dataset)
    }

    /// 由已归一化的[N, 3, H, W]张量构造（H 须等于 W）
    pub fn from_tensor(images: Tensor) -> Result<Self, DataError> {
        let shape = images.shape();
        if shape.len() != 4 || shape[1] != 3 || shape[2] != shape[3] {
            let n = shape.first().copied().unwrap_or(0);
            let side = shape.get(2).copied().unwrap_or(0);
            return Err(DataError::ShapeMismatch {
                expected: vec![n, 3, side, side],
                got: shape.to_vec(),
            });
        }
        if shape[0] == 0 {
            return Err(DataError::EmptyDataset);
        }
        Ok(Self { images })
    }

    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 图像边长
    pub fn image_size(&self) -> usize {
        self.images.shape()[2]
    }

    /// 第`index`张图像，形状[3, H, W]
    pub fn get(&self, index: usize) -> Tensor {
        self.images.index_axis0(index)
    }

    pub const fn images(&self) -> &Tensor {
        &self.images
    }
}
