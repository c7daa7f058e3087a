/*
 * @Author       : 老董
 * @Date         : 2026-03-08
 * @Description  : 合并多个 npz 图像文件
 *
 * 每个输入文件中的所有4阶数组（元素类型须一致）沿第0维依次拼接，
 * 以最后读到的数组名写入一个压缩 npz。
 */

use super::DataError;
use super::dataset::{RawImages, array_names};
use crate::utils::file_size_in_byte;
use ndarray::{ArrayD, Axis, concatenate};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    pub key: String,
    pub shape: Vec<usize>,
    pub dtype: &'static str,
}

/// 合并`sources`中的 npz 到`output`
///
/// - `limit`为负时处理全部输入，否则只处理前`limit`个
/// - `output`已存在且`force`为 false 时返回`OutputExists`
pub fn combine_npz(
    output: impl AsRef<Path>,
    sources: &[PathBuf],
    limit: i64,
    force: bool,
) -> Result<CombineSummary, DataError> {
    let output = output.as_ref();
    if !force && output.is_file() {
        return Err(DataError::OutputExists(output.to_path_buf()));
    }
    let sources = match usize::try_from(limit) {
        Ok(limit) => &sources[..limit.min(sources.len())],
        Err(_) => sources,
    };
    if sources.is_empty() {
        return Err(DataError::NoSources);
    }

    let mut key = None;
    let mut u8_parts: Vec<ArrayD<u8>> = Vec::new();
    let mut f32_parts: Vec<ArrayD<f32>> = Vec::new();
    let mut total_bytes = 0usize;
    for (i, source) in sources.iter().enumerate() {
        if !source.is_file() {
            return Err(DataError::FileNotFound(source.clone()));
        }
        let mut npz = NpzReader::new(File::open(source)?)?;
        let mut found = 0;
        for (name, raw_name) in array_names(&mut npz)? {
            key = Some(name);
            let images = RawImages::read(&mut npz, &raw_name)?;
            if images.shape().len() != 4 {
                continue;
            }
            if i == 0 && found == 0 {
                info!("单个批次大小：{} 字节", images.byte_size());
            }
            total_bytes += images.byte_size();
            found += 1;
            match images {
                RawImages::U8(a) => u8_parts.push(a),
                RawImages::F32(a) => f32_parts.push(a),
            }
        }
        if found == 0 {
            warn!("{}中没有4阶数组，已跳过", source.display());
        }
    }

    let key = key.ok_or(DataError::NoSources)?;
    if !u8_parts.is_empty() && !f32_parts.is_empty() {
        return Err(DataError::FormatError(
            "输入文件中的图像元素类型不一致（同时含有 u8 与 f32）".to_string(),
        ));
    }
    if u8_parts.is_empty() && f32_parts.is_empty() {
        return Err(DataError::FormatError("输入文件中没有任何4阶数组".to_string()));
    }
    info!("合计：{:.6}GB", total_bytes as f64 * 1e-9);

    let mut writer = NpzWriter::new_compressed(File::create(output)?);
    let summary = if !u8_parts.is_empty() {
        let merged = concat_parts(&u8_parts)?;
        writer.add_array(key.as_str(), &merged)?;
        CombineSummary { key, shape: merged.shape().to_vec(), dtype: "u8" }
    } else {
        let merged = concat_parts(&f32_parts)?;
        writer.add_array(key.as_str(), &merged)?;
        CombineSummary { key, shape: merged.shape().to_vec(), dtype: "f32" }
    };
    writer.finish()?;
    info!(
        "已写入{}：{} {:?}，{} 字节",
        output.display(),
        summary.dtype,
        summary.shape,
        file_size_in_byte(output)?
    );
    Ok(summary)
}

fn concat_parts<T: Clone>(parts: &[ArrayD<T>]) -> Result<ArrayD<T>, DataError> {
    let views = parts.iter().map(ArrayD::view).collect::<Vec<_>>();
    concatenate(Axis(0), &views).map_err(|_| {
        let first = parts[0].shape();
        let bad = parts.iter().map(|p| p.shape()).find(|s| s[1..] != first[1..]).unwrap_or(first);
        DataError::ShapeMismatch {
            expected: first.to_vec(),
            got: bad.to_vec(),
        }
    })
}
