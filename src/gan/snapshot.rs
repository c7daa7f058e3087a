/*
 * @Author       : 老董
 * @Date         : 2026-03-12
 * @Description  : 训练快照
 *
 * 网络保存为 npz：参数按其名字存放，BatchNorm 运行统计量存为`{bn}_avg_mean`、`{bn}_avg_var`；
 * 优化器状态用 bincode 保存。载入时名字与形状必须和目标网络完全一致。
 */

use crate::data::BatchSource;
use crate::gan::GanError;
use crate::gan::sync::named_leaves;
use crate::gan::updater::DraganUpdater;
use crate::nn::{Adam, AdamState, Module};
use crate::tensor::Tensor;
use crate::utils::file_size_in_byte;
use ndarray::{IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// 把网络的参数与运行统计量写入 npz
pub fn save_network<M: Module + ?Sized>(net: &M, path: impl AsRef<Path>) -> Result<(), GanError> {
    let mut npz = NpzWriter::new_compressed(File::create(path)?);
    for (name, leaf) in named_leaves(net) {
        npz.add_array(name, &leaf.value().view())?;
    }
    npz.finish()?;
    Ok(())
}

/// 从 npz 载入网络；文件中的数组须与网络的命名叶子一一对应
pub fn load_network<M: Module + ?Sized>(path: impl AsRef<Path>, net: &M) -> Result<(), GanError> {
    let path = path.as_ref();
    let mut npz = NpzReader::new(File::open(path)?)?;
    let raw_names: HashMap<String, String> = npz
        .names()?
        .into_iter()
        .map(|raw| (raw.trim_end_matches(".npy").to_string(), raw))
        .collect();

    let leaves = named_leaves(net);
    if raw_names.len() != leaves.len() {
        return Err(GanError::ArchitectureMismatch(format!(
            "{}中有{}个数组，网络需要{}个",
            path.display(),
            raw_names.len(),
            leaves.len()
        )));
    }

    // 先全部读出并校验，再统一写入
    let mut loaded = Vec::with_capacity(leaves.len());
    for (name, leaf) in leaves {
        let raw = raw_names.get(&name).ok_or_else(|| {
            GanError::ArchitectureMismatch(format!("{}中缺少数组{name}", path.display()))
        })?;
        let array = npz.by_name::<OwnedRepr<f32>, IxDyn>(raw)?;
        if array.shape() != leaf.shape().as_slice() {
            return Err(GanError::ArchitectureMismatch(format!(
                "数组{name}形状不同：文件中为{:?}，网络需要{:?}",
                array.shape(),
                leaf.shape()
            )));
        }
        loaded.push((leaf, Tensor::from_array(array)));
    }
    for (leaf, value) in loaded {
        leaf.set_value(&value)?;
    }
    Ok(())
}

pub fn save_optimizer(optimizer: &Adam, path: impl AsRef<Path>) -> Result<(), GanError> {
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &optimizer.state())?;
    Ok(())
}

pub fn load_optimizer(path: impl AsRef<Path>, optimizer: &mut Adam) -> Result<(), GanError> {
    let reader = BufReader::new(File::open(path)?);
    let state: AdamState = bincode::deserialize_from(reader)?;
    optimizer.load_state(state)?;
    Ok(())
}

/// 把三个网络与两个优化器的当前状态写到`out`目录，文件名带迭代次数
pub fn write_snapshot<S: BatchSource>(
    out: impl AsRef<Path>,
    updater: &DraganUpdater<S>,
) -> Result<Vec<PathBuf>, GanError> {
    let out = out.as_ref();
    fs::create_dir_all(out)?;
    let it = updater.iteration();

    let networks: [(&str, &dyn Module); 3] = [
        ("Generator", updater.generator()),
        ("Discriminator", updater.discriminator()),
        ("SmoothedGenerator", updater.smoothed_generator()),
    ];
    let mut written = Vec::with_capacity(5);
    for (prefix, net) in networks {
        let path = out.join(format!("{prefix}_{it}.npz"));
        save_network(net, &path)?;
        written.push(path);
    }
    for (prefix, optimizer) in [("opt_gen", updater.opt_gen()), ("opt_dis", updater.opt_dis())] {
        let path = out.join(format!("{prefix}_{it}.bin"));
        save_optimizer(optimizer, &path)?;
        written.push(path);
    }

    let total: u64 = written
        .iter()
        .map(|p| file_size_in_byte(p))
        .sum::<std::io::Result<u64>>()?;
    info!("第{it}次迭代：快照已写入{}（共{total}字节）", out.display());
    Ok(written)
}
