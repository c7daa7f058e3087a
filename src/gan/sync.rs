/*
 * @Author       : 老董
 * @Date         : 2026-03-09
 * @Description  : 参数同步：硬拷贝与软拷贝（指数滑动平均）
 *
 * 两个网络按名字对齐参数与 BatchNorm 运行统计量；
 * 任何名字或形状不一致都会在修改目标网络之前报错。
 */

use crate::gan::GanError;
use crate::nn::{Module, RunningStats, Var};

/// 目标网络中与源网络按名字对齐的（目标, 源）叶子节点对
fn aligned_leaves<T, S>(target: &T, source: &S) -> Result<Vec<(Var, Var)>, GanError>
where
    T: Module + ?Sized,
    S: Module + ?Sized,
{
    let mut pairs = Vec::new();
    align(
        "参数",
        target.named_parameters(),
        source.named_parameters(),
        &mut pairs,
    )?;
    align(
        "运行统计量",
        flatten_statistics(target.named_statistics()),
        flatten_statistics(source.named_statistics()),
        &mut pairs,
    )?;
    Ok(pairs)
}

/// 把运行统计量展开为`{bn}_avg_mean`、`{bn}_avg_var`两个命名叶子
pub(crate) fn flatten_statistics(stats: Vec<(String, RunningStats)>) -> Vec<(String, Var)> {
    stats
        .into_iter()
        .flat_map(|(name, s)| [(format!("{name}_avg_mean"), s.mean), (format!("{name}_avg_var"), s.var)])
        .collect()
}

/// 网络中所有需要保存/同步的命名叶子：先参数，后运行统计量
pub(crate) fn named_leaves<M: Module + ?Sized>(net: &M) -> Vec<(String, Var)> {
    let mut leaves = net.named_parameters();
    leaves.extend(flatten_statistics(net.named_statistics()));
    leaves
}

fn align(
    kind: &str,
    target: Vec<(String, Var)>,
    source: Vec<(String, Var)>,
    pairs: &mut Vec<(Var, Var)>,
) -> Result<(), GanError> {
    if target.len() != source.len() {
        return Err(GanError::ArchitectureMismatch(format!(
            "{kind}个数不同：目标{}个，源{}个",
            target.len(),
            source.len()
        )));
    }
    for ((t_name, t), (s_name, s)) in target.into_iter().zip(source) {
        if t_name != s_name {
            return Err(GanError::ArchitectureMismatch(format!(
                "{kind}名字不同：目标{t_name}，源{s_name}"
            )));
        }
        if t.shape() != s.shape() {
            return Err(GanError::ArchitectureMismatch(format!(
                "{kind}{t_name}形状不同：目标{:?}，源{:?}",
                t.shape(),
                s.shape()
            )));
        }
        pairs.push((t, s));
    }
    Ok(())
}

/// 把`source`的全部参数与运行统计量复制到`target`
pub fn hard_copy<T, S>(target: &T, source: &S) -> Result<(), GanError>
where
    T: Module + ?Sized,
    S: Module + ?Sized,
{
    for (t, s) in aligned_leaves(target, source)? {
        t.set_value(&s.value())?;
    }
    Ok(())
}

/// `target ← (1 − tau)·target + tau·source`，对参数与运行统计量都生效
///
/// `tau`须在(0, 1]内；`tau == 1`等价于`hard_copy`；目标与源是同一网络时什么也不做。
pub fn soft_copy<T, S>(target: &T, source: &S, tau: f32) -> Result<(), GanError>
where
    T: Module + ?Sized,
    S: Module + ?Sized,
{
    if !(tau > 0.0 && tau <= 1.0) {
        return Err(GanError::Configuration(format!(
            "软拷贝系数 tau 须在(0, 1]内，实际为{tau}"
        )));
    }
    let pairs = aligned_leaves(target, source)?;
    if !pairs.is_empty() && pairs.iter().all(|(t, s)| t.same_node(s)) {
        return Ok(());
    }
    if tau == 1.0 {
        return hard_copy(target, source);
    }
    for (t, s) in pairs {
        let blended = t.value() * (1.0 - tau) + s.value() * tau;
        t.set_value(&blended)?;
    }
    Ok(())
}
