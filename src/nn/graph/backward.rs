/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 反向传播（VJP）
 *
 * 每个节点的向量-雅可比积都用 Var 运算写成，因此：
 * - 不记录计算图时（create_graph = false），得到的梯度就是普通常量；
 * - 记录计算图时，梯度本身是一张新图，可以再次求导（double backward）。
 */

use super::error::GraphError;
use super::handle::Graph;
use crate::nn::NodeId;
use crate::nn::nodes::Op;
use crate::nn::var::Var;
use crate::nn::var_ops::{VarActivationOps, VarConvOps, VarMatrixOps, VarShapeOps};
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

impl Var {
    /// 反向传播：把标量`self`对所有需要梯度的叶子节点的梯度累加到各自的 grad 上
    ///
    /// # 返回值
    /// 返回 loss 的标量值
    pub fn backward(&self) -> Result<f32, GraphError> {
        let loss = self.item()?;
        if !self.requires_grad() {
            return Ok(loss);
        }
        let graph = self.get_graph();
        let leaf_grads = propagate(&graph, std::slice::from_ref(self), false, |var| {
            var.is_leaf() && var.requires_grad()
        })?;
        for (leaf, grad) in leaf_grads {
            leaf.accumulate_grad(&grad.value_ref());
        }
        Ok(loss)
    }
}

pub(super) fn grad(
    graph: &Graph,
    outputs: &[Var],
    inputs: &[Var],
    create_graph: bool,
) -> Result<Vec<Var>, GraphError> {
    let wanted: HashSet<NodeId> = inputs.iter().map(Var::node_id).collect();
    let found: HashMap<NodeId, Var> = propagate(graph, outputs, create_graph, |var| {
        wanted.contains(&var.node_id())
    })?
    .into_iter()
    .map(|(var, grad)| (var.node_id(), grad))
    .collect();
    Ok(inputs
        .iter()
        .map(|input| {
            found
                .get(&input.node_id())
                .cloned()
                .unwrap_or_else(|| graph.zeros(&input.shape()))
        })
        .collect())
}

/// 沿计算图反向传播，返回被`keep`选中的节点及其梯度
fn propagate(
    graph: &Graph,
    outputs: &[Var],
    create_graph: bool,
    keep: impl Fn(&Var) -> bool,
) -> Result<Vec<(Var, Var)>, GraphError> {
    graph.with_grad_enabled(create_graph, |graph| {
        let order = topological_order(outputs);
        let mut grads: HashMap<NodeId, Var> = HashMap::new();
        for output in outputs.iter().filter(|o| o.requires_grad()) {
            accumulate(&mut grads, output, graph.ones(&output.shape()))?;
        }

        let mut kept = Vec::new();
        for var in order.iter().rev() {
            let Some(grad) = grads.remove(&var.node_id()) else {
                continue;
            };
            for (parent, parent_grad) in vjp(var, &grad)? {
                if parent.requires_grad() {
                    accumulate(&mut grads, &parent, parent_grad)?;
                }
            }
            if keep(var) {
                kept.push((var.clone(), grad));
            }
        }
        Ok(kept)
    })
}

fn accumulate(grads: &mut HashMap<NodeId, Var>, var: &Var, grad: Var) -> Result<(), GraphError> {
    let summed = match grads.remove(&var.node_id()) {
        Some(existing) => existing.try_add(&grad)?,
        None => grad,
    };
    grads.insert(var.node_id(), summed);
    Ok(())
}

/// 深度优先后序遍历，父节点总排在子节点之前；只经过需要梯度的节点
fn topological_order(outputs: &[Var]) -> Vec<Var> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<(Var, bool)> = outputs
        .iter()
        .filter(|o| o.requires_grad())
        .map(|o| (o.clone(), false))
        .collect();
    while let Some((var, expanded)) = stack.pop() {
        if expanded {
            order.push(var);
            continue;
        }
        if !visited.insert(var.node_id()) {
            continue;
        }
        let parents = var
            .op()
            .parents()
            .into_iter()
            .filter(|p| p.requires_grad() && !visited.contains(&p.node_id()))
            .cloned()
            .collect::<Vec<_>>();
        stack.push((var, true));
        stack.extend(parents.into_iter().map(|p| (p, false)));
    }
    order
}

/// 节点`out`的向量-雅可比积：给定`out`的梯度`g`，求各父节点的梯度
fn vjp(out: &Var, g: &Var) -> Result<Vec<(Var, Var)>, GraphError> {
    let pairs = match out.op() {
        Op::Input | Op::Parameter => vec![],
        Op::Add(a, b) => vec![
            (a.clone(), g.sum_to(&a.shape())?),
            (b.clone(), g.sum_to(&b.shape())?),
        ],
        Op::Sub(a, b) => vec![
            (a.clone(), g.sum_to(&a.shape())?),
            (b.clone(), (-g).sum_to(&b.shape())?),
        ],
        Op::Mul(a, b) => vec![
            (a.clone(), g.try_mul(b)?.sum_to(&a.shape())?),
            (b.clone(), g.try_mul(a)?.sum_to(&b.shape())?),
        ],
        Op::Div(a, b) => vec![
            (a.clone(), g.try_div(b)?.sum_to(&a.shape())?),
            (
                b.clone(),
                (-g.try_mul(out)?.try_div(b)?).sum_to(&b.shape())?,
            ),
        ],
        Op::Neg(a) => vec![(a.clone(), -g)],
        Op::Scale(a, factor) => vec![(a.clone(), g.scale(*factor))],
        Op::AddScalar(a, _) => vec![(a.clone(), g.clone())],
        Op::Exp(a) => vec![(a.clone(), g.try_mul(out)?)],
        Op::Ln(a) => vec![(a.clone(), g.try_div(a)?)],
        Op::Sqrt(a) => vec![(a.clone(), g.try_div(out)?.scale(0.5))],
        Op::Tanh(a) => {
            let local = out.square().scale(-1.0).add_scalar(1.0);
            vec![(a.clone(), g.try_mul(&local)?)]
        }
        Op::Sigmoid(a) => {
            let local = out.try_mul(&out.scale(-1.0).add_scalar(1.0))?;
            vec![(a.clone(), g.try_mul(&local)?)]
        }
        Op::Softplus(a) => vec![(a.clone(), g.try_mul(&a.sigmoid())?)],
        Op::PiecewiseLinear(a, negative_slope) => {
            // 斜率在每段内为常数，因此掩码对输入的导数为0
            let mask: Tensor = a.value_ref().positive_mask(*negative_slope);
            let mask = g.get_graph().constant(&mask);
            vec![(a.clone(), g.try_mul(&mask)?)]
        }
        Op::MatMul(a, b) => vec![
            (a.clone(), g.matmul(&b.transpose()?)?),
            (b.clone(), a.transpose()?.matmul(g)?),
        ],
        Op::Reshape(a) => vec![(a.clone(), g.reshape(&a.shape())?)],
        Op::Permute(a, axes) => {
            let mut inverse = vec![0; axes.len()];
            for (i, &axis) in axes.iter().enumerate() {
                inverse[axis] = i;
            }
            vec![(a.clone(), g.permute(&inverse)?)]
        }
        Op::BroadcastTo(a) => vec![(a.clone(), g.sum_to(&a.shape())?)],
        Op::SumTo(a) => vec![(a.clone(), g.broadcast_to(&a.shape())?)],
        Op::Im2Col(a, geometry) => vec![(a.clone(), g.col2im(geometry)?)],
        Op::Col2Im(a, geometry) => vec![(a.clone(), g.im2col(geometry)?)],
    };
    Ok(pairs)
}
