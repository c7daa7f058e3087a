mod autodiff;
mod optimizer;

use crate::nn::{Graph, Var, VarShapeOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// 乘上固定权重再求和，避免对称的输出让梯度误差相互抵消
pub(super) fn weighted_sum(y: &Var) -> Var {
    let shape = y.shape();
    let count = shape.iter().product::<usize>();
    let weights = (0..count)
        .map(|i| 0.3 + 0.1 * (i % 7) as f32)
        .collect::<Vec<_>>();
    let w = y.get_graph().constant(&Tensor::new(&weights, &shape));
    y.try_mul(&w).unwrap().sum()
}

/// 中心差分的数值梯度，`f`须返回标量
pub(super) fn numeric_grad(f: &impl Fn(&Var) -> Var, x: &Tensor) -> Tensor {
    const H: f32 = 1e-2;
    let graph = Graph::new_with_seed(0);
    let base = x.to_vec();
    let mut grad = vec![0.0; base.len()];
    for (i, g) in grad.iter_mut().enumerate() {
        let mut plus = base.clone();
        plus[i] += H;
        let mut minus = base.clone();
        minus[i] -= H;
        let f_plus = f(&graph.input(&Tensor::new(&plus, x.shape()))).item().unwrap();
        let f_minus = f(&graph.input(&Tensor::new(&minus, x.shape()))).item().unwrap();
        *g = (f_plus - f_minus) / (2.0 * H);
    }
    Tensor::new(&grad, x.shape())
}

/// 自动微分得到的梯度
pub(super) fn autodiff_grad(f: &impl Fn(&Var) -> Var, x: &Tensor) -> Tensor {
    let graph = Graph::new_with_seed(0);
    let v = graph.input_with_grad(x);
    let y = f(&v);
    graph.grad(&[y], &[v], false).unwrap()[0].value()
}

/// 自动微分与数值梯度逐元素比较
pub(super) fn check_grad(f: impl Fn(&Var) -> Var, x: &Tensor, epsilon: f32) {
    let expected = numeric_grad(&f, x);
    let got = autodiff_grad(&f, x);
    assert_eq!(got.shape(), expected.shape());
    for (g, e) in got.to_vec().into_iter().zip(expected.to_vec()) {
        assert_abs_diff_eq!(g, e, epsilon = epsilon);
    }
}

pub(super) fn assert_tensor_eq(a: &Tensor, b: &Tensor, epsilon: f32) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.to_vec().into_iter().zip(b.to_vec()) {
        assert_abs_diff_eq!(x, y, epsilon = epsilon);
    }
}
