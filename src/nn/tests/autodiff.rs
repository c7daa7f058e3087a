use super::{check_grad, weighted_sum};
use crate::assert_err;
use crate::nn::{Graph, GraphError, Var, VarActivationOps, VarMatrixOps, VarShapeOps};
use crate::tensor::Tensor;

fn mixed() -> Tensor {
    Tensor::new(&[-1.2, -0.4, 0.3, 0.9, 1.5, -2.0], &[2, 3])
}

fn positive() -> Tensor {
    Tensor::new(&[0.5, 1.0, 1.5, 2.0, 2.5, 3.0], &[2, 3])
}

#[test]
fn test_elementwise_activation_grads() {
    check_grad(|x| weighted_sum(&x.tanh()), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.sigmoid()), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.softplus()), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.exp()), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.square()), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.leaky_relu(0.2)), &mixed(), 1e-2);
    check_grad(|x| weighted_sum(&x.relu()), &mixed(), 1e-2);
}

#[test]
fn test_log_and_sqrt_grads() {
    check_grad(|x| weighted_sum(&x.ln()), &positive(), 1e-2);
    check_grad(|x| weighted_sum(&x.sqrt()), &positive(), 1e-2);
}

#[test]
fn test_binary_grads_with_broadcast() {
    let row = Tensor::new(&[0.7, -1.1, 2.0], &[1, 3]);
    let constant = |x: &Var| x.get_graph().constant(&positive());
    check_grad(|x| weighted_sum(&x.try_add(&constant(x)).unwrap()), &row, 1e-2);
    check_grad(|x| weighted_sum(&x.try_sub(&constant(x)).unwrap()), &row, 1e-2);
    check_grad(|x| weighted_sum(&x.try_mul(&constant(x)).unwrap()), &row, 1e-2);
    check_grad(|x| weighted_sum(&x.try_div(&constant(x)).unwrap()), &row, 1e-2);
    // 除数一侧
    check_grad(|x| weighted_sum(&constant(x).try_div(x).unwrap()), &positive(), 1e-2);
}

#[test]
fn test_matmul_and_shape_grads() {
    let rhs = Tensor::new(&[0.2, -0.5, 1.0, 0.4, -0.3, 0.8], &[3, 2]);
    check_grad(
        |x| weighted_sum(&x.matmul(&x.get_graph().constant(&rhs)).unwrap()),
        &mixed(),
        1e-2,
    );
    check_grad(
        |x| weighted_sum(&x.permute(&[1, 0]).unwrap().reshape(&[6]).unwrap()),
        &mixed(),
        1e-2,
    );
    check_grad(
        |x| weighted_sum(&x.mean_axes_keepdims(&[1]).unwrap().exp()),
        &mixed(),
        1e-2,
    );
}

#[test]
fn test_upsample_grad_sums_over_copies() {
    let x = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]);
    check_grad(|v| weighted_sum(&v.upsample_nearest2d(2).unwrap()), &x, 1e-2);

    let graph = Graph::new_with_seed(0);
    let v = graph.input_with_grad(&x);
    let up = v.upsample_nearest2d(2).unwrap();
    assert_eq!(up.shape(), vec![1, 1, 4, 4]);
    let g = graph.grad(&[up.sum()], &[v], false).unwrap();
    assert_eq!(g[0].value().to_vec(), vec![4.0; 4]);
}

#[test]
fn test_normalization_chain_grad() {
    // 与 BatchNorm 训练模式相同的运算组合
    check_grad(
        |x| {
            let mean = x.mean_axes_keepdims(&[0]).unwrap();
            let centered = x.try_sub(&mean).unwrap();
            let var = centered.square().mean_axes_keepdims(&[0]).unwrap();
            weighted_sum(&centered.try_div(&var.add_scalar(1e-2).sqrt()).unwrap())
        },
        &Tensor::new(&[0.1, 1.3, -0.7, 2.2, 0.4, -1.5, 0.9, 0.0, 1.1], &[3, 3]),
        2e-2,
    );
}

#[test]
fn test_backward_accumulates_into_leaves() {
    let graph = Graph::new_with_seed(0);
    let w = graph.input_with_grad(&Tensor::new(&[1.0, -2.0], &[2]));
    let loss = w.square().sum();
    assert_eq!(loss.backward().unwrap(), 5.0);
    assert_eq!(w.grad().unwrap().to_vec(), vec![2.0, -4.0]);
    // 再次反向传播时累加
    loss.backward().unwrap();
    assert_eq!(w.grad().unwrap().to_vec(), vec![4.0, -8.0]);
    w.clear_grad();
    assert!(w.grad().is_none());
}

#[test]
fn test_without_grad_records_nothing() {
    let graph = Graph::new_with_seed(0);
    let w = graph.input_with_grad(&Tensor::new(&[1.0, 2.0], &[2]));
    let y = graph.without_grad(|_| w.square().sum());
    assert!(!y.requires_grad());
    assert!(y.is_leaf());
    assert_eq!(y.backward().unwrap(), 5.0);
    assert!(w.grad().is_none());
}

#[test]
fn test_unrelated_input_gets_zero_grad() {
    let graph = Graph::new_with_seed(0);
    let a = graph.input_with_grad(&Tensor::new(&[1.0, 2.0], &[2]));
    let b = graph.input_with_grad(&Tensor::new(&[3.0], &[1]));
    let g = graph.grad(&[a.sum()], &[a.clone(), b], false).unwrap();
    assert_eq!(g[0].value().to_vec(), vec![1.0, 1.0]);
    assert_eq!(g[1].value().to_vec(), vec![0.0]);
}

#[test]
fn test_graph_mismatch_and_shape_errors() {
    let g1 = Graph::new_with_seed(0);
    let g2 = Graph::new_with_seed(1);
    let a = g1.input_with_grad(&Tensor::new(&[1.0], &[1]));
    let b = g2.input_with_grad(&Tensor::new(&[1.0], &[1]));
    assert_err!(g1.grad(&[a.sum()], &[b], false), GraphError::GraphMismatch);

    let x = g1.input(&Tensor::zeros(&[2, 3]));
    let y = g1.input(&Tensor::zeros(&[4, 2]));
    assert_err!(x.matmul(&y), GraphError::ShapeMismatch { .. });
    assert_err!(x.try_add(&y), GraphError::ShapeMismatch { .. });
    assert_err!(x.reshape(&[5]), GraphError::ShapeMismatch { .. });
}
