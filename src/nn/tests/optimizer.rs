use super::assert_tensor_eq;
use crate::assert_err;
use crate::nn::{Adam, Graph, GraphError, Init, Optimizer, SGD, Var, VarActivationOps, VarShapeOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

fn param(graph: &Graph, values: &[f32], name: &str) -> Var {
    let p = graph
        .parameter(&[values.len()], Init::Zeros, name)
        .unwrap();
    p.set_value(&Tensor::new(values, &[values.len()])).unwrap();
    p
}

#[test]
fn test_sgd_step() {
    let graph = Graph::new_with_seed(0);
    let p = param(&graph, &[1.0, -2.0], "p");
    let mut sgd = SGD::new(vec![("p".to_string(), p.clone())], 0.1).unwrap();
    // loss = Σp², ∇ = 2p
    let loss = sgd.minimize(&p.square().sum()).unwrap();
    assert_eq!(loss, 5.0);
    assert_tensor_eq(&p.value(), &Tensor::new(&[0.8, -1.6], &[2]), 1e-6);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    let graph = Graph::new_with_seed(0);
    let p = param(&graph, &[1.0, -2.0, 3.0], "p");
    let mut adam = Adam::new(vec![("p".to_string(), p.clone())], 0.1, 0.5, 0.999).unwrap();
    let weights = graph.constant(&Tensor::new(&[2.0, 0.5, -4.0], &[3]));
    adam.minimize(&p.try_mul(&weights).unwrap().sum()).unwrap();

    // 偏差修正后第一步的位移约为 lr·sign(g)
    assert_tensor_eq(&p.value(), &Tensor::new(&[0.9, -2.1, 3.1], &[3]), 1e-5);
    assert_eq!(adam.steps(), 1);
}

#[test]
fn test_adam_skips_params_without_grad() {
    let graph = Graph::new_with_seed(0);
    let used = param(&graph, &[1.0], "used");
    let unused = param(&graph, &[5.0], "unused");
    let mut adam = Adam::new(
        vec![("used".to_string(), used.clone()), ("unused".to_string(), unused.clone())],
        0.01,
        0.9,
        0.999,
    )
    .unwrap();
    adam.minimize(&used.square().sum()).unwrap();
    assert_eq!(unused.value().to_vec(), vec![5.0]);
    assert!(adam.state().m.contains_key("used"));
    assert!(!adam.state().m.contains_key("unused"));
    assert_eq!(adam.gradients().len(), 1);
}

#[test]
fn test_adam_minimizes_quadratic() {
    let graph = Graph::new_with_seed(0);
    let p = param(&graph, &[3.0, -1.0], "p");
    let mut adam = Adam::new(vec![("p".to_string(), p.clone())], 0.05, 0.9, 0.999).unwrap();
    for _ in 0..400 {
        adam.minimize(&p.square().sum()).unwrap();
    }
    assert!(p.value().max_abs() < 0.1);
}

#[test]
fn test_adam_learning_rate_state_and_reset() {
    let graph = Graph::new_with_seed(0);
    let p = param(&graph, &[1.0], "p");
    let mut adam = Adam::new(vec![("p".to_string(), p.clone())], 2e-4, 0.5, 0.999).unwrap();
    adam.set_learning_rate(1e-4);
    assert_abs_diff_eq!(adam.learning_rate(), 1e-4);
    adam.minimize(&p.square().sum()).unwrap();
    let state = adam.state();
    assert_eq!(state.t, 1);
    assert_eq!(state.lr, 1e-4);

    adam.reset();
    assert_eq!(adam.steps(), 0);
    assert!(adam.state().m.is_empty());

    adam.load_state(state.clone()).unwrap();
    assert_eq!(adam.state(), state);
}

#[test]
fn test_adam_rejects_bad_state_and_duplicate_names() {
    let graph = Graph::new_with_seed(0);
    let p = param(&graph, &[1.0, 2.0], "p");
    let q = param(&graph, &[1.0], "q");
    assert_err!(
        Adam::new(vec![("p".to_string(), p.clone()), ("p".to_string(), q.clone())], 0.1, 0.9, 0.999),
        GraphError::DuplicateName(name) if name == "p"
    );

    let mut adam = Adam::new(vec![("p".to_string(), p.clone())], 0.1, 0.9, 0.999).unwrap();
    adam.minimize(&p.square().sum()).unwrap();
    let mut state = adam.state();

    let mut other = Adam::new(vec![("q".to_string(), q)], 0.1, 0.9, 0.999).unwrap();
    assert_err!(other.load_state(state.clone()), GraphError::InvalidOperation(_));

    state.m.insert("p".to_string(), Tensor::zeros(&[3]));
    assert_err!(adam.load_state(state), GraphError::ShapeMismatch { .. });
}
