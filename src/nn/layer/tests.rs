use super::*;
use crate::assert_err;
use crate::nn::{Graph, GraphError, Init};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn names(params: &[(String, Var)]) -> Vec<&str> {
    params.iter().map(|(n, _)| n.as_str()).collect()
}

#[test]
fn test_linear_forward_and_flatten() {
    let graph = Graph::new_with_seed(0);
    let fc = Linear::new(&graph, 4, 2, Init::Ones, "fc").unwrap();
    assert_eq!(names(&fc.named_parameters()), ["fc_W", "fc_b"]);

    // 4阶输入先展平为[B, 4]
    let x = graph.input(&Tensor::new(&[1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 1.0], &[2, 1, 2, 2]));
    let y = fc.forward(&x).unwrap();
    assert_eq!(y.value().to_vec(), vec![10.0, 10.0, 1.0, 1.0]);

    let wrong = graph.input(&Tensor::zeros(&[2, 3]));
    assert_err!(fc.forward(&wrong), GraphError::ShapeMismatch { .. });
}

#[test]
fn test_batch_norm_train_normalizes_per_channel() {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm::new(&graph, 2, true, "bn").unwrap();
    let x = Tensor::normal_with_rng(3.0, 2.0, &[4, 2, 3, 3], &mut StdRng::seed_from_u64(1));
    let y = bn.forward(&graph.input(&x)).unwrap().value();

    let mean = y.mean_axes_keepdims(&[0, 2, 3]);
    let var = (&y * &y).mean_axes_keepdims(&[0, 2, 3]);
    for (m, v) in mean.to_vec().into_iter().zip(var.to_vec()) {
        assert_abs_diff_eq!(m, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(v, 1.0, epsilon = 1e-3);
    }
}

#[test]
fn test_batch_norm_running_stats_update() {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm::new(&graph, 1, true, "bn").unwrap();
    // 批均值 2，有偏方差 1，无偏方差 4/3
    let x = graph.input(&Tensor::new(&[1.0, 3.0, 1.0, 3.0], &[4, 1]));
    bn.forward(&x).unwrap();

    let stats = bn.stats();
    assert_abs_diff_eq!(stats.mean.value().to_vec()[0], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(stats.var.value().to_vec()[0], 0.9 + 0.1 * 4.0 / 3.0, epsilon = 1e-6);
    assert_eq!(bn.named_statistics()[0].0, "bn");
}

#[test]
fn test_batch_norm_eval_uses_running_stats() {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm::new(&graph, 1, false, "bn").unwrap();
    assert_eq!(names(&bn.named_parameters()), ["bn_beta"]);
    bn.stats().mean.set_value(&Tensor::new(&[1.0], &[1])).unwrap();
    bn.stats().var.set_value(&Tensor::new(&[4.0], &[1])).unwrap();

    let x = graph.input(&Tensor::new(&[3.0, 5.0], &[2, 1]));
    let y = graph.no_grad_scope(|_| bn.forward(&x)).unwrap();
    let scale = 1.0 / (4.0f32 + 2e-5).sqrt();
    assert_abs_diff_eq!(y.value().to_vec()[0], 2.0 * scale, epsilon = 1e-6);
    assert_abs_diff_eq!(y.value().to_vec()[1], 4.0 * scale, epsilon = 1e-6);
    // eval 模式不改运行统计量
    assert_eq!(bn.stats().mean.value().to_vec(), vec![1.0]);
}

#[test]
fn test_batch_norm_rejects_bad_layout() {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm::new(&graph, 3, true, "bn").unwrap();
    let wrong_channels = graph.input(&Tensor::zeros(&[2, 4]));
    assert_err!(bn.forward(&wrong_channels), GraphError::ShapeMismatch { .. });
    let three_dims = graph.input(&Tensor::zeros(&[2, 3, 4]));
    assert_err!(bn.forward(&three_dims), GraphError::DimensionMismatch { .. });
}

#[test]
fn test_conv_layers_shapes() {
    let graph = Graph::new_with_seed(0);
    let init = Init::Normal { mean: 0.0, std: 0.02 };
    let x = graph.input(&Tensor::zeros(&[2, 3, 8, 8]));

    let down = Conv2d::new(&graph, 3, 6, 4, 2, 1, init.clone(), "c").unwrap();
    assert_eq!(down.forward(&x).unwrap().shape(), vec![2, 6, 4, 4]);
    let same = Conv2d::new(&graph, 3, 5, 3, 1, 1, init.clone(), "s").unwrap();
    assert_eq!(same.forward(&x).unwrap().shape(), vec![2, 5, 8, 8]);
    let up = Deconv2d::new(&graph, 3, 2, 4, 2, 1, init, "dc").unwrap();
    assert_eq!(up.forward(&x).unwrap().shape(), vec![2, 2, 16, 16]);
    assert_eq!(names(&up.named_parameters()), ["dc_K", "dc_b"]);
}

#[test]
fn test_res_blocks_resample_by_two() {
    let graph = Graph::new_with_seed(0);
    let init = Init::Normal { mean: 0.0, std: 0.02 };
    let x = graph.input(&Tensor::normal_with_rng(
        0.0,
        1.0,
        &[2, 4, 4, 4],
        &mut StdRng::seed_from_u64(2),
    ));

    let up = ResBlockUp::new(&graph, 4, 2, init.clone(), "up0").unwrap();
    let y = up.forward(&x).unwrap();
    assert_eq!(y.shape(), vec![2, 2, 8, 8]);
    assert_eq!(
        names(&up.named_parameters()),
        [
            "up0_bn0_gamma",
            "up0_bn0_beta",
            "up0_c0_K",
            "up0_c0_b",
            "up0_bn1_gamma",
            "up0_bn1_beta",
            "up0_c1_K",
            "up0_c1_b",
            "up0_cs_K",
            "up0_cs_b"
        ]
    );
    assert_eq!(up.named_statistics().len(), 2);

    let down = ResBlockDown::new(&graph, 2, 6, init, "down0").unwrap();
    assert_eq!(down.forward(&y).unwrap().shape(), vec![2, 6, 4, 4]);
}

#[test]
fn test_forward_sequence_chains_layers() {
    let graph = Graph::new_with_seed(0);
    let layers: Vec<LayerKind> = vec![
        Linear::new(&graph, 2, 8, Init::Ones, "l0").unwrap().into(),
        Reshape::new(&[2, 2, 2]).into(),
        Activation::LeakyRelu(0.2).into(),
        Activation::Tanh.into(),
    ];
    let x = graph.input(&Tensor::new(&[1.0, -2.0], &[1, 2]));
    let y = forward_sequence(&layers, &x).unwrap();
    assert_eq!(y.shape(), vec![1, 2, 2, 2]);
    // 1·1 + (−2)·1 = −1，leaky 后为 −0.2
    for v in y.value().to_vec() {
        assert_abs_diff_eq!(v, (-0.2f32).tanh(), epsilon = 1e-6);
    }
    let activation = Activation::Relu.forward(&x).unwrap();
    assert_eq!(activation.value().to_vec(), vec![1.0, 0.0]);
}
