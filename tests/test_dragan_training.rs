/*
 * @Author       : 老董
 * @Date         : 2026-03-14
 * @Description  : 端到端训练：按配置训练几次迭代，检查日志、预览与快照，并用快照恢复网络
 */

use only_gan::data::{BatchSource, ImageDataset};
use only_gan::gan::config::{COMMAND_FILE, CONFIG_FILE};
use only_gan::gan::snapshot::{load_network, load_optimizer};
use only_gan::gan::trainer::{LOG_FILE, PREVIEW_DIR, SMOOTHED_PREVIEW_DIR};
use only_gan::gan::{Generator, TrainConfig, Trainer};
use only_gan::nn::{Adam, Graph, Module};
use only_gan::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

fn tiny_config(out: &Path) -> TrainConfig {
    TrainConfig {
        ch: Some(8),
        latent_dim: 4,
        batch_size: 2,
        max_iter: 5,
        display_interval: 1,
        evaluation_sample_interval: 5,
        snapshot_interval: 5,
        out: out.to_path_buf(),
        seed: 3,
        ..TrainConfig::default()
    }
}

fn random_dataset(count: usize) -> ImageDataset {
    let images = Tensor::uniform_with_rng(-1.0, 1.0, &[count, 3, 64, 64], &mut StdRng::seed_from_u64(1));
    ImageDataset::from_tensor(images).unwrap()
}

fn leaf_values<M: Module>(net: &M) -> Vec<Vec<f32>> {
    let mut values = net
        .named_parameters()
        .into_iter()
        .map(|(_, p)| p.value().to_vec())
        .collect::<Vec<_>>();
    for (_, stats) in net.named_statistics() {
        values.push(stats.mean.value().to_vec());
        values.push(stats.var.value().to_vec());
    }
    values
}

#[test]
fn test_training_writes_logs_previews_and_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result");
    let mut trainer = Trainer::with_dataset(tiny_config(&out), random_dataset(5)).unwrap();
    trainer.run().unwrap();

    let updater = trainer.updater();
    assert_eq!(updater.iteration(), 5);
    // 5 张图、每批 2 张：第 3 批跨过第一轮的末尾
    assert!(updater.source().epoch() >= 1);

    // 配置记录
    let recorded = TrainConfig::from_json_file(out.join(CONFIG_FILE)).unwrap();
    assert_eq!(&recorded, trainer.config());
    assert!(out.join(COMMAND_FILE).is_file());

    // 日志：每 5 次迭代一条
    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(LOG_FILE)).unwrap()).unwrap();
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["iteration"], 5);
    for key in ["gen/loss_adv", "dis/loss_adv", "dis/loss_gp"] {
        let value = entries[0][key].as_f64().unwrap();
        assert!(value.is_finite(), "{key}={value}");
    }
    assert_eq!(trainer.log_entries().len(), 1);

    // 预览
    for (sub, grid) in [(PREVIEW_DIR, 5u32), (SMOOTHED_PREVIEW_DIR, 4u32)] {
        let latest = image::open(out.join(sub).join("image_latest.png")).unwrap().to_rgb8();
        assert_eq!(latest.dimensions(), (grid * 64, grid * 64));
        assert!(out.join(sub).join("image00000005.png").is_file());
    }

    // 快照
    for name in [
        "Generator_5.npz",
        "Discriminator_5.npz",
        "SmoothedGenerator_5.npz",
        "opt_gen_5.bin",
        "opt_dis_5.bin",
    ] {
        assert!(out.join(name).is_file(), "缺少{name}");
    }
}

#[test]
fn test_snapshot_restores_smoothed_generator_and_optimizer() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("result");
    let config = tiny_config(&out);
    let mut trainer = Trainer::with_dataset(config.clone(), random_dataset(4)).unwrap();
    trainer.run().unwrap();
    let updater = trainer.updater();

    let graph = Graph::new_with_seed(99);
    let restored = Generator::new(&graph, config.generator_config().unwrap()).unwrap();
    assert_ne!(leaf_values(&restored), leaf_values(updater.smoothed_generator()));
    load_network(out.join("SmoothedGenerator_5.npz"), &restored).unwrap();
    assert_eq!(leaf_values(&restored), leaf_values(updater.smoothed_generator()));

    let mut opt = Adam::new(restored.named_parameters(), 1.0, 0.5, 0.999).unwrap();
    load_optimizer(out.join("opt_gen_5.bin"), &mut opt).unwrap();
    assert_eq!(opt.state(), updater.opt_gen().state());
    assert_eq!(opt.steps(), 5);
}

#[test]
fn test_same_seed_gives_same_training() {
    let dir = tempfile::tempdir().unwrap();
    let run = |name: &str| {
        let mut config = tiny_config(&dir.path().join(name));
        config.max_iter = 2;
        let mut trainer = Trainer::with_dataset(config, random_dataset(4)).unwrap();
        trainer.run().unwrap();
        leaf_values(trainer.updater().generator())
    };
    assert_eq!(run("a"), run("b"));
}

#[test]
fn test_mismatched_dataset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let images = Tensor::zeros(&[2, 3, 32, 32]);
    let result = Trainer::with_dataset(
        tiny_config(&dir.path().join("result")),
        ImageDataset::from_tensor(images).unwrap(),
    );
    assert!(matches!(result, Err(only_gan::gan::GanError::Configuration(_))));
}
