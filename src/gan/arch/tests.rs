use super::*;
use crate::assert_err;
use crate::nn::Graph;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn tiny_generator(graph: &Graph, arch: Architecture) -> Generator {
    let config = GeneratorConfig {
        ch: arch.deepest_divisor(),
        latent_dim: 4,
        ..GeneratorConfig::new(arch)
    };
    Generator::new(graph, config).unwrap()
}

fn tiny_discriminator(graph: &Graph, arch: Architecture) -> Discriminator {
    let config = DiscriminatorConfig {
        ch: arch.deepest_divisor(),
        ..DiscriminatorConfig::new(arch)
    };
    Discriminator::new(graph, config).unwrap()
}

#[test]
fn test_every_architecture_produces_images_and_scores() {
    let mut rng = StdRng::seed_from_u64(0);
    for arch in Architecture::ALL {
        let graph = Graph::new_with_seed(1);
        let generator = tiny_generator(&graph, arch);
        let discriminator = tiny_discriminator(&graph, arch);
        let side = arch.image_size();

        let z = graph.input(&generator.sample_latent(2, &mut rng));
        let images = generator.generate(&z).unwrap();
        assert_eq!(images.shape(), vec![2, 3, side, side], "{arch}");
        assert!(images.value().max_abs() <= 1.0, "{arch}");

        let scores = discriminator.score(&images).unwrap();
        assert_eq!(scores.shape(), vec![2, 1], "{arch}");
        assert!(scores.value().is_all_finite(), "{arch}");
    }
}

#[test]
fn test_single_sample_batch() {
    let graph = Graph::new_with_seed(2);
    let generator = tiny_generator(&graph, Architecture::Dcgan64);
    let z = graph.input(&generator.sample_latent(1, &mut StdRng::seed_from_u64(0)));
    assert_eq!(generator.generate(&z).unwrap().shape(), vec![1, 3, 64, 64]);
}

#[test]
fn test_parameter_catalogue() {
    let graph = Graph::new_with_seed(3);
    let generator = tiny_generator(&graph, Architecture::Dcgan64);
    let names = generator
        .named_parameters()
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    assert_eq!(&names[..4], &["l0_W", "l0_b", "bn0_gamma", "bn0_beta"]);
    assert!(names.contains(&"dc4_K".to_string()));
    assert_eq!(generator.named_statistics().len(), 4);

    // 同配置构建的两个网络，参数名与形状一一对应
    let twin = tiny_generator(&graph, Architecture::Dcgan64);
    for ((a_name, a), (b_name, b)) in generator.named_parameters().iter().zip(twin.named_parameters().iter()) {
        assert_eq!(a_name, b_name);
        assert_eq!(a.shape(), b.shape());
    }

    let discriminator = tiny_discriminator(&graph, Architecture::Dcgan64);
    // 判别器的 BN 没有 gamma
    assert!(
        discriminator
            .named_parameters()
            .iter()
            .all(|(name, _)| !name.ends_with("_gamma"))
    );
    assert_eq!(discriminator.named_statistics().len(), 6);
}

#[test]
fn test_generator_without_bn() {
    let graph = Graph::new_with_seed(4);
    let config = GeneratorConfig {
        ch: 8,
        latent_dim: 4,
        use_bn: false,
        ..GeneratorConfig::new(Architecture::Dcgan64)
    };
    let generator = Generator::new(&graph, config).unwrap();
    assert!(generator.named_statistics().is_empty());
}

#[test]
fn test_uniform_latent_range() {
    let graph = Graph::new_with_seed(5);
    let config = GeneratorConfig {
        ch: 8,
        z_distribution: ZDistribution::Uniform,
        ..GeneratorConfig::new(Architecture::Dcgan64)
    };
    let generator = Generator::new(&graph, config).unwrap();
    let z = generator.sample_latent(16, &mut StdRng::seed_from_u64(0));
    assert_eq!(z.shape(), &[16, 128, 1, 1]);
    assert!(z.max_abs() <= 1.0);
}

#[test]
fn test_invalid_configurations() {
    let graph = Graph::new_with_seed(6);

    let wrong_size = GeneratorConfig {
        image_size: 64,
        ..GeneratorConfig::new(Architecture::Resnet128)
    };
    assert_err!(Generator::new(&graph, wrong_size).map(|_| ()), GanError::Configuration(_));

    let bad_ch = DiscriminatorConfig {
        ch: 20,
        ..DiscriminatorConfig::new(Architecture::Dcgan128)
    };
    assert_err!(Discriminator::new(&graph, bad_ch).map(|_| ()), GanError::Configuration(_));

    let no_latent = GeneratorConfig {
        latent_dim: 0,
        ..GeneratorConfig::new(Architecture::Dcgan64)
    };
    assert_err!(no_latent.validate(), GanError::Configuration(_));

    let no_output = DiscriminatorConfig {
        output_dim: 0,
        ..DiscriminatorConfig::new(Architecture::Dcgan64)
    };
    assert_err!(no_output.validate(), GanError::Configuration(_));
}

#[test]
fn test_names_parse() {
    assert_eq!("resnet256".parse::<Architecture>().unwrap(), Architecture::Resnet256);
    assert_err!(Architecture::from_name("vgg"), GanError::Configuration(_));
    assert_eq!("uniform".parse::<ZDistribution>().unwrap(), ZDistribution::Uniform);
    assert_err!(
        "gamma".parse::<ZDistribution>(),
        GanError::UnsupportedDistribution(tag) if tag == "gamma"
    );
}

#[test]
fn test_wrong_input_shape() {
    let graph = Graph::new_with_seed(7);
    let discriminator = tiny_discriminator(&graph, Architecture::Dcgan64);
    let x = graph.input(&crate::tensor::Tensor::zeros(&[2, 3, 32, 32]));
    assert_err!(discriminator.score(&x), GraphError::ShapeMismatch { .. });
}
