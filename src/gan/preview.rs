/*
 * @Author       : 老董
 * @Date         : 2026-03-12
 * @Description  : 生成图像预览
 *
 * 每次都用固定种子（0）采样隐变量，便于逐次对比；生成在 eval 模式且不记录计算图下进行。
 */

use crate::gan::GanError;
use crate::gan::arch::Generator;
use crate::nn::Graph;
use crate::vision::Vision;
use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PREVIEW_SEED: u64 = 0;
pub const LATEST_FILE: &str = "image_latest.png";

/// 用生成器生成`rows * cols`张图像并拼成网格
pub fn render_grid(
    graph: &Graph,
    generator: &Generator,
    rows: usize,
    cols: usize,
) -> Result<RgbImage, GanError> {
    let mut rng = StdRng::seed_from_u64(PREVIEW_SEED);
    let z = generator.sample_latent(rows * cols, &mut rng);
    let x = graph.no_grad_scope(|g| generator.generate(&g.input(&z)))?;
    Ok(Vision::tile_grid(&Vision::to_pixels(&x.value()), rows, cols)?)
}

/// 生成预览并保存为`{dir}/image_latest.png`与`{dir}/image{it:08}.png`
pub fn write_preview(
    graph: &Graph,
    generator: &Generator,
    rows: usize,
    cols: usize,
    dir: impl AsRef<Path>,
    iteration: u64,
) -> Result<[PathBuf; 2], GanError> {
    let dir = dir.as_ref();
    let grid = render_grid(graph, generator, rows, cols)?;
    let latest = dir.join(LATEST_FILE);
    let numbered = dir.join(format!("image{iteration:08}.png"));
    Vision::save_image(&grid, &latest)?;
    Vision::save_image(&grid, &numbered)?;
    info!("第{iteration}次迭代：预览已保存到{}", numbered.display());
    Ok([latest, numbered])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gan::arch::{Architecture, GeneratorConfig};
    use crate::nn::Module;

    fn tiny_generator(graph: &Graph) -> Generator {
        let config = GeneratorConfig {
            ch: 8,
            latent_dim: 4,
            ..GeneratorConfig::new(Architecture::Dcgan64)
        };
        Generator::new(graph, config).unwrap()
    }

    #[test]
    fn test_grid_is_deterministic_and_leaves_state_alone() {
        let graph = Graph::new_with_seed(0);
        let generator = tiny_generator(&graph);
        let stats_before = generator
            .named_statistics()
            .iter()
            .map(|(_, s)| s.mean.value())
            .collect::<Vec<_>>();

        let first = render_grid(&graph, &generator, 2, 3).unwrap();
        let second = render_grid(&graph, &generator, 2, 3).unwrap();
        assert_eq!(first.dimensions(), (3 * 64, 2 * 64));
        assert_eq!(first, second);

        // eval 模式下运行统计量不变，且之后仍处于训练模式
        let stats_after = generator
            .named_statistics()
            .iter()
            .map(|(_, s)| s.mean.value())
            .collect::<Vec<_>>();
        assert_eq!(stats_before, stats_after);
        assert!(graph.is_train());
        assert!(generator.parameters().iter().all(|p| p.grad().is_none()));
    }

    #[test]
    fn test_write_preview_names() {
        let dir = tempfile::tempdir().unwrap();
        let graph = Graph::new_with_seed(0);
        let generator = tiny_generator(&graph);
        let [latest, numbered] =
            write_preview(&graph, &generator, 2, 2, dir.path().join("preview"), 500).unwrap();
        assert!(latest.ends_with("preview/image_latest.png"));
        assert!(numbered.ends_with("preview/image00000500.png"));
        assert_eq!(
            image::open(&latest).unwrap().to_rgb8(),
            image::open(&numbered).unwrap().to_rgb8()
        );
    }
}
