/*
 * @Author       : 老董
 * @Date         : 2026-03-13
 * @Description  : DRAGAN 训练入口
 *
 * 配置的优先级：命令行参数 > `--config`指定的 JSON 文件 > 默认值。
 */

use clap::Parser;
use only_gan::gan::{TrainConfig, Trainer};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error};

#[derive(Parser)]
#[command(name = "dragan")]
#[command(about = "用 DRAGAN 梯度惩罚训练 DCGAN/ResNet 生成对抗网络")]
#[command(version)]
struct Cli {
    /// JSON 配置文件，缺省字段取默认值
    #[arg(long)]
    config: Option<PathBuf>,

    /// 网络结构：dcgan64、dcgan128、resnet128、resnet256
    #[arg(long)]
    arch: Option<String>,

    #[arg(long)]
    image_size: Option<usize>,

    /// 训练数据（npz，数组名为 size_{image_size}）
    #[arg(long)]
    npz_path: Option<PathBuf>,

    /// 输出目录
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    max_iter: Option<u64>,

    #[arg(long)]
    adam_alpha: Option<f32>,

    #[arg(long)]
    adam_beta1: Option<f32>,

    #[arg(long)]
    adam_beta2: Option<f32>,

    /// 梯度惩罚系数
    #[arg(long)]
    lambda_gp: Option<f32>,

    /// 平滑生成器的保留系数
    #[arg(long)]
    smoothing: Option<f32>,

    /// 学习率退火系数，0 表示不退火
    #[arg(long)]
    learning_rate_anneal: Option<f32>,

    #[arg(long)]
    learning_rate_anneal_trigger: Option<u64>,

    #[arg(long)]
    learning_rate_anneal_interval: Option<u64>,

    #[arg(long)]
    snapshot_interval: Option<u64>,

    #[arg(long)]
    evaluation_sample_interval: Option<u64>,

    #[arg(long)]
    display_interval: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// 网络宽度，缺省时取该结构的默认值
    #[arg(long)]
    ch: Option<usize>,

    #[arg(long)]
    latent_dim: Option<usize>,

    /// 隐变量分布：normal、uniform
    #[arg(long)]
    z_distribution: Option<String>,

    /// 日志级别：error、warn、info、debug、trace
    #[arg(long, default_value = "info")]
    log_level: Level,
}

macro_rules! override_fields {
    ($cli:expr, $config:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $cli.$field {
                $config.$field = value;
            }
        )+
    };
}

impl Cli {
    fn into_config(self) -> Result<TrainConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };
        override_fields!(
            self,
            config,
            arch,
            image_size,
            npz_path,
            out,
            batch_size,
            max_iter,
            adam_alpha,
            adam_beta1,
            adam_beta2,
            lambda_gp,
            smoothing,
            learning_rate_anneal,
            learning_rate_anneal_trigger,
            learning_rate_anneal_interval,
            snapshot_interval,
            evaluation_sample_interval,
            display_interval,
            seed,
            latent_dim,
            z_distribution,
        );
        if self.ch.is_some() {
            config.ch = self.ch;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.into_config()?;
    Trainer::new(config)?.run()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  原因：{cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
