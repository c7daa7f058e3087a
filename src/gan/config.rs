/*
 * @Author       : 老董
 * @Date         : 2026-03-12
 * @Description  : 训练配置
 *
 * 默认值即命令行参数的默认值；可从 JSON 文件读入（缺省字段取默认值），
 * 再由命令行覆盖，最终记录到输出目录的 config.json 与 command.txt。
 */

use crate::gan::GanError;
use crate::gan::arch::{Architecture, DiscriminatorConfig, GeneratorConfig, ZDistribution};
use crate::gan::schedule::AnnealSchedule;
use crate::gan::updater::UpdaterConfig;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const COMMAND_FILE: &str = "command.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub arch: String,
    pub image_size: usize,
    pub batch_size: usize,
    pub adam_alpha: f32,
    pub adam_beta1: f32,
    pub adam_beta2: f32,
    pub max_iter: u64,
    pub lambda_gp: f32,
    pub smoothing: f32,
    pub learning_rate_anneal: f32,
    pub learning_rate_anneal_trigger: u64,
    pub learning_rate_anneal_interval: u64,
    pub npz_path: PathBuf,
    pub out: PathBuf,
    pub snapshot_interval: u64,
    pub evaluation_sample_interval: u64,
    pub display_interval: u64,
    pub seed: u64,
    /// 为空时取该结构的默认通道数
    pub ch: Option<usize>,
    pub latent_dim: usize,
    pub z_distribution: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            arch: Architecture::Dcgan64.name().to_string(),
            image_size: 64,
            batch_size: 64,
            adam_alpha: 2e-4,
            adam_beta1: 0.5,
            adam_beta2: 0.999,
            max_iter: 100_000,
            lambda_gp: 1.0,
            smoothing: 0.999,
            learning_rate_anneal: 0.0,
            learning_rate_anneal_trigger: 20_000,
            learning_rate_anneal_interval: 10_000,
            npz_path: PathBuf::new(),
            out: PathBuf::from("result"),
            snapshot_interval: 10_000,
            evaluation_sample_interval: 500,
            display_interval: 100,
            seed: 0,
            ch: None,
            latent_dim: 128,
            z_distribution: "normal".to_string(),
        }
    }
}

impl TrainConfig {
    /// 从 JSON 文件读取，缺省字段取默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GanError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn architecture(&self) -> Result<Architecture, GanError> {
        Architecture::from_name(&self.arch)
    }

    pub fn z_distribution(&self) -> Result<ZDistribution, GanError> {
        self.z_distribution.parse()
    }

    pub fn generator_config(&self) -> Result<GeneratorConfig, GanError> {
        let arch = self.architecture()?;
        Ok(GeneratorConfig {
            image_size: self.image_size,
            latent_dim: self.latent_dim,
            ch: self.ch.unwrap_or(arch.default_ch()),
            z_distribution: self.z_distribution()?,
            ..GeneratorConfig::new(arch)
        })
    }

    pub fn discriminator_config(&self) -> Result<DiscriminatorConfig, GanError> {
        let arch = self.architecture()?;
        Ok(DiscriminatorConfig {
            image_size: self.image_size,
            ch: self.ch.unwrap_or(arch.default_ch()),
            ..DiscriminatorConfig::new(arch)
        })
    }

    pub const fn schedule(&self) -> AnnealSchedule {
        AnnealSchedule {
            base: self.adam_alpha,
            rate: self.learning_rate_anneal,
            trigger: self.learning_rate_anneal_trigger,
            interval: self.learning_rate_anneal_interval,
        }
    }

    pub const fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig {
            batch_size: self.batch_size,
            lambda_gp: self.lambda_gp,
            smoothing: self.smoothing,
            schedule: self.schedule(),
        }
    }

    /// 检查所有取值范围以及结构与图像尺寸的搭配
    pub fn validate(&self) -> Result<(), GanError> {
        self.generator_config()?.validate()?;
        self.discriminator_config()?.validate()?;
        self.updater_config().validate()?;
        for (name, beta) in [("adam_beta1", self.adam_beta1), ("adam_beta2", self.adam_beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(GanError::Configuration(format!(
                    "{name} 须在[0, 1)内，实际为{beta}"
                )));
            }
        }
        for (name, interval) in [
            ("snapshot_interval", self.snapshot_interval),
            ("evaluation_sample_interval", self.evaluation_sample_interval),
            ("display_interval", self.display_interval),
        ] {
            if interval == 0 {
                return Err(GanError::Configuration(format!("{name} 必须大于 0")));
            }
        }
        Ok(())
    }

    /// 把配置与启动命令记录到`out`目录
    pub fn record(&self, out: impl AsRef<Path>, command_line: &str) -> Result<(), GanError> {
        let out = out.as_ref();
        fs::create_dir_all(out)?;
        let mut writer = BufWriter::new(File::create(out.join(CONFIG_FILE))?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        fs::write(out.join(COMMAND_FILE), format!("{command_line}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test]
    fn test_default_is_valid() {
        let config = TrainConfig::default();
        config.validate().unwrap();
        assert_eq!(config.generator_config().unwrap().ch, 512);
        assert_eq!(config.updater_config().schedule.base, 2e-4);
    }

    #[test]
    fn test_arch_size_pairing() {
        let config = TrainConfig {
            arch: "resnet128".to_string(),
            image_size: 64,
            ..TrainConfig::default()
        };
        assert_err!(config.validate(), GanError::Configuration(_));

        let config = TrainConfig {
            arch: "resnet128".to_string(),
            image_size: 128,
            ..TrainConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.discriminator_config().unwrap().ch, 1024);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let cases = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { smoothing: 1.0, ..TrainConfig::default() },
            TrainConfig { lambda_gp: -1.0, ..TrainConfig::default() },
            TrainConfig { display_interval: 0, ..TrainConfig::default() },
            TrainConfig { adam_beta1: 1.5, ..TrainConfig::default() },
            TrainConfig { ch: Some(100), ..TrainConfig::default() },
            TrainConfig { arch: "vgg".to_string(), ..TrainConfig::default() },
        ];
        for config in cases {
            assert_err!(config.validate(), GanError::Configuration(_));
        }
        let config = TrainConfig {
            z_distribution: "cauchy".to_string(),
            ..TrainConfig::default()
        };
        assert_err!(config.validate(), GanError::UnsupportedDistribution(_));
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        fs::write(&path, r#"{"arch": "dcgan128", "image_size": 128, "ch": 64}"#).unwrap();

        let config = TrainConfig::from_json_file(&path).unwrap();
        assert_eq!(config.arch, "dcgan128");
        assert_eq!(config.ch, Some(64));
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.out, PathBuf::from("result"));
        config.validate().unwrap();
    }

    #[test]
    fn test_record_writes_config_and_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result");
        let config = TrainConfig {
            seed: 7,
            ..TrainConfig::default()
        };
        config.record(&out, "dragan --seed 7").unwrap();

        let restored = TrainConfig::from_json_file(out.join(CONFIG_FILE)).unwrap();
        assert_eq!(restored, config);
        let command = fs::read_to_string(out.join(COMMAND_FILE)).unwrap();
        assert_eq!(command.trim_end(), "dragan --seed 7");
    }
}
