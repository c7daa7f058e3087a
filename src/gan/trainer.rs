/*
 * @Author       : 老董
 * @Date         : 2026-03-13
 * @Description  : 训练循环
 *
 * 按配置搭好图、三个网络、两个 Adam、批次迭代器与更新引擎，然后循环到`max_iter`：
 * - 每`display_interval`次输出一次观测值均值；
 * - 每`5 · display_interval`次向`{out}/log`追加一条 JSON 记录；
 * - 每`evaluation_sample_interval`次保存生成器与平滑生成器的预览；
 * - 每`snapshot_interval`次写一次快照。
 */

use crate::data::{BatchSource, ImageDataset, SerialIterator};
use crate::gan::GanError;
use crate::gan::arch::{Discriminator, Generator};
use crate::gan::config::TrainConfig;
use crate::gan::preview::write_preview;
use crate::gan::snapshot::write_snapshot;
use crate::gan::updater::{DraganUpdater, Report};
use crate::nn::{Adam, Graph, Module};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;
use tracing::info;

pub const LOG_FILE: &str = "log";
pub const PREVIEW_DIR: &str = "preview";
pub const SMOOTHED_PREVIEW_DIR: &str = "preview_smoothed";

/// `{out}/log`中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub epoch: usize,
    pub iteration: u64,
    pub elapsed_time: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f32>,
}

/// 对一段时间内上报的观测值求均值
#[derive(Debug, Default)]
struct ReportMean {
    sums: BTreeMap<String, (f64, usize)>,
}

impl ReportMean {
    fn add(&mut self, report: &Report) {
        for (key, &value) in &report.values {
            let entry = self.sums.entry(key.clone()).or_insert((0.0, 0));
            entry.0 += f64::from(value);
            entry.1 += 1;
        }
    }

    /// 取出均值并清空
    fn take(&mut self) -> BTreeMap<String, f32> {
        std::mem::take(&mut self.sums)
            .into_iter()
            .map(|(key, (sum, count))| (key, (sum / count as f64) as f32))
            .collect()
    }
}

pub struct Trainer {
    config: TrainConfig,
    updater: DraganUpdater<SerialIterator>,
    display: ReportMean,
    log_window: ReportMean,
    log: Vec<LogEntry>,
    started: Instant,
}

impl Trainer {
    /// 从`config.npz_path`读取数据集并搭建训练
    pub fn new(config: TrainConfig) -> Result<Self, GanError> {
        config.validate()?;
        let dataset = ImageDataset::from_npz(&config.npz_path, config.image_size)?;
        Self::with_dataset(config, dataset)
    }

    pub fn with_dataset(config: TrainConfig, dataset: ImageDataset) -> Result<Self, GanError> {
        config.validate()?;
        if dataset.image_size() != config.image_size {
            return Err(GanError::Configuration(format!(
                "数据集图像边长为{}，配置为{}",
                dataset.image_size(),
                config.image_size
            )));
        }

        let graph = Graph::new_with_seed(config.seed);
        let generator = Generator::new(&graph, config.generator_config()?)?;
        let discriminator = Discriminator::new(&graph, config.discriminator_config()?)?;
        let smoothed_generator = Generator::new(&graph, config.generator_config()?)?;
        let (alpha, beta1, beta2) = (config.adam_alpha, config.adam_beta1, config.adam_beta2);
        let opt_gen = Adam::new(generator.named_parameters(), alpha, beta1, beta2)?;
        let opt_dis = Adam::new(discriminator.named_parameters(), alpha, beta1, beta2)?;
        let source = SerialIterator::new(dataset, config.batch_size, config.seed)?;
        let updater = DraganUpdater::new(
            graph,
            generator,
            discriminator,
            smoothed_generator,
            opt_gen,
            opt_dis,
            source,
            config.updater_config(),
            config.seed,
        )?;

        let command_line = std::env::args().collect::<Vec<_>>().join(" ");
        config.record(&config.out, &command_line)?;
        info!(
            "{}：生成器{}个参数张量，判别器{}个参数张量，输出到{}",
            config.arch,
            updater.generator().num_params(),
            updater.discriminator().num_params(),
            config.out.display()
        );

        Ok(Self {
            config,
            updater,
            display: ReportMean::default(),
            log_window: ReportMean::default(),
            log: Vec::new(),
            started: Instant::now(),
        })
    }

    pub const fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub const fn updater(&self) -> &DraganUpdater<SerialIterator> {
        &self.updater
    }

    /// 目前已写入`{out}/log`的记录
    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log
    }

    /// 训练到`max_iter`为止
    pub fn run(&mut self) -> Result<(), GanError> {
        info!("开始训练，共{}次迭代", self.config.max_iter);
        while self.updater.iteration() < self.config.max_iter {
            self.step()?;
        }
        info!("训练结束，用时{:.1}秒", self.started.elapsed().as_secs_f64());
        Ok(())
    }

    /// 执行一次更新并按间隔处理日志、预览与快照
    pub fn step(&mut self) -> Result<Report, GanError> {
        let report = self.updater.update()?;
        let it = report.iteration;
        self.display.add(&report);
        self.log_window.add(&report);

        let display_interval = self.config.display_interval;
        if it % display_interval == 0 {
            self.print_report(it);
        }
        if it % (5 * display_interval) == 0 {
            self.append_log(it)?;
        }
        if it % self.config.evaluation_sample_interval == 0 {
            self.write_previews(it)?;
        }
        if it % self.config.snapshot_interval == 0 {
            write_snapshot(&self.config.out, &self.updater)?;
        }
        Ok(report)
    }

    fn print_report(&mut self, it: u64) {
        let means = self
            .display
            .take()
            .into_iter()
            .map(|(key, value)| format!("{key}={value:.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            "epoch={} iteration={it} elapsed={:.1}s {means}",
            self.updater.source().epoch(),
            self.started.elapsed().as_secs_f64()
        );
    }

    fn append_log(&mut self, it: u64) -> Result<(), GanError> {
        self.log.push(LogEntry {
            epoch: self.updater.source().epoch(),
            iteration: it,
            elapsed_time: self.started.elapsed().as_secs_f64(),
            values: self.log_window.take(),
        });
        let mut writer = BufWriter::new(File::create(self.config.out.join(LOG_FILE))?);
        serde_json::to_writer_pretty(&mut writer, &self.log)?;
        writer.flush()?;
        Ok(())
    }

    fn write_previews(&self, it: u64) -> Result<(), GanError> {
        let out = &self.config.out;
        let graph = self.updater.graph();
        write_preview(graph, self.updater.generator(), 5, 5, out.join(PREVIEW_DIR), it)?;
        write_preview(
            graph,
            self.updater.smoothed_generator(),
            4,
            4,
            out.join(SMOOTHED_PREVIEW_DIR),
            it,
        )?;
        Ok(())
    }
}
