/*
 * @Author       : 老董
 * @Date         : 2026-03-10
 * @Description  : DRAGAN 训练更新引擎
 *
 * 每次`update()`依次执行：
 * 1. 取一个批次并校验形状；
 * 2. GenStep：生成器以“让判别器判真”为目标走一步；
 * 3. 用刚更新的生成器软拷贝出平滑生成器；
 * 4. DisStepPrep/DisStep：用新采样的隐变量重新生成假样本（不记录计算图），
 *    判别器对真/假样本的对抗损失加上在真样本附近扰动点处的梯度惩罚，走一步；
 * 5. AnnealCheck：按迭代次数退火两个优化器的学习率，然后迭代次数加一。
 *
 * 任何损失或参数梯度出现 NaN/Inf 时，本阶段的优化器不会更新，直接返回错误。
 */

use crate::data::{BatchSource, Sample};
use crate::gan::arch::{Discriminator, Generator};
use crate::gan::loss::{adversarial_fake_loss, adversarial_real_loss, gradient_penalty};
use crate::gan::schedule::AnnealSchedule;
use crate::gan::sync::{hard_copy, soft_copy};
use crate::gan::GanError;
use crate::nn::{Adam, Graph, Optimizer, Var};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument};

pub const GEN_LOSS_ADV: &str = "gen/loss_adv";
pub const DIS_LOSS_ADV: &str = "dis/loss_adv";
pub const DIS_LOSS_GP: &str = "dis/loss_gp";

/// 一次更新内部的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    GenStep,
    DisStepPrep,
    DisStep,
    AnnealCheck,
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GenStep => "GenStep",
            Self::DisStepPrep => "DisStepPrep",
            Self::DisStep => "DisStep",
            Self::AnnealCheck => "AnnealCheck",
        };
        f.write_str(name)
    }
}

/// 一次更新上报的观测值
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// 本次更新完成后的迭代次数
    pub iteration: u64,
    pub values: BTreeMap<String, f32>,
}

impl Report {
    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterConfig {
    pub batch_size: usize,
    /// 梯度惩罚系数，为0时不计算惩罚
    pub lambda_gp: f32,
    /// 平滑生成器的保留系数，软拷贝的 tau 为 1 − smoothing
    pub smoothing: f32,
    pub schedule: AnnealSchedule,
}

impl UpdaterConfig {
    pub fn validate(&self) -> Result<(), GanError> {
        if self.batch_size == 0 {
            return Err(GanError::Configuration("batch_size 必须大于 0".to_string()));
        }
        if !(self.lambda_gp.is_finite() && self.lambda_gp >= 0.0) {
            return Err(GanError::Configuration(format!(
                "lambda_gp 必须是非负数，实际为{}",
                self.lambda_gp
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(GanError::Configuration(format!(
                "smoothing 须在[0, 1)内，实际为{}",
                self.smoothing
            )));
        }
        let schedule = &self.schedule;
        if !(schedule.base.is_finite() && schedule.base > 0.0) {
            return Err(GanError::Configuration(format!(
                "学习率必须是正数，实际为{}",
                schedule.base
            )));
        }
        if !(schedule.rate.is_finite() && schedule.rate >= 0.0) {
            return Err(GanError::Configuration(format!(
                "退火系数必须是非负数，实际为{}",
                schedule.rate
            )));
        }
        if schedule.interval == 0 {
            return Err(GanError::Configuration("退火间隔必须大于 0".to_string()));
        }
        Ok(())
    }
}

pub struct DraganUpdater<S: BatchSource> {
    graph: Graph,
    generator: Generator,
    discriminator: Discriminator,
    smoothed_generator: Generator,
    opt_gen: Adam,
    opt_dis: Adam,
    source: S,
    config: UpdaterConfig,
    iteration: u64,
    phase: UpdatePhase,
    rng: StdRng,
}

impl<S: BatchSource> DraganUpdater<S> {
    /// 构造时平滑生成器从生成器硬拷贝一次
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: Graph,
        generator: Generator,
        discriminator: Discriminator,
        smoothed_generator: Generator,
        opt_gen: Adam,
        opt_dis: Adam,
        source: S,
        config: UpdaterConfig,
        seed: u64,
    ) -> Result<Self, GanError> {
        config.validate()?;
        let gen_size = generator.config().image_size;
        let dis_size = discriminator.config().image_size;
        if gen_size != dis_size {
            return Err(GanError::Configuration(format!(
                "生成器输出{gen_size}像素，判别器却接受{dis_size}像素"
            )));
        }
        hard_copy(&smoothed_generator, &generator)?;
        Ok(Self {
            graph,
            generator,
            discriminator,
            smoothed_generator,
            opt_gen,
            opt_dis,
            source,
            config,
            iteration: 0,
            phase: UpdatePhase::GenStep,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// 正在执行（或上次失败时所处）的阶段；一次更新完整结束后回到 GenStep
    pub const fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn generator(&self) -> &Generator {
        &self.generator
    }

    pub const fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    pub const fn smoothed_generator(&self) -> &Generator {
        &self.smoothed_generator
    }

    pub const fn opt_gen(&self) -> &Adam {
        &self.opt_gen
    }

    pub const fn opt_dis(&self) -> &Adam {
        &self.opt_dis
    }

    pub const fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// 执行一次完整的训练更新
    #[instrument(level = "debug", skip(self), fields(iteration = self.iteration))]
    pub fn update(&mut self) -> Result<Report, GanError> {
        let mut report = Report::default();

        self.phase = UpdatePhase::GenStep;
        let started = Instant::now();
        let x_real = self.next_real_batch()?;
        let loss_gen = self.gen_step()?;
        report.values.insert(GEN_LOSS_ADV.to_string(), loss_gen);
        debug!("生成器一步耗时 {:?}", started.elapsed());

        soft_copy(
            &self.smoothed_generator,
            &self.generator,
            1.0 - self.config.smoothing,
        )?;

        self.phase = UpdatePhase::DisStepPrep;
        let started = Instant::now();
        let (loss_adv, loss_gp) = self.dis_step(&x_real)?;
        report.values.insert(DIS_LOSS_ADV.to_string(), loss_adv);
        if let Some(loss_gp) = loss_gp {
            report.values.insert(DIS_LOSS_GP.to_string(), loss_gp);
        }
        debug!("判别器一步耗时 {:?}", started.elapsed());

        self.phase = UpdatePhase::AnnealCheck;
        self.anneal();
        self.iteration += 1;
        report.iteration = self.iteration;
        self.phase = UpdatePhase::GenStep;
        Ok(report)
    }

    /// 取一个批次，校验后堆叠为[B, 3, H, W]
    fn next_real_batch(&mut self) -> Result<Tensor, GanError> {
        let batch = self.source.next_batch()?;
        let side = self.generator.config().image_size;
        let sample_shape = [3, side, side];
        let batch_size = self.config.batch_size;
        if batch.len() != batch_size {
            return Err(GanError::BatchShape {
                expected: vec![batch_size, 3, side, side],
                got: vec![batch.len(), 3, side, side],
                index: batch.len().min(batch_size),
            });
        }
        let samples = batch.into_iter().map(Sample::into_data).collect::<Vec<_>>();
        if let Some((index, bad)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.shape() != sample_shape)
        {
            return Err(GanError::BatchShape {
                expected: sample_shape.to_vec(),
                got: bad.shape().to_vec(),
                index,
            });
        }
        Tensor::stack(&samples).map_err(|e| GanError::Configuration(e.to_string()))
    }

    fn sample_fake_input(&mut self) -> Var {
        let z = self
            .generator
            .sample_latent(self.config.batch_size, &mut self.rng);
        self.graph.input(&z)
    }

    /// 生成器一步，返回其对抗损失
    fn gen_step(&mut self) -> Result<f32, GanError> {
        let phase = UpdatePhase::GenStep;
        let z = self.sample_fake_input();
        let x_fake = self.generator.generate(&z)?;
        let y_fake = self.discriminator.score(&x_fake)?;
        let loss = adversarial_real_loss(&y_fake);
        let loss_value = loss.item()?;
        ensure_finite(phase, "对抗损失", loss_value)?;

        self.opt_gen.zero_grad();
        loss.backward()?;
        ensure_finite_gradients(phase, &self.opt_gen)?;
        self.opt_gen.step()?;
        Ok(loss_value)
    }

    /// 判别器一步，返回（对抗损失, 梯度惩罚）
    fn dis_step(&mut self, x_real: &Tensor) -> Result<(f32, Option<f32>), GanError> {
        let z = self.sample_fake_input();
        let x_fake = self.graph.without_grad(|_| self.generator.generate(&z))?;
        let y_fake = self.discriminator.score(&x_fake)?;
        let y_real = self.discriminator.score(&self.graph.input(x_real))?;
        let loss_adv = adversarial_real_loss(&y_real).try_add(&adversarial_fake_loss(&y_fake))?;

        let (loss, loss_gp) = if self.config.lambda_gp > 0.0 {
            let loss_gp = self.dragan_penalty(x_real)?;
            (loss_adv.try_add(&loss_gp)?, Some(loss_gp.item()?))
        } else {
            (loss_adv.clone(), None)
        };

        self.phase = UpdatePhase::DisStep;
        let phase = UpdatePhase::DisStep;
        let loss_adv_value = loss_adv.item()?;
        ensure_finite(phase, "对抗损失", loss_adv_value)?;
        if let Some(loss_gp) = loss_gp {
            ensure_finite(phase, "梯度惩罚", loss_gp)?;
        }

        self.opt_dis.zero_grad();
        loss.backward()?;
        ensure_finite_gradients(phase, &self.opt_dis)?;
        self.opt_dis.step()?;
        Ok((loss_adv_value, loss_gp))
    }

    fn dragan_penalty(&mut self, x_real: &Tensor) -> Result<Var, GanError> {
        let noise = Tensor::uniform_with_rng(-1.0, 1.0, x_real.shape(), &mut self.rng);
        let discriminator = &self.discriminator;
        Ok(gradient_penalty(
            &self.graph,
            x_real,
            &noise,
            self.config.lambda_gp,
            |x| discriminator.score(x),
        )?)
    }

    fn anneal(&mut self) {
        if let Some(lr) = self.config.schedule.learning_rate_at(self.iteration) {
            self.opt_gen.set_learning_rate(lr);
            self.opt_dis.set_learning_rate(lr);
            info!("第{}次迭代：生成器与判别器的学习率退火为{lr:e}", self.iteration);
        }
    }
}

fn ensure_finite(phase: UpdatePhase, what: &str, value: f32) -> Result<(), GanError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GanError::NumericInstability {
            phase: phase.to_string(),
            what: format!("{what}（{value}）"),
        })
    }
}

fn ensure_finite_gradients(phase: UpdatePhase, optimizer: &Adam) -> Result<(), GanError> {
    match optimizer
        .gradients()
        .into_iter()
        .find(|(_, grad)| !grad.is_all_finite())
    {
        Some((name, _)) => Err(GanError::NumericInstability {
            phase: phase.to_string(),
            what: format!("参数{name}的梯度"),
        }),
        None => Ok(()),
    }
}
