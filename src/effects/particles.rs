//! 粒子模拟器
//!
//! 每个模拟器以固定容量的槽位数组驱动一种粒子效果。模式在效果
//! 配置时固定（闪烁/漂移/辉光），以标签联合表达，非法的模式与
//! 参数组合在编译期不可表示。
//!
//! 所有模式共享遮罩行为参数：出生位置用拒绝采样约束，存活位置
//! （漂移类）每帧复验，失败即原地重生。遮罩缺失（未加载或加载
//! 失败）时退化为无约束行为。

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{
    cap_delta, sample_masked_position, sanitize_region, variance_factor, vary_direction,
    MaskParams, MIN_DURATION,
};
use crate::mask::MaskSampler;
use crate::space::wrap_coordinate;

/// 辉光样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlowStyle {
    /// 脉冲辉光
    #[default]
    Pulse,
    /// 全体脉冲
    All,
    /// 恒定不透明度
    Fixed,
}

/// 辉光运动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlowMovement {
    /// 原地不动，定期重定位
    #[default]
    Stationary,
    /// 漂移（与 Drift 模式相同的环绕/重生规则）
    Drift,
}

/// 粒子模式及其参数
///
/// 模式对整个效果固定，不随单个粒子变化。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ParticleMode {
    /// 闪烁：alpha 按 `sin(t*pi)` 循环，周期结束时重定位
    Twinkle {
        #[serde(default = "default_cycle_duration")]
        cycle_duration: f32,
        #[serde(default = "default_cycle_variance")]
        cycle_variance: f32,
    },
    /// 漂移：线性运动，alpha 随行进距离线性衰减，位置按区域环绕
    Drift {
        #[serde(default = "default_drift_speed")]
        speed: f32,
        #[serde(default = "default_speed_variance")]
        speed_variance: f32,
        /// 基准方向（弧度）
        #[serde(default)]
        direction: f32,
        #[serde(default = "default_direction_variance")]
        direction_variance: f32,
        #[serde(default = "default_drift_distance")]
        max_distance: f32,
    },
    /// 辉光：alpha 脉冲，可选漂移或定期重定位
    Glow {
        #[serde(default)]
        style: GlowStyle,
        #[serde(default)]
        movement: GlowMovement,
        #[serde(default = "default_cycle_duration")]
        cycle_duration: f32,
        #[serde(default = "default_cycle_variance")]
        cycle_variance: f32,
        #[serde(default = "default_glow_speed")]
        speed: f32,
        #[serde(default = "default_speed_variance")]
        speed_variance: f32,
        #[serde(default)]
        direction: f32,
        #[serde(default = "default_direction_variance")]
        direction_variance: f32,
        #[serde(default = "default_drift_distance")]
        max_distance: f32,
        /// Stationary 运动方式下的重定位间隔（秒）
        #[serde(default = "default_relocation_interval")]
        relocation_interval: f32,
    },
}

fn default_cycle_duration() -> f32 {
    2.0
}
fn default_cycle_variance() -> f32 {
    0.5
}
fn default_drift_speed() -> f32 {
    20.0
}
fn default_glow_speed() -> f32 {
    10.0
}
fn default_speed_variance() -> f32 {
    0.3
}
fn default_direction_variance() -> f32 {
    PI
}
fn default_drift_distance() -> f32 {
    200.0
}
fn default_relocation_interval() -> f32 {
    4.0
}

impl Default for ParticleMode {
    fn default() -> Self {
        ParticleMode::Twinkle {
            cycle_duration: default_cycle_duration(),
            cycle_variance: default_cycle_variance(),
        }
    }
}

impl ParticleMode {
    /// 数值参数消毒：非有限值回落默认，时长/距离有下限
    fn normalize(&mut self) {
        fn finite_or(value: &mut f32, fallback: f32) {
            if !value.is_finite() {
                *value = fallback;
            }
        }
        match self {
            ParticleMode::Twinkle {
                cycle_duration,
                cycle_variance,
            } => {
                finite_or(cycle_duration, default_cycle_duration());
                finite_or(cycle_variance, 0.0);
                *cycle_duration = cycle_duration.max(MIN_DURATION);
            }
            ParticleMode::Drift {
                speed,
                speed_variance,
                direction,
                direction_variance,
                max_distance,
            } => {
                finite_or(speed, default_drift_speed());
                finite_or(speed_variance, 0.0);
                finite_or(direction, 0.0);
                finite_or(direction_variance, 0.0);
                finite_or(max_distance, default_drift_distance());
                *speed = speed.max(0.0);
                *max_distance = max_distance.max(MIN_DURATION);
            }
            ParticleMode::Glow {
                cycle_duration,
                cycle_variance,
                speed,
                speed_variance,
                direction,
                direction_variance,
                max_distance,
                relocation_interval,
                ..
            } => {
                finite_or(cycle_duration, default_cycle_duration());
                finite_or(cycle_variance, 0.0);
                finite_or(speed, default_glow_speed());
                finite_or(speed_variance, 0.0);
                finite_or(direction, 0.0);
                finite_or(direction_variance, 0.0);
                finite_or(max_distance, default_drift_distance());
                finite_or(relocation_interval, default_relocation_interval());
                *cycle_duration = cycle_duration.max(MIN_DURATION);
                *speed = speed.max(0.0);
                *max_distance = max_distance.max(MIN_DURATION);
                *relocation_interval = relocation_interval.max(MIN_DURATION);
            }
        }
    }
}

/// 粒子效果配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEffectConfig {
    /// 槽位数量（固定容量）
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// 基础尺寸（世界单位）
    #[serde(default = "default_size")]
    pub size: f32,
    #[serde(default = "default_size_variance")]
    pub size_variance: f32,
    #[serde(flatten)]
    pub mode: ParticleMode,
    #[serde(default)]
    pub mask: MaskParams,
    /// 随机种子；缺省时从系统熵初始化
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_count() -> usize {
    64
}
fn default_size() -> f32 {
    4.0
}
fn default_size_variance() -> f32 {
    0.3
}

impl Default for ParticleEffectConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            size: default_size(),
            size_variance: default_size_variance(),
            mode: ParticleMode::default(),
            mask: MaskParams::default(),
            seed: None,
        }
    }
}

impl ParticleEffectConfig {
    /// 越界配置静默钳制，不拒绝
    pub fn normalize(&mut self) {
        if !self.size.is_finite() || self.size <= 0.0 {
            self.size = default_size();
        }
        if !self.size_variance.is_finite() || self.size_variance < 0.0 {
            self.size_variance = 0.0;
        }
        self.mode.normalize();
        self.mask.normalize();
    }
}

/// 单个粒子槽位
///
/// 槽位数据只被原地覆盖（重生），从不单独释放。
#[derive(Debug, Clone, Copy)]
pub struct ParticleInstance {
    /// 区域坐标，始终环绕在 `[0, region)` 内
    pub pos: Vec2,
    pub size: f32,
    /// 始终在 [0, 1] 内
    pub alpha: f32,
    /// 周期起始偏移（秒），避免同相闪烁/脉冲
    pub phase: f32,
    pub cycle_duration: f32,
    /// 单位行进方向
    pub dir: Vec2,
    pub speed: f32,
    pub distance_traveled: f32,
    pub max_distance: f32,
    pub elapsed: f32,
}

/// 粒子模拟器
pub struct ParticleSimulator {
    config: ParticleEffectConfig,
    region: Vec2,
    particles: Vec<ParticleInstance>,
    mask: Option<Arc<MaskSampler>>,
    rng: StdRng,
}

impl ParticleSimulator {
    /// 按配置分配槽位数组并初始化所有粒子
    pub fn new(config: ParticleEffectConfig, region: Vec2) -> Self {
        let mut config = config;
        config.normalize();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let max_count = config.max_count;
        let mut simulator = Self {
            config,
            region: sanitize_region(region),
            particles: Vec::with_capacity(max_count),
            mask: None,
            rng,
        };
        for _ in 0..max_count {
            let particle = simulator.make_particle();
            simulator.particles.push(particle);
        }
        simulator
    }

    /// 替换遮罩采样器；`None` 表示缺失或仍在加载
    pub fn set_mask(&mut self, mask: Option<Arc<MaskSampler>>) {
        self.mask = mask;
    }

    pub fn particles(&self) -> &[ParticleInstance] {
        &self.particles
    }

    pub fn config(&self) -> &ParticleEffectConfig {
        &self.config
    }

    /// 每帧推进
    ///
    /// `region` 由宿主每帧提供（区域几何可变）；`delta_time` 先
    /// 钳制到 [`super::MAX_DELTA`]。
    pub fn tick(&mut self, delta_time: f32, region: Vec2) {
        let dt = cap_delta(delta_time);
        self.region = sanitize_region(region);
        if dt == 0.0 {
            return;
        }
        for index in 0..self.particles.len() {
            let mut particle = self.particles[index];
            self.update_particle(&mut particle, dt);
            self.particles[index] = particle;
        }
    }

    // ------------------------------------------------------------------
    // 内部
    // ------------------------------------------------------------------

    fn update_particle(&mut self, p: &mut ParticleInstance, dt: f32) {
        match self.config.mode {
            ParticleMode::Twinkle { cycle_duration, cycle_variance } => {
                p.elapsed += dt;
                let cycle = p.cycle_duration.max(MIN_DURATION);
                if (p.elapsed + p.phase) / cycle >= 1.0 {
                    // 周期完成：重定位并重掷周期
                    p.pos = self.pick_position(self.config.mask.behavior.constrains());
                    p.cycle_duration = (cycle_duration
                        * variance_factor(&mut self.rng, cycle_variance))
                    .max(MIN_DURATION);
                    p.elapsed = 0.0;
                    p.phase = 0.0;
                }
                let progress = ((p.elapsed + p.phase) / p.cycle_duration.max(MIN_DURATION))
                    .clamp(0.0, 1.0);
                p.alpha = (progress * PI).sin();
            }
            ParticleMode::Drift { .. } => {
                self.advance_drift(p, dt);
                p.alpha = 1.0 - p.distance_traveled / p.max_distance.max(MIN_DURATION);
                if self.drift_expired(p) {
                    *p = self.make_particle();
                }
            }
            ParticleMode::Glow {
                style,
                movement,
                relocation_interval,
                ..
            } => {
                p.elapsed += dt;
                match movement {
                    GlowMovement::Drift => {
                        self.advance_drift(p, dt);
                        if self.drift_expired(p) {
                            *p = self.make_particle();
                        }
                    }
                    GlowMovement::Stationary => {
                        if p.elapsed >= relocation_interval {
                            p.pos = self.pick_position(self.config.mask.behavior.constrains());
                            p.elapsed -= relocation_interval;
                        }
                    }
                }
                p.alpha = match style {
                    GlowStyle::Pulse | GlowStyle::All => {
                        let t = (p.elapsed + p.phase) / p.cycle_duration.max(MIN_DURATION);
                        0.3 + 0.7 * ((t * TAU).sin() * 0.5 + 0.5)
                    }
                    GlowStyle::Fixed => 1.0,
                };
            }
        }
        p.alpha = p.alpha.clamp(0.0, 1.0);
    }

    /// 漂移步进：位置环绕、距离累计
    fn advance_drift(&mut self, p: &mut ParticleInstance, dt: f32) {
        let step = p.speed * dt;
        p.pos.x = wrap_coordinate(p.pos.x + p.dir.x * step, self.region.x);
        p.pos.y = wrap_coordinate(p.pos.y + p.dir.y * step, self.region.y);
        p.distance_traveled += step;
    }

    /// 漂移粒子的重生判定：行进距离耗尽，或当前位置遮罩复验失败
    fn drift_expired(&self, p: &ParticleInstance) -> bool {
        if p.distance_traveled >= p.max_distance {
            return true;
        }
        if self.config.mask.behavior.constrains() {
            if let Some(mask) = self.mask.as_deref() {
                return mask.sample_region(p.pos, self.region, self.config.mask.channel)
                    < self.config.mask.threshold;
            }
        }
        false
    }

    fn pick_position(&mut self, check: bool) -> Vec2 {
        sample_masked_position(
            &mut self.rng,
            self.region,
            self.mask.as_deref(),
            &self.config.mask,
            check,
        )
    }

    /// 构造一个新的粒子槽位值（出生与重生共用）
    fn make_particle(&mut self) -> ParticleInstance {
        let mode = self.config.mode;
        let check = self.config.mask.behavior.checks_spawn();
        let pos = self.pick_position(check);
        let size = self.config.size * variance_factor(&mut self.rng, self.config.size_variance);

        match mode {
            ParticleMode::Twinkle {
                cycle_duration,
                cycle_variance,
            } => {
                let cycle =
                    (cycle_duration * variance_factor(&mut self.rng, cycle_variance))
                        .max(MIN_DURATION);
                ParticleInstance {
                    pos,
                    size,
                    alpha: 0.0,
                    phase: self.rng.gen_range(0.0..cycle),
                    cycle_duration: cycle,
                    dir: Vec2::X,
                    speed: 0.0,
                    distance_traveled: 0.0,
                    max_distance: 0.0,
                    elapsed: 0.0,
                }
            }
            ParticleMode::Drift {
                speed,
                speed_variance,
                direction,
                direction_variance,
                max_distance,
            } => ParticleInstance {
                pos,
                size,
                alpha: 1.0,
                phase: 0.0,
                cycle_duration: 0.0,
                dir: vary_direction(
                    &mut self.rng,
                    Vec2::from_angle(direction),
                    direction_variance,
                ),
                speed: speed * variance_factor(&mut self.rng, speed_variance),
                distance_traveled: 0.0,
                max_distance: max_distance.max(MIN_DURATION),
                elapsed: 0.0,
            },
            ParticleMode::Glow {
                style,
                movement,
                cycle_duration,
                cycle_variance,
                speed,
                speed_variance,
                direction,
                direction_variance,
                max_distance,
                ..
            } => {
                let cycle =
                    (cycle_duration * variance_factor(&mut self.rng, cycle_variance))
                        .max(MIN_DURATION);
                let phase = self.rng.gen_range(0.0..cycle);
                let alpha = match style {
                    GlowStyle::Pulse | GlowStyle::All => {
                        0.3 + 0.7 * ((phase / cycle * TAU).sin() * 0.5 + 0.5)
                    }
                    GlowStyle::Fixed => 1.0,
                };
                let (dir, drift_speed) = match movement {
                    GlowMovement::Drift => (
                        vary_direction(
                            &mut self.rng,
                            Vec2::from_angle(direction),
                            direction_variance,
                        ),
                        speed * variance_factor(&mut self.rng, speed_variance),
                    ),
                    GlowMovement::Stationary => (Vec2::X, 0.0),
                };
                ParticleInstance {
                    pos,
                    size,
                    alpha: alpha.clamp(0.0, 1.0),
                    phase,
                    cycle_duration: cycle,
                    dir,
                    speed: drift_speed,
                    distance_traveled: 0.0,
                    max_distance: max_distance.max(MIN_DURATION),
                    elapsed: 0.0,
                }
            }
        }
    }
}
