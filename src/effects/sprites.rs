//! 漫游精灵模拟器
//!
//! 驱动飞鸟一类的环境精灵：从区域边缘出生，沿随机化方向线性
//! 穿越，按固定帧率步进动画帧，越出区域边距后槽位标记死亡并在
//! 下一帧于新边缘重生（渲染器可据 `alive` 丢弃死亡帧）。与粒子
//! 模拟器结构平行，但建模的是定向穿越而非原地循环。
//!
//! 垂直振荡只叠加在渲染位置上，不触碰行进状态，因此振荡不会
//! 干扰出生/重生判定。

use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{cap_delta, sanitize_region, variance_factor, vary_direction, MIN_DURATION};

/// 精灵效果配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteEffectConfig {
    /// 槽位数量（固定容量）
    #[serde(default = "default_sprite_count")]
    pub max_count: usize,
    /// 行进速度（世界单位/秒）
    #[serde(default = "default_sprite_speed")]
    pub speed: f32,
    #[serde(default = "default_sprite_speed_variance")]
    pub speed_variance: f32,
    /// 基准行进方向（弧度）
    #[serde(default)]
    pub direction: f32,
    #[serde(default = "default_sprite_direction_variance")]
    pub direction_variance: f32,
    /// 动画帧数
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    /// 动画帧率（帧/秒）
    #[serde(default = "default_frame_fps")]
    pub frame_fps: f32,
    /// 垂直振荡振幅（世界单位）
    #[serde(default = "default_oscillation_amplitude")]
    pub oscillation_amplitude: f32,
    /// 垂直振荡频率（周期/秒）
    #[serde(default = "default_oscillation_frequency")]
    pub oscillation_frequency: f32,
    /// 单帧精灵的世界尺寸，同时作为出生/重生边距
    #[serde(default = "default_sprite_size")]
    pub sprite_size: f32,
    /// 随机种子；缺省时从系统熵初始化
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_sprite_count() -> usize {
    6
}
fn default_sprite_speed() -> f32 {
    40.0
}
fn default_sprite_speed_variance() -> f32 {
    0.25
}
fn default_sprite_direction_variance() -> f32 {
    0.4
}
fn default_frame_count() -> u32 {
    4
}
fn default_frame_fps() -> f32 {
    8.0
}
fn default_oscillation_amplitude() -> f32 {
    6.0
}
fn default_oscillation_frequency() -> f32 {
    0.8
}
fn default_sprite_size() -> f32 {
    16.0
}

impl Default for SpriteEffectConfig {
    fn default() -> Self {
        Self {
            max_count: default_sprite_count(),
            speed: default_sprite_speed(),
            speed_variance: default_sprite_speed_variance(),
            direction: 0.0,
            direction_variance: default_sprite_direction_variance(),
            frame_count: default_frame_count(),
            frame_fps: default_frame_fps(),
            oscillation_amplitude: default_oscillation_amplitude(),
            oscillation_frequency: default_oscillation_frequency(),
            sprite_size: default_sprite_size(),
            seed: None,
        }
    }
}

impl SpriteEffectConfig {
    /// 越界配置静默钳制，不拒绝
    pub fn normalize(&mut self) {
        if !self.speed.is_finite() || self.speed < 0.0 {
            self.speed = default_sprite_speed();
        }
        if !self.speed_variance.is_finite() || self.speed_variance < 0.0 {
            self.speed_variance = 0.0;
        }
        if !self.direction.is_finite() {
            self.direction = 0.0;
        }
        if !self.direction_variance.is_finite() || self.direction_variance < 0.0 {
            self.direction_variance = 0.0;
        }
        self.frame_count = self.frame_count.max(1);
        if !self.frame_fps.is_finite() || self.frame_fps <= 0.0 {
            self.frame_fps = default_frame_fps();
        }
        if !self.oscillation_amplitude.is_finite() || self.oscillation_amplitude < 0.0 {
            self.oscillation_amplitude = 0.0;
        }
        if !self.oscillation_frequency.is_finite() || self.oscillation_frequency < 0.0 {
            self.oscillation_frequency = 0.0;
        }
        if !self.sprite_size.is_finite() || self.sprite_size <= 0.0 {
            self.sprite_size = default_sprite_size();
        }
    }
}

/// 单个精灵槽位
#[derive(Debug, Clone, Copy)]
pub struct SpriteInstance {
    /// 行进位置（不含振荡项），越出边距前不受区域约束
    pub pos: Vec2,
    /// 单位行进方向
    pub dir: Vec2,
    pub speed: f32,
    /// 振荡相位偏移
    pub oscillation_phase: f32,
    /// 当前动画帧
    pub frame: u32,
    pub frame_timer: f32,
    pub elapsed: f32,
    pub alive: bool,
}

/// 漫游精灵模拟器
pub struct SpriteSimulator {
    config: SpriteEffectConfig,
    region: Vec2,
    sprites: Vec<SpriteInstance>,
    rng: StdRng,
}

impl SpriteSimulator {
    pub fn new(config: SpriteEffectConfig, region: Vec2) -> Self {
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
            sprites: Vec::with_capacity(max_count),
            rng,
        };
        for _ in 0..max_count {
            let sprite = simulator.spawn_at_edge();
            simulator.sprites.push(sprite);
        }
        simulator
    }

    pub fn sprites(&self) -> &[SpriteInstance] {
        &self.sprites
    }

    pub fn config(&self) -> &SpriteEffectConfig {
        &self.config
    }

    /// 渲染位置：行进位置叠加垂直振荡
    ///
    /// 振荡项沿行进方向的垂线摆动，不写回行进状态。
    pub fn render_position(&self, sprite: &SpriteInstance) -> Vec2 {
        let swing = self.config.oscillation_amplitude
            * (TAU * self.config.oscillation_frequency * sprite.elapsed
                + sprite.oscillation_phase)
                .sin();
        sprite.pos + sprite.dir.perp() * swing
    }

    /// 每帧推进
    pub fn tick(&mut self, delta_time: f32, region: Vec2) {
        let dt = cap_delta(delta_time);
        self.region = sanitize_region(region);
        if dt == 0.0 {
            return;
        }
        let frame_interval = 1.0 / self.config.frame_fps.max(MIN_DURATION);
        for index in 0..self.sprites.len() {
            let mut sprite = self.sprites[index];

            if !sprite.alive {
                // 上一帧越界的槽位在新边缘重生，出生帧不前进
                self.sprites[index] = self.spawn_at_edge();
                continue;
            }

            sprite.pos += sprite.dir * sprite.speed * dt;
            sprite.elapsed += dt;

            // 固定帧率步进动画帧
            sprite.frame_timer += dt;
            while sprite.frame_timer >= frame_interval {
                sprite.frame_timer -= frame_interval;
                sprite.frame = (sprite.frame + 1) % self.config.frame_count;
            }

            if self.out_of_bounds(sprite.pos) {
                sprite.alive = false;
            }

            self.sprites[index] = sprite;
        }
    }

    // ------------------------------------------------------------------
    // 内部
    // ------------------------------------------------------------------

    /// 越界判定：超出区域一个精灵帧的边距
    fn out_of_bounds(&self, pos: Vec2) -> bool {
        let margin = self.config.sprite_size;
        pos.x < -margin
            || pos.x > self.region.x + margin
            || pos.y < -margin
            || pos.y > self.region.y + margin
    }

    /// 在行进方向的主导轴对应的边缘出生
    ///
    /// `|dx| >= |dy|` 时按 `dx` 符号选左/右边缘，否则按 `dy` 符号
    /// 选上/下边缘，保证精灵朝区域内部飞行。
    fn spawn_at_edge(&mut self) -> SpriteInstance {
        let dir = vary_direction(
            &mut self.rng,
            Vec2::from_angle(self.config.direction),
            self.config.direction_variance,
        );
        let speed = self.config.speed * variance_factor(&mut self.rng, self.config.speed_variance);
        let margin = self.config.sprite_size;

        let pos = if dir.x.abs() >= dir.y.abs() {
            let x = if dir.x >= 0.0 {
                -margin
            } else {
                self.region.x + margin
            };
            Vec2::new(x, self.rng.gen_range(0.0..self.region.y))
        } else {
            let y = if dir.y >= 0.0 {
                -margin
            } else {
                self.region.y + margin
            };
            Vec2::new(self.rng.gen_range(0.0..self.region.x), y)
        };

        SpriteInstance {
            pos,
            dir,
            speed,
            oscillation_phase: self.rng.gen_range(0.0..TAU),
            frame: self.rng.gen_range(0..self.config.frame_count),
            frame_timer: 0.0,
            elapsed: 0.0,
            alive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::MAX_DELTA;

    const REGION: Vec2 = Vec2::new(200.0, 100.0);

    fn rightward_config() -> SpriteEffectConfig {
        SpriteEffectConfig {
            max_count: 1,
            speed: 50.0,
            speed_variance: 0.0,
            direction: 0.0,
            direction_variance: 0.0,
            frame_count: 4,
            frame_fps: 10.0,
            oscillation_amplitude: 5.0,
            oscillation_frequency: 1.0,
            sprite_size: 10.0,
            seed: Some(21),
        }
    }

    #[test]
    fn test_spawn_edge_matches_travel_direction() {
        let sim = SpriteSimulator::new(rightward_config(), REGION);
        let sprite = &sim.sprites()[0];
        // 向右飞：从左边缘出生
        assert_eq!(sprite.pos.x, -10.0);
        assert!(sprite.dir.x > 0.0);
        assert!(sprite.alive);

        // 向下飞：从上边缘出生
        let mut config = rightward_config();
        config.direction = std::f32::consts::FRAC_PI_2;
        let sim = SpriteSimulator::new(config, REGION);
        let sprite = &sim.sprites()[0];
        assert_eq!(sprite.pos.y, -10.0);
        assert!(sprite.dir.y > 0.0);
    }

    #[test]
    fn test_sprite_crosses_and_respawns() {
        let mut sim = SpriteSimulator::new(rightward_config(), REGION);
        // 穿越 200 单位区域加两侧边距需要 (200+20)/50 = 4.4 秒
        let mut respawned = false;
        for _ in 0..50 {
            let before = sim.sprites()[0].pos.x;
            sim.tick(MAX_DELTA, REGION);
            let after = sim.sprites()[0].pos.x;
            if after < before {
                respawned = true;
                break;
            }
        }
        assert!(respawned, "sprite should despawn and respawn at an edge");
        // 重生后仍从边缘出发
        assert_eq!(sim.sprites()[0].pos.x, -10.0);
    }

    #[test]
    fn test_frame_stepping_wraps() {
        let mut sim = SpriteSimulator::new(rightward_config(), REGION);
        // 10 fps、4 帧：一秒内帧号前进 10 步，模 4 回绕
        let start_frame = sim.sprites()[0].frame;
        sim.tick(0.05, REGION);
        assert_eq!(sim.sprites()[0].frame, start_frame);
        sim.tick(0.05, REGION);
        assert_eq!(sim.sprites()[0].frame, (start_frame + 1) % 4);
        for _ in 0..8 {
            sim.tick(0.05, REGION);
        }
        assert_eq!(sim.sprites()[0].frame, (start_frame + 5) % 4);
    }

    #[test]
    fn test_oscillation_does_not_affect_travel_state() {
        let mut sim = SpriteSimulator::new(rightward_config(), REGION);
        let spawn_row = sim.sprites()[0].pos.y;
        for _ in 0..30 {
            sim.tick(0.016, REGION);
            let sprite = sim.sprites()[0];
            let rendered = sim.render_position(&sprite);
            // 渲染位置在振幅内摆动，行进状态保持在出生行上
            assert!((rendered - sprite.pos).length() <= 5.0 + 1e-4);
            assert_eq!(sprite.pos.y, spawn_row);
        }

        // 多次查询渲染位置不改变任何状态
        let first = sim.render_position(&sim.sprites()[0]);
        let again = sim.render_position(&sim.sprites()[0]);
        assert_eq!(first, again);
    }

    #[test]
    fn test_perpendicular_oscillation() {
        let mut config = rightward_config();
        config.oscillation_amplitude = 8.0;
        let mut sim = SpriteSimulator::new(config, REGION);
        for _ in 0..10 {
            sim.tick(0.016, REGION);
            let sprite = sim.sprites()[0];
            let rendered = sim.render_position(&sprite);
            // 向右行进的精灵只在 y 方向摆动
            assert!((rendered.x - sprite.pos.x).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_frame_count_clamped() {
        let mut config = rightward_config();
        config.frame_count = 0;
        let mut sim = SpriteSimulator::new(config, REGION);
        for _ in 0..20 {
            sim.tick(0.1, REGION);
            assert_eq!(sim.sprites()[0].frame, 0);
        }
    }

    #[test]
    fn test_slot_count_is_fixed() {
        let mut sim = SpriteSimulator::new(
            SpriteEffectConfig {
                max_count: 5,
                seed: Some(2),
                ..Default::default()
            },
            REGION,
        );
        for _ in 0..500 {
            sim.tick(MAX_DELTA, REGION);
            assert_eq!(sim.sprites().len(), 5);
        }
    }
}
