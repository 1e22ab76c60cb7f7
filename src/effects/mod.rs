//! 程序化效果模块
//!
//! 遮罩约束的粒子场与漫游精灵模拟器：
//! - `particles` - 原地循环的粒子（闪烁/漂移/辉光）
//! - `sprites` - 定向穿越的漫游精灵（飞鸟）
//!
//! 两类模拟器共享同一套槽位纪律：实例数组在配置时按 `max_count`
//! 一次性分配，之后只原地重生（覆盖槽位数据），从不单独释放，
//! 热路径稳态零分配。

pub mod particles;
pub mod sprites;

pub use particles::{ParticleEffectConfig, ParticleInstance, ParticleMode, ParticleSimulator};
pub use sprites::{SpriteEffectConfig, SpriteInstance, SpriteSimulator};

use crate::impl_default;
use crate::mask::{MaskChannel, MaskSampler};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 帧间隔上限（秒）
///
/// 每个模拟器在使用 `delta_time` 前先钳制到该值，防止停滞帧
/// （标签页切到后台、调试器暂停）之后的一步把漂移粒子或精灵
/// 直接跳过整个区域。这是正确性要求而非优化。
pub const MAX_DELTA: f32 = 0.1;

/// 遮罩拒绝采样的尝试次数上限
pub const SPAWN_ATTEMPTS: usize = 30;

/// 时长下限（秒），防止除零
pub(crate) const MIN_DURATION: f32 = 0.001;

/// 遮罩行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaskBehavior {
    /// 不使用遮罩
    #[default]
    None,
    /// 仅出生位置受遮罩约束
    Spawn,
    /// 仅存活位置受遮罩约束
    Constrain,
    /// 出生与存活都受约束
    Both,
}

impl MaskBehavior {
    /// 出生位置是否做遮罩检查
    pub fn checks_spawn(self) -> bool {
        matches!(self, MaskBehavior::Spawn | MaskBehavior::Both)
    }

    /// 存活位置是否做遮罩检查
    pub fn constrains(self) -> bool {
        matches!(self, MaskBehavior::Constrain | MaskBehavior::Both)
    }
}

/// 效果的遮罩参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskParams {
    #[serde(default)]
    pub behavior: MaskBehavior,
    #[serde(default)]
    pub channel: MaskChannel,
    #[serde(default = "default_mask_threshold")]
    pub threshold: f32,
}

fn default_mask_threshold() -> f32 {
    0.5
}

impl_default!(MaskParams {
    behavior: MaskBehavior::None,
    channel: MaskChannel::R,
    threshold: 0.5,
});

impl MaskParams {
    /// 钳制阈值到 [0, 1]
    pub(crate) fn normalize(&mut self) {
        if !self.threshold.is_finite() {
            self.threshold = 0.5;
        }
        self.threshold = self.threshold.clamp(0.0, 1.0);
    }
}

/// 钳制帧间隔：非有限或为负时按 0 处理
pub(crate) fn cap_delta(delta_time: f32) -> f32 {
    if !delta_time.is_finite() || delta_time <= 0.0 {
        return 0.0;
    }
    delta_time.min(MAX_DELTA)
}

/// 区域尺寸消毒：每轴最小 1 像素
pub(crate) fn sanitize_region(region: Vec2) -> Vec2 {
    Vec2::new(
        if region.x.is_finite() { region.x.max(1.0) } else { 1.0 },
        if region.y.is_finite() { region.y.max(1.0) } else { 1.0 },
    )
}

/// 区域内的随机位置
pub(crate) fn random_position<R: Rng>(rng: &mut R, region: Vec2) -> Vec2 {
    Vec2::new(
        rng.gen_range(0.0..region.x),
        rng.gen_range(0.0..region.y),
    )
}

/// 遮罩约束下的出生位置（拒绝采样）
///
/// 至多尝试 `SPAWN_ATTEMPTS` 个随机位置，接受第一个遮罩采样
/// 达到阈值的；全部失败时无条件接受最后一个候选，保证出生
/// 永不饿死（全零遮罩也能产出粒子）。
pub(crate) fn sample_masked_position<R: Rng>(
    rng: &mut R,
    region: Vec2,
    mask: Option<&MaskSampler>,
    params: &MaskParams,
    check: bool,
) -> Vec2 {
    let mask = match (check, mask) {
        (true, Some(mask)) => mask,
        _ => return random_position(rng, region),
    };

    let mut candidate = random_position(rng, region);
    for _ in 0..SPAWN_ATTEMPTS {
        if mask.sample_region(candidate, region, params.channel) >= params.threshold {
            return candidate;
        }
        candidate = random_position(rng, region);
    }
    candidate
}

/// 基准方向旋转随机角度
///
/// 零长度的基准方向替换为单位向量（+X）；方差非正时不旋转。
pub(crate) fn vary_direction<R: Rng>(rng: &mut R, base: Vec2, variance: f32) -> Vec2 {
    let base = if base.length_squared() < 1e-12 {
        Vec2::X
    } else {
        base.normalize()
    };
    if !(variance > 0.0) {
        return base;
    }
    let angle = rng.gen_range(-variance..variance);
    Vec2::from_angle(angle).rotate(base)
}

/// 随机方差系数：`1 ± variance`，下限 0.01
pub(crate) fn variance_factor<R: Rng>(rng: &mut R, variance: f32) -> f32 {
    if !(variance > 0.0) {
        return 1.0;
    }
    (1.0 + rng.gen_range(-variance..variance)).max(0.01)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cap_delta() {
        assert_eq!(cap_delta(0.016), 0.016);
        assert_eq!(cap_delta(5.0), MAX_DELTA);
        assert_eq!(cap_delta(-1.0), 0.0);
        assert_eq!(cap_delta(f32::NAN), 0.0);
        assert_eq!(cap_delta(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_sanitize_region() {
        assert_eq!(sanitize_region(Vec2::new(100.0, 50.0)), Vec2::new(100.0, 50.0));
        assert_eq!(sanitize_region(Vec2::new(0.0, -5.0)), Vec2::ONE);
        assert_eq!(sanitize_region(Vec2::new(f32::NAN, 10.0)), Vec2::new(1.0, 10.0));
    }

    #[test]
    fn test_vary_direction_degenerate_base() {
        let mut rng = StdRng::seed_from_u64(7);
        let dir = vary_direction(&mut rng, Vec2::ZERO, 0.0);
        assert_eq!(dir, Vec2::X);
    }

    #[test]
    fn test_vary_direction_is_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let dir = vary_direction(&mut rng, Vec2::new(3.0, -4.0), 1.2);
            assert!((dir.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_all_zero_mask_still_spawns() {
        let mut rng = StdRng::seed_from_u64(1);
        let mask = MaskSampler::from_rgba(4, 4, vec![0; 4 * 4 * 4]).unwrap();
        let params = MaskParams {
            behavior: MaskBehavior::Both,
            channel: MaskChannel::R,
            threshold: 0.1,
        };
        let region = Vec2::new(100.0, 100.0);
        // 30 次尝试全部失败后仍必须产出位置（回退接受路径）
        let pos = sample_masked_position(&mut rng, region, Some(&mask), &params, true);
        assert!(pos.x >= 0.0 && pos.x < region.x);
        assert!(pos.y >= 0.0 && pos.y < region.y);
    }

    #[test]
    fn test_masked_spawn_prefers_bright_pixels() {
        let mut rng = StdRng::seed_from_u64(42);
        // 左半黑右半白的 2x1 遮罩
        let mask = MaskSampler::from_rgba(
            2,
            1,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        )
        .unwrap();
        let params = MaskParams {
            behavior: MaskBehavior::Spawn,
            channel: MaskChannel::R,
            threshold: 0.9,
        };
        let region = Vec2::new(100.0, 100.0);
        for _ in 0..50 {
            let pos = sample_masked_position(&mut rng, region, Some(&mask), &params, true);
            // 右半区域才能通过阈值（回退路径在该遮罩下概率可忽略）
            assert!(pos.x >= 50.0, "spawned at {:?}", pos);
        }
    }
}
