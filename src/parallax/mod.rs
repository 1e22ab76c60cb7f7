//! 视差深度模型
//!
//! 根据图层深度与全局强度计算视差系数，并由此得出每帧的图层
//! 偏移与缩放。系数 1.0 表示无视差（随镜头等速移动）；系数偏离
//! 1.0 的图层在平移时滞后或超前，模拟景深。
//!
//! `auto_scale_factor` 解决视差的经典边缘问题：滞后的图层在极限
//! 平移/缩放下会露出空边，除非几何体预先放大。该函数在缩放区间
//! 两端各求一次所需放大，取较大者。

use crate::camera::Viewport;
use crate::space::{ContentBounds, ReferenceFrustum};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Drift 模式下缩放耦合漂移的系数
pub const DRIFT_ZOOM_COUPLING: f32 = 0.05;

const MIN_SCALE: f32 = 1e-4;

/// 视差模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParallaxMode {
    /// 景深模式：视差附加随缩放变化的均匀缩放
    #[default]
    Depth,
    /// 漂移模式：视差附加小幅缩放耦合漂移
    Drift,
}

/// 图层视差系数
///
/// `layer_depth == base_depth` 时恒为 1.0；显式覆盖优先；否则
/// 按 `1 + (layer_depth - base_depth) * intensity` 推导。
pub fn parallax_factor(
    layer_depth: f32,
    base_depth: f32,
    intensity: f32,
    explicit: Option<f32>,
) -> f32 {
    if (layer_depth - base_depth).abs() < f32::EPSILON {
        return 1.0;
    }
    if let Some(factor) = explicit {
        return factor;
    }
    1.0 + (layer_depth - base_depth) * intensity
}

/// 图层的每帧世界偏移
///
/// `layer_pos = base_pos + pan * (1 - factor)`；Drift 模式再叠加
/// 缩放耦合的漂移项。
pub fn layer_position(
    base_pos: Vec2,
    factor: f32,
    viewport: &Viewport,
    mode: ParallaxMode,
    intensity: f32,
) -> Vec2 {
    let mut pos = base_pos + viewport.pan * (1.0 - factor);
    if mode == ParallaxMode::Drift {
        pos += Vec2::splat((viewport.zoom - 1.0) * intensity * DRIFT_ZOOM_COUPLING);
    }
    pos
}

/// 图层的每帧均匀缩放
///
/// Depth 模式下为 `layer_zoom_factor / viewport_zoom`，其中
/// `layer_zoom_factor = 1 + (zoom - 1) * factor`，模拟景深带来的
/// 缩放差；Drift 模式不缩放。
pub fn layer_scale(factor: f32, viewport_zoom: f32, mode: ParallaxMode) -> f32 {
    match mode {
        ParallaxMode::Depth => {
            let zoom = viewport_zoom.max(MIN_SCALE);
            (1.0 + (zoom - 1.0) * factor) / zoom
        }
        ParallaxMode::Drift => 1.0,
    }
}

/// 图层几何体所需的最小放大
///
/// 在 `min_zoom` 与 `max_zoom` 两端分别计算：该缩放下的可见半径
/// 加上最大平移引起的图层位移，除以图层实际覆盖的半径，二者取
/// 较大值，且不小于 1.0。
pub fn auto_scale_factor(
    factor: f32,
    frustum: &ReferenceFrustum,
    content: &ContentBounds,
    min_zoom: f32,
    max_zoom: f32,
    mode: ParallaxMode,
) -> f32 {
    let required_at = |zoom: f32| -> f32 {
        let visible = frustum.half_extents(zoom);
        let depth_scale = layer_scale(factor, zoom, mode).max(MIN_SCALE);
        let axis = |content_half: f32, visible_half: f32| -> f32 {
            let max_pan = (content_half - visible_half).max(0.0);
            let needed = visible_half + max_pan * (1.0 - factor).abs();
            needed / (content_half * depth_scale).max(MIN_SCALE)
        };
        axis(content.half_extents().x, visible.x).max(axis(content.half_extents().y, visible.y))
    };

    required_at(min_zoom).max(required_at(max_zoom)).max(1.0)
}
