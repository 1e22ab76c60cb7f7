//! 坐标空间模块
//!
//! 世界坐标、归一化设备坐标（NDC）、屏幕像素与遮罩像素之间的
//! 纯函数映射，由当前视口（平移+缩放）和参考视野参数化。
//!
//! 约定：
//! - 世界坐标以内容中心为原点，y 轴向上
//! - NDC 范围 [-1, 1]，y 轴向上
//! - 屏幕坐标以左上角为原点，y 轴向下
//! - 遮罩坐标以左上角为原点，单位为遮罩像素
//!
//! 所有函数对退化输入（零尺寸、非有限值）返回安全默认值，
//! 不产生 NaN / Infinity。

use glam::Vec2;

/// 尺寸下限，防止除零
const MIN_EXTENT: f32 = 1e-4;
/// 缩放下限
const MIN_ZOOM: f32 = 1e-4;

/// 参考视野：zoom = 1.0 时可见区域的世界半宽/半高
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrustum {
    half_extents: Vec2,
}

impl ReferenceFrustum {
    /// 从 zoom = 1.0 时的可见宽高构造
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(
                sanitize_extent(width * 0.5),
                sanitize_extent(height * 0.5),
            ),
        }
    }

    /// 给定缩放下的可见半宽/半高
    pub fn half_extents(&self, zoom: f32) -> Vec2 {
        self.half_extents / sanitize_zoom(zoom)
    }
}

/// 内容边界：基础图像的世界尺寸，以原点为中心
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBounds {
    half_extents: Vec2,
}

impl ContentBounds {
    /// 从内容宽高构造，最小 1 个世界单位
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_extents: Vec2::new(
                sanitize_extent(width * 0.5).max(0.5),
                sanitize_extent(height * 0.5).max(0.5),
            ),
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }
}

fn sanitize_extent(v: f32) -> f32 {
    if v.is_finite() && v > MIN_EXTENT {
        v
    } else {
        MIN_EXTENT
    }
}

fn sanitize_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() && zoom > MIN_ZOOM {
        zoom
    } else {
        MIN_ZOOM
    }
}

/// 世界坐标 -> NDC
pub fn world_to_ndc(world: Vec2, pan: Vec2, zoom: f32, frustum: &ReferenceFrustum) -> Vec2 {
    (world - pan) / frustum.half_extents(zoom)
}

/// NDC -> 世界坐标
pub fn ndc_to_world(ndc: Vec2, pan: Vec2, zoom: f32, frustum: &ReferenceFrustum) -> Vec2 {
    pan + ndc * frustum.half_extents(zoom)
}

/// NDC -> 屏幕像素（左上原点，y 向下）
pub fn ndc_to_screen(ndc: Vec2, screen_size: Vec2) -> Vec2 {
    let size = screen_size.max(Vec2::splat(MIN_EXTENT));
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * size.x,
        (0.5 - ndc.y * 0.5) * size.y,
    )
}

/// 屏幕像素 -> NDC
pub fn screen_to_ndc(screen: Vec2, screen_size: Vec2) -> Vec2 {
    let size = screen_size.max(Vec2::splat(MIN_EXTENT));
    Vec2::new(
        screen.x / size.x * 2.0 - 1.0,
        1.0 - screen.y / size.y * 2.0,
    )
}

/// 世界坐标 -> 屏幕像素
pub fn world_to_screen(
    world: Vec2,
    pan: Vec2,
    zoom: f32,
    frustum: &ReferenceFrustum,
    screen_size: Vec2,
) -> Vec2 {
    ndc_to_screen(world_to_ndc(world, pan, zoom, frustum), screen_size)
}

/// 屏幕像素 -> 世界坐标
pub fn screen_to_world(
    screen: Vec2,
    pan: Vec2,
    zoom: f32,
    frustum: &ReferenceFrustum,
    screen_size: Vec2,
) -> Vec2 {
    ndc_to_world(screen_to_ndc(screen, screen_size), pan, zoom, frustum)
}

/// 屏幕像素位移 -> 世界位移（y 轴翻转）
///
/// 使用当前缩放下的视野范围换算，拖拽平移依赖此函数。
pub fn screen_delta_to_world(
    delta: Vec2,
    zoom: f32,
    frustum: &ReferenceFrustum,
    screen_size: Vec2,
) -> Vec2 {
    let size = screen_size.max(Vec2::splat(MIN_EXTENT));
    let half = frustum.half_extents(zoom);
    Vec2::new(
        delta.x / size.x * 2.0 * half.x,
        -delta.y / size.y * 2.0 * half.y,
    )
}

/// 区域坐标 -> 遮罩像素
///
/// 区域坐标是效果模拟器使用的局部坐标，范围 `[0, region) `，
/// 按比例映射到遮罩的原生像素尺寸。
pub fn region_to_mask(pos: Vec2, region: Vec2, mask_width: u32, mask_height: u32) -> Vec2 {
    let region = region.max(Vec2::ONE);
    Vec2::new(
        pos.x / region.x * mask_width as f32,
        pos.y / region.y * mask_height as f32,
    )
}

/// 单轴平移钳制
///
/// 保证给定缩放下的可见矩形落在内容边界内；内容在该轴上比
/// 视口窄时，平移收敛到 0（居中）。钳制区间退化（min >= max）
/// 同样收敛到 0。
pub fn clamp_pan_axis(pan: f32, content_half: f32, visible_half: f32) -> f32 {
    let limit = content_half - visible_half;
    if limit <= 0.0 {
        return 0.0;
    }
    if !pan.is_finite() {
        return 0.0;
    }
    pan.clamp(-limit, limit)
}

/// 坐标环绕到 `[0, size)`
///
/// 幂等：`wrap_coordinate(wrap_coordinate(x, s), s) == wrap_coordinate(x, s)`。
/// `size <= 0` 或非有限输入返回 0。
pub fn wrap_coordinate(x: f32, size: f32) -> f32 {
    if !(size > 0.0) || !x.is_finite() {
        return 0.0;
    }
    let mut wrapped = x % size;
    if wrapped < 0.0 {
        wrapped += size;
    }
    // 浮点边界：负小量取模后加 size 可能落在 size 上
    if wrapped >= size {
        wrapped = 0.0;
    }
    wrapped
}
