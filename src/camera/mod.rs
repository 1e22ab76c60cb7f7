//! 镜头模块
//!
//! 包含视口状态与手势驱动的镜头控制：
//! - `gesture` - 手势状态机与指针注册表
//! - `controller` - 手势识别、目标积分与边界钳制

pub mod controller;
pub mod gesture;

pub use controller::CameraController;
pub use gesture::{GestureState, PointerId, PointerRegistry};

use glam::Vec2;

/// 视口快照
///
/// 镜头的世界空间中心与缩放系数。每帧由 `CameraController` 产出
/// 一次，按值传给所有消费者（视差、效果模拟器、外部渲染器），
/// 消费者只读不写。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// 世界空间平移（镜头中心）
    pub pan: Vec2,
    /// 缩放系数，始终在配置的 `[min_zoom, max_zoom]` 内
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}
