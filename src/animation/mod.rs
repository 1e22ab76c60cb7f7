//! 动画模块
//!
//! 包含缓动函数解析与求值：
//! - `easing` - 预设与三次贝塞尔缓动曲线

pub mod easing;

pub use easing::{CubicBezier, Easing, EasingConfig, EasingPreset};
