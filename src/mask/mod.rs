//! 遮罩采样模块
//!
//! 把灰度/RGB遮罩图像一次性栅格化为像素缓冲，之后按最近像素
//! 采样指定通道，输出归一化到 [0, 1]。不做插值——在典型的遮罩
//! 分辨率下最近像素已经足够，并且采样保持 O(1)。
//!
//! 采样器构造后不可变，可以放进 `Arc` 在模拟器之间共享。

pub mod loader;

pub use loader::{MaskLoader, MaskSlot};

use crate::core::error::{MaskError, MaskResult};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 遮罩通道选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaskChannel {
    #[default]
    R,
    G,
    B,
}

impl MaskChannel {
    fn offset(self) -> usize {
        match self {
            MaskChannel::R => 0,
            MaskChannel::G => 1,
            MaskChannel::B => 2,
        }
    }
}

/// 栅格化的遮罩图像
///
/// RGBA 字节缓冲，尺寸为图像原生像素尺寸。
#[derive(Debug, Clone)]
pub struct MaskSampler {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl MaskSampler {
    /// 从编码后的图像字节解码（PNG/JPEG）
    pub fn from_bytes(bytes: &[u8]) -> MaskResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| MaskError::Decode(e.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(MaskError::EmptyImage);
        }
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// 从已有的 RGBA 缓冲构造（测试与程序化遮罩）
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> MaskResult<Self> {
        if width == 0 || height == 0 {
            return Err(MaskError::EmptyImage);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(MaskError::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 按遮罩像素坐标采样通道，返回 [0, 1]
    ///
    /// 坐标钳制到 `[0, width-1] x [0, height-1]` 后向下取整；
    /// 非有限输入按 0 处理。
    pub fn sample(&self, x: f32, y: f32, channel: MaskChannel) -> f32 {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        let px = x.clamp(0.0, (self.width - 1) as f32).floor() as usize;
        let py = y.clamp(0.0, (self.height - 1) as f32).floor() as usize;
        let index = (py * self.width as usize + px) * 4 + channel.offset();
        f32::from(self.pixels[index]) / 255.0
    }

    /// 按区域坐标采样：区域 `[0, region)` 映射到遮罩原生尺寸
    pub fn sample_region(&self, pos: Vec2, region: Vec2, channel: MaskChannel) -> f32 {
        let mask_pos = crate::space::region_to_mask(pos, region, self.width, self.height);
        self.sample(mask_pos.x, mask_pos.y, channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 测试遮罩：左上白、右上灰、左下黑、右下绿
    fn checker() -> MaskSampler {
        #[rustfmt::skip]
        let pixels = vec![
            255, 255, 255, 255,   128, 128, 128, 255,
            0, 0, 0, 255,         0, 255, 0, 255,
        ];
        MaskSampler::from_rgba(2, 2, pixels).unwrap()
    }

    #[test]
    fn test_sample_channels() {
        let mask = checker();
        assert_eq!(mask.sample(0.0, 0.0, MaskChannel::R), 1.0);
        assert!((mask.sample(1.0, 0.0, MaskChannel::R) - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(mask.sample(0.0, 1.0, MaskChannel::G), 0.0);
        assert_eq!(mask.sample(1.0, 1.0, MaskChannel::G), 1.0);
        assert_eq!(mask.sample(1.0, 1.0, MaskChannel::B), 0.0);
    }

    #[test]
    fn test_sample_clamps_out_of_range() {
        let mask = checker();
        // 越界坐标钳制到边缘像素
        assert_eq!(mask.sample(-10.0, -10.0, MaskChannel::R), 1.0);
        assert_eq!(mask.sample(100.0, 100.0, MaskChannel::G), 1.0);
        // 非有限输入按 0 处理
        assert_eq!(mask.sample(f32::NAN, f32::NAN, MaskChannel::R), 1.0);
    }

    #[test]
    fn test_sample_floors_to_pixel() {
        let mask = checker();
        // (0.9, 0.9) 仍在左上像素内
        assert_eq!(mask.sample(0.9, 0.9, MaskChannel::R), 1.0);
    }

    #[test]
    fn test_sample_region_mapping() {
        let mask = checker();
        let region = Vec2::new(100.0, 100.0);
        // 区域右下角落在遮罩右下像素
        assert_eq!(
            mask.sample_region(Vec2::new(99.0, 99.0), region, MaskChannel::G),
            1.0
        );
        assert_eq!(
            mask.sample_region(Vec2::new(1.0, 1.0), region, MaskChannel::R),
            1.0
        );
    }

    #[test]
    fn test_from_rgba_validates_buffer() {
        assert!(matches!(
            MaskSampler::from_rgba(2, 2, vec![0; 3]),
            Err(MaskError::InvalidBuffer { .. })
        ));
        assert!(matches!(
            MaskSampler::from_rgba(0, 2, vec![]),
            Err(MaskError::EmptyImage)
        ));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            MaskSampler::from_bytes(&[1, 2, 3, 4]),
            Err(MaskError::Decode(_))
        ));
    }
}
