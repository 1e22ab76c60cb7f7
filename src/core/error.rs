//! 统一错误处理模块
//!
//! 提供地图引擎范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **配置错误** (`config::ConfigError`): 配置文件读取与解析错误
//! - **遮罩错误** (`MaskError`): 遮罩图像读取与解码错误
//!
//! 注意：模拟热路径（每帧tick）不产生任何错误。所有退化输入
//! （零向量、反转的缩放边界、缺失的遮罩）在进入热路径前被替换
//! 为安全默认值，错误类型只出现在资源加载和配置解析路径上。

use thiserror::Error;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Mask error: {0}")]
    Mask(#[from] MaskError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("General error: {0}")]
    General(String),
}

/// 遮罩加载错误
#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to read mask: {path}, reason: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to decode mask image: {0}")]
    Decode(String),

    #[error("Mask image has zero dimensions")]
    EmptyImage,

    #[error("Invalid mask buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },
}

/// 引擎结果类型别名
pub type MapResult<T> = Result<T, MapError>;
pub type MaskResult<T> = Result<T, MaskError>;
