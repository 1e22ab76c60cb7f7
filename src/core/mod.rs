//! 核心模块
//!
//! 包含引擎的核心功能：
//! - `engine` - 主引擎入口和每帧推进顺序
//! - `error` - 错误类型定义
//! - `macros` - 共享宏

pub mod engine;
pub mod error;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{MapError, MapResult, MaskError, MaskResult};

// 重新导出主要类型
pub use engine::{FrameState, LayerPlacement, MapEngine};
