/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和静默钳制。
///
/// 与错误处理的分工：结构性问题（文件不可读、语法错误）作为
/// [`ConfigError`] 返回；数值越界（缩放边界反转、初始缩放出界、
/// 阈值超出 [0,1]）在 `normalize()` 中静默钳制，从不拒绝。
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::effects::{ParticleEffectConfig, SpriteEffectConfig};
use crate::impl_default;
use crate::parallax::ParallaxMode;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 地图主配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapConfig {
    /// 内容几何
    #[serde(default)]
    pub content: ContentConfig,

    /// 平移配置
    #[serde(default)]
    pub pan: PanConfig,

    /// 缩放配置
    #[serde(default)]
    pub zoom: ZoomConfig,

    /// 视差配置
    #[serde(default)]
    pub parallax: ParallaxConfig,

    /// 粒子效果列表
    #[serde(default)]
    pub particles: Vec<ParticleEffectConfig>,

    /// 精灵效果列表
    #[serde(default)]
    pub sprites: Vec<SpriteEffectConfig>,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MapConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        // 内容几何
        if let Ok(val) = env::var("LIVING_MAP_CONTENT_WIDTH") {
            if let Ok(width) = val.parse() {
                self.content.width = width;
            }
        }
        if let Ok(val) = env::var("LIVING_MAP_CONTENT_HEIGHT") {
            if let Ok(height) = val.parse() {
                self.content.height = height;
            }
        }

        // 平移/缩放
        if let Ok(val) = env::var("LIVING_MAP_PAN_ENABLED") {
            self.pan.enabled = val.parse().unwrap_or(self.pan.enabled);
        }
        if let Ok(val) = env::var("LIVING_MAP_ZOOM_ENABLED") {
            self.zoom.enabled = val.parse().unwrap_or(self.zoom.enabled);
        }
        if let Ok(val) = env::var("LIVING_MAP_MIN_ZOOM") {
            if let Ok(zoom) = val.parse() {
                self.zoom.min_zoom = zoom;
            }
        }
        if let Ok(val) = env::var("LIVING_MAP_MAX_ZOOM") {
            if let Ok(zoom) = val.parse() {
                self.zoom.max_zoom = zoom;
            }
        }
        if let Ok(val) = env::var("LIVING_MAP_INITIAL_ZOOM") {
            if let Ok(zoom) = val.parse() {
                self.zoom.initial_zoom = zoom;
            }
        }

        // 视差
        if let Ok(val) = env::var("LIVING_MAP_PARALLAX_INTENSITY") {
            if let Ok(intensity) = val.parse() {
                self.parallax.intensity = intensity;
            }
        }
    }

    /// 归一化全部数值参数（静默钳制，见模块文档）
    pub fn normalize(&mut self) {
        self.content.normalize();
        self.pan.normalize();
        self.zoom.normalize();
        self.parallax.normalize();
        for particle in &mut self.particles {
            particle.normalize();
        }
        for sprite in &mut self.sprites {
            sprite.normalize();
        }
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./living_map.toml
    /// 2. ./living_map.json
    /// 3. ~/.config/living_map/config.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("living_map.toml") {
            tracing::info!(target: "config", "Loaded config from living_map.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("living_map.json") {
            tracing::info!(target: "config", "Loaded config from living_map.json");
            return config;
        }

        if let Some(home) = env::var_os("HOME") {
            let config_path = PathBuf::from(home)
                .join(".config")
                .join("living_map")
                .join("config.toml");

            if let Ok(config) = Self::from_toml_file(&config_path) {
                tracing::info!(target: "config", "Loaded config from {:?}", config_path);
                return config;
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }
}

/// 内容几何：基础图像的世界尺寸
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContentConfig {
    pub width: f32,
    pub height: f32,
}

impl_default!(ContentConfig {
    width: 2048.0,
    height: 1024.0,
});

impl ContentConfig {
    fn normalize(&mut self) {
        if !self.width.is_finite() || self.width < 1.0 {
            self.width = 1.0;
        }
        if !self.height.is_finite() || self.height < 1.0 {
            self.height = 1.0;
        }
    }
}

/// 平移配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanConfig {
    /// 是否启用拖拽平移
    pub enabled: bool,
    /// 每帧向目标逼近的比例
    pub easing_factor: f32,
}

impl_default!(PanConfig {
    enabled: true,
    easing_factor: 0.15,
});

impl PanConfig {
    fn normalize(&mut self) {
        if !self.easing_factor.is_finite()
            || self.easing_factor <= 0.0
            || self.easing_factor > 1.0
        {
            self.easing_factor = 0.15;
        }
    }

    /// 归一化后的副本
    pub fn normalized(&self) -> Self {
        let mut copy = *self;
        copy.normalize();
        copy
    }
}

/// 缩放配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// 是否启用捏合/滚轮缩放
    pub enabled: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub initial_zoom: f32,
    /// 滚轮增量到缩放比例的系数
    pub scroll_speed: f32,
    /// 每帧向目标逼近的比例
    pub easing_factor: f32,
}

impl_default!(ZoomConfig {
    enabled: true,
    min_zoom: 1.0,
    max_zoom: 4.0,
    initial_zoom: 1.0,
    scroll_speed: 0.001,
    easing_factor: 0.15,
});

impl ZoomConfig {
    fn normalize(&mut self) {
        if !self.min_zoom.is_finite() || self.min_zoom <= 0.0 {
            self.min_zoom = 1.0;
        }
        if !self.max_zoom.is_finite() || self.max_zoom <= 0.0 {
            self.max_zoom = 4.0;
        }
        // 边界反转：静默交换
        if self.min_zoom > self.max_zoom {
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if !self.initial_zoom.is_finite() {
            self.initial_zoom = self.min_zoom;
        }
        // 初始缩放出界：钳入边界
        self.initial_zoom = self.initial_zoom.clamp(self.min_zoom, self.max_zoom);
        if !self.scroll_speed.is_finite() || self.scroll_speed < 0.0 {
            self.scroll_speed = 0.001;
        }
        if !self.easing_factor.is_finite()
            || self.easing_factor <= 0.0
            || self.easing_factor > 1.0
        {
            self.easing_factor = 0.15;
        }
    }

    /// 归一化后的副本
    pub fn normalized(&self) -> Self {
        let mut copy = *self;
        copy.normalize();
        copy
    }
}

/// 视差图层配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParallaxLayerConfig {
    /// 图层深度索引
    pub depth: f32,
    /// 显式视差系数，覆盖按深度推导的值
    #[serde(default)]
    pub parallax_factor: Option<f32>,
}

/// 视差配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallaxConfig {
    /// 全局强度
    pub intensity: f32,
    /// 视差模式
    pub mode: ParallaxMode,
    /// 基准深度（该深度的图层随镜头等速移动）
    #[serde(default)]
    pub base_depth: f32,
    /// 图层列表
    #[serde(default)]
    pub layers: Vec<ParallaxLayerConfig>,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            intensity: 0.1,
            mode: ParallaxMode::Depth,
            base_depth: 0.0,
            layers: Vec::new(),
        }
    }
}

impl ParallaxConfig {
    fn normalize(&mut self) {
        if !self.intensity.is_finite() {
            self.intensity = 0.1;
        }
        if !self.base_depth.is_finite() {
            self.base_depth = 0.0;
        }
        for layer in &mut self.layers {
            if !layer.depth.is_finite() {
                layer.depth = self.base_depth;
            }
            if let Some(factor) = layer.parallax_factor {
                if !factor.is_finite() {
                    layer.parallax_factor = None;
                }
            }
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 初始化日志系统
///
/// 配置tracing日志框架；`RUST_LOG` 环境变量优先于配置中的级别。
/// 重复调用是无操作。
pub fn init_logging(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
