//! 引擎主入口
//!
//! 定义 `MapEngine` 结构和每帧推进顺序。
//!
//! `MapEngine` 是活地图模拟核心的入口点，负责：
//! - 从 `MapConfig` 构建镜头控制器、视差图层与全部效果模拟器
//! - 每帧先积分镜头，产出本帧的视口快照
//! - 让所有模拟器在同一份快照与区域几何下推进
//! - 把视口与图层放置打包成 `FrameState` 交给外部渲染器
//!
//! 模拟是单逻辑线程的：外部驱动每帧调用一次 [`MapEngine::tick`]，
//! 路径上没有任何阻塞或挂起。遮罩加载在 tokio 任务中异步完成，
//! 每帧开头从槽位刷新到对应的模拟器。
//!
//! # 示例
//!
//! ```no_run
//! use living_map::config::MapConfig;
//! use living_map::core::MapEngine;
//!
//! let mut engine = MapEngine::new(MapConfig::load_or_default());
//! // 渲染循环中：
//! let frame = engine.tick(1.0 / 60.0);
//! for simulator in engine.particle_simulators() {
//!     for particle in simulator.particles() {
//!         // 投影 particle.pos / particle.alpha / particle.size 并绘制
//!     }
//! }
//! # let _ = frame;
//! ```

use std::path::PathBuf;

use glam::Vec2;

use crate::camera::{CameraController, PointerId, Viewport};
use crate::config::{self, MapConfig};
use crate::effects::{ParticleSimulator, SpriteSimulator};
use crate::mask::MaskLoader;
use crate::parallax::{self, ParallaxMode};
use crate::space::{ContentBounds, ReferenceFrustum};

/// 默认屏幕尺寸，宿主在首帧前调用 `set_screen_size` 覆盖
const DEFAULT_SCREEN_SIZE: Vec2 = Vec2::new(1280.0, 720.0);

/// 视差图层的每帧放置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPlacement {
    /// 图层深度索引
    pub depth: f32,
    /// 解析后的视差系数
    pub factor: f32,
    /// 本帧的世界偏移
    pub offset: Vec2,
    /// 本帧的均匀缩放
    pub scale: f32,
}

/// 每帧输出：渲染器投影所需的全部状态
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    /// 本帧视口快照
    pub viewport: Viewport,
    /// 按配置顺序的图层放置
    pub layers: Vec<LayerPlacement>,
}

/// 活地图模拟引擎
pub struct MapEngine {
    config: MapConfig,
    camera: CameraController,
    frustum: ReferenceFrustum,
    content: ContentBounds,
    region: Vec2,
    /// 预解析的 (深度, 视差系数)
    layer_factors: Vec<(f32, f32)>,
    particles: Vec<ParticleSimulator>,
    particle_masks: Vec<MaskLoader>,
    sprites: Vec<SpriteSimulator>,
}

impl MapEngine {
    /// 从配置构建引擎
    ///
    /// 配置先归一化（越界值静默钳制），再据此分配所有模拟器的
    /// 槽位数组。每个粒子效果配对一个独立的遮罩加载器。
    pub fn new(config: MapConfig) -> Self {
        let mut config = config;
        config.normalize();
        config::init_logging(&config.logging);

        let content = ContentBounds::new(config.content.width, config.content.height);
        let frustum = ReferenceFrustum::new(config.content.width, config.content.height);
        let region = content.size();

        let camera = CameraController::new(
            config.pan,
            config.zoom,
            frustum,
            content,
            DEFAULT_SCREEN_SIZE,
        );

        let layer_factors = config
            .parallax
            .layers
            .iter()
            .map(|layer| {
                (
                    layer.depth,
                    parallax::parallax_factor(
                        layer.depth,
                        config.parallax.base_depth,
                        config.parallax.intensity,
                        layer.parallax_factor,
                    ),
                )
            })
            .collect();

        let particles: Vec<ParticleSimulator> = config
            .particles
            .iter()
            .map(|effect| ParticleSimulator::new(effect.clone(), region))
            .collect();
        let particle_masks = (0..particles.len()).map(|_| MaskLoader::new()).collect();

        let sprites = config
            .sprites
            .iter()
            .map(|effect| SpriteSimulator::new(effect.clone(), region))
            .collect();

        tracing::info!(
            target: "engine",
            "Living map engine initialized: {} layers, {} particle effects, {} sprite effects",
            config.parallax.layers.len(),
            config.particles.len(),
            config.sprites.len()
        );

        Self {
            config,
            camera,
            frustum,
            content,
            region,
            layer_factors,
            particles,
            particle_masks,
            sprites,
        }
    }

    // ------------------------------------------------------------------
    // 每帧推进
    // ------------------------------------------------------------------

    /// 每帧调用一次
    ///
    /// 顺序固定：镜头积分 -> 视口快照 -> 刷新遮罩槽位 -> 推进全部
    /// 模拟器。所有模拟器读取的都是本帧刚产出的同一份快照。
    pub fn tick(&mut self, delta_time: f32) -> FrameState {
        let viewport = self.camera.tick(delta_time);

        for (simulator, loader) in self.particles.iter_mut().zip(&self.particle_masks) {
            simulator.set_mask(loader.slot().get());
            simulator.tick(delta_time, self.region);
        }
        for simulator in &mut self.sprites {
            simulator.tick(delta_time, self.region);
        }

        FrameState {
            viewport,
            layers: self.layer_placements(&viewport),
        }
    }

    fn layer_placements(&self, viewport: &Viewport) -> Vec<LayerPlacement> {
        self.layer_factors
            .iter()
            .map(|&(depth, factor)| LayerPlacement {
                depth,
                factor,
                offset: parallax::layer_position(
                    Vec2::ZERO,
                    factor,
                    viewport,
                    self.config.parallax.mode,
                    self.config.parallax.intensity,
                ),
                scale: parallax::layer_scale(factor, viewport.zoom, self.config.parallax.mode),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // 输入转发
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, id: PointerId, screen: Vec2) {
        self.camera.pointer_down(id, screen);
    }

    pub fn pointer_move(&mut self, id: PointerId, screen: Vec2) {
        self.camera.pointer_move(id, screen);
    }

    pub fn pointer_up(&mut self, id: PointerId) {
        self.camera.pointer_up(id);
    }

    pub fn wheel(&mut self, screen: Vec2, delta_y: f32) {
        self.camera.wheel(screen, delta_y);
    }

    /// 聚焦标记（世界坐标）
    pub fn focus_on(&mut self, world: Vec2, preferred_zoom: Option<f32>) {
        self.camera.focus_on(world, preferred_zoom);
    }

    /// 宿主窗口尺寸变化
    pub fn set_screen_size(&mut self, screen_size: Vec2) {
        self.camera.set_screen_size(screen_size);
    }

    /// 宿主布局变化时更新效果区域几何
    pub fn set_region(&mut self, region: Vec2) {
        self.region = region;
    }

    /// 订阅视口变更通知
    pub fn subscribe_viewport(&mut self) -> crossbeam_channel::Receiver<Viewport> {
        self.camera.subscribe_viewport()
    }

    // ------------------------------------------------------------------
    // 资源
    // ------------------------------------------------------------------

    /// 为指定粒子效果请求遮罩
    ///
    /// 返回请求是否被接受（索引越界时拒绝）。加载是异步的；完成前
    /// 该效果保持无约束行为，配置再次变更时过期结果被丢弃。
    pub fn request_particle_mask(&mut self, effect_index: usize, path: PathBuf) -> bool {
        match self.particle_masks.get(effect_index) {
            Some(loader) => {
                loader.request(path);
                true
            }
            None => {
                tracing::warn!(
                    target: "engine",
                    "Mask request for unknown particle effect {}",
                    effect_index
                );
                false
            }
        }
    }

    /// 清除指定粒子效果的遮罩
    pub fn clear_particle_mask(&mut self, effect_index: usize) {
        if let Some(loader) = self.particle_masks.get(effect_index) {
            loader.clear();
        }
    }

    // ------------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn particle_simulators(&self) -> &[ParticleSimulator] {
        &self.particles
    }

    pub fn sprite_simulators(&self) -> &[SpriteSimulator] {
        &self.sprites
    }

    pub fn region(&self) -> Vec2 {
        self.region
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// 图层几何体所需的最小放大（按配置的缩放区间求极值）
    ///
    /// 渲染器在装配图层网格时调用一次，保证极限平移/缩放下图层
    /// 不露出空边。
    pub fn layer_auto_scale(&self, layer_index: usize) -> Option<f32> {
        let &(_, factor) = self.layer_factors.get(layer_index)?;
        Some(parallax::auto_scale_factor(
            factor,
            &self.frustum,
            &self.content,
            self.config.zoom.min_zoom,
            self.config.zoom.max_zoom,
            self.config.parallax.mode,
        ))
    }

    /// 当前视差模式
    pub fn parallax_mode(&self) -> ParallaxMode {
        self.config.parallax.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParallaxConfig, ParallaxLayerConfig};
    use crate::effects::{ParticleEffectConfig, SpriteEffectConfig};

    fn engine_config() -> MapConfig {
        MapConfig {
            parallax: ParallaxConfig {
                intensity: 0.2,
                layers: vec![
                    ParallaxLayerConfig {
                        depth: 0.0,
                        parallax_factor: None,
                    },
                    ParallaxLayerConfig {
                        depth: 2.0,
                        parallax_factor: None,
                    },
                ],
                ..Default::default()
            },
            particles: vec![ParticleEffectConfig {
                max_count: 4,
                seed: Some(1),
                ..Default::default()
            }],
            sprites: vec![SpriteEffectConfig {
                max_count: 2,
                seed: Some(2),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_tick_produces_frame_state() {
        let mut engine = MapEngine::new(engine_config());
        let frame = engine.tick(1.0 / 60.0);
        assert_eq!(frame.layers.len(), 2);
        assert_eq!(engine.particle_simulators().len(), 1);
        assert_eq!(engine.particle_simulators()[0].particles().len(), 4);
        assert_eq!(engine.sprite_simulators()[0].sprites().len(), 2);
        // 基准深度图层：无视差
        assert_eq!(frame.layers[0].factor, 1.0);
        assert_eq!(frame.layers[0].offset, Vec2::ZERO);
    }

    #[test]
    fn test_focus_moves_viewport_toward_marker() {
        let mut engine = MapEngine::new(engine_config());
        engine.focus_on(Vec2::new(300.0, 150.0), Some(2.0));
        let mut distance = f32::MAX;
        for _ in 0..300 {
            let frame = engine.tick(1.0 / 60.0);
            let current = (frame.viewport.pan - Vec2::new(300.0, 150.0)).length();
            assert!(current <= distance + 1e-3, "focus must converge monotonically");
            distance = current;
        }
        assert!(distance < 1.0);
    }

    #[test]
    fn test_parallax_layers_react_to_pan() {
        let mut engine = MapEngine::new(engine_config());
        // zoom = 1 时全图可见、平移被钳到 0，先聚焦并放大
        engine.focus_on(Vec2::new(400.0, 0.0), Some(2.0));
        for _ in 0..300 {
            engine.tick(1.0 / 60.0);
        }
        let frame = engine.tick(1.0 / 60.0);
        // 深度 2、强度 0.2 -> 系数 1.4：图层随平移反向偏移
        assert!((frame.layers[1].factor - 1.4).abs() < 1e-5);
        assert!(frame.layers[1].offset.x < 0.0);
    }

    #[test]
    fn test_mask_request_rejects_unknown_effect() {
        let mut engine = MapEngine::new(engine_config());
        assert!(!engine.request_particle_mask(5, PathBuf::from("mask.png")));
    }

    #[test]
    fn test_layer_auto_scale_bounds() {
        let engine = MapEngine::new(engine_config());
        // 基准图层无需放大
        let base = engine.layer_auto_scale(0).unwrap();
        assert!(base >= 1.0);
        let deep = engine.layer_auto_scale(1).unwrap();
        assert!(deep >= base);
        assert!(engine.layer_auto_scale(9).is_none());
    }

    #[test]
    fn test_viewport_subscription_via_engine() {
        let mut engine = MapEngine::new(engine_config());
        let receiver = engine.subscribe_viewport();
        engine.wheel(Vec2::new(640.0, 360.0), -100.0);
        engine.tick(1.0 / 60.0);
        assert!(receiver.try_recv().is_ok());
    }
}
