//! 镜头控制器
//!
//! 把指针/滚轮/聚焦输入识别为手势，产出目标平移与缩放，并在每帧
//! 把当前视口向目标积分。积分使用指数平滑（当前值向目标值按固定
//! 比例逼近），保证无超调收敛。
//!
//! 注意：平滑系数未按帧间隔缩放，收敛速率隐含地按固定tick频率
//! 标定；帧率无关的版本应以 `1 - exp(-k * dt)` 替换固定系数。
//!
//! 平移与缩放的积分方式不同：缩放始终经过 目标/当前 分离平滑，
//! 拖拽平移则直接写目标值（只钳制，不平滑），松手后当前值继续
//! 向目标收敛。

use glam::Vec2;

use super::gesture::{GestureState, PointerId, PointerRegistry};
use super::Viewport;
use crate::config::{PanConfig, ZoomConfig};
use crate::space::{self, ContentBounds, ReferenceFrustum};

/// 缩放积分的跳过阈值
const ZOOM_SNAP_EPSILON: f32 = 0.001;
/// 平移积分的跳过阈值（每轴）
const PAN_SNAP_EPSILON: f32 = 0.01;
/// 捏合基线的最小间距，低于此值的基线被忽略
const MIN_PINCH_DISTANCE: f32 = 1e-3;
/// 滚轮缩放比例的下限，防止反向/归零
const MIN_WHEEL_SCALE: f32 = 0.01;

/// 镜头控制器
pub struct CameraController {
    viewport: Viewport,
    target_pan: Vec2,
    target_zoom: f32,
    gesture: GestureState,
    pointers: PointerRegistry,
    pan_cfg: PanConfig,
    zoom_cfg: ZoomConfig,
    frustum: ReferenceFrustum,
    content: ContentBounds,
    screen_size: Vec2,
    subscribers: Vec<crossbeam_channel::Sender<Viewport>>,
}

impl CameraController {
    pub fn new(
        pan_cfg: PanConfig,
        zoom_cfg: ZoomConfig,
        frustum: ReferenceFrustum,
        content: ContentBounds,
        screen_size: Vec2,
    ) -> Self {
        let pan_cfg = pan_cfg.normalized();
        let zoom_cfg = zoom_cfg.normalized();
        let initial_zoom = zoom_cfg.initial_zoom;
        let mut controller = Self {
            viewport: Viewport {
                pan: Vec2::ZERO,
                zoom: initial_zoom,
            },
            target_pan: Vec2::ZERO,
            target_zoom: initial_zoom,
            gesture: GestureState::Idle,
            pointers: PointerRegistry::new(),
            pan_cfg,
            zoom_cfg,
            frustum,
            content,
            screen_size: screen_size.max(Vec2::ONE),
            subscribers: Vec::new(),
        };
        controller.clamp_target_pan();
        controller.viewport.pan = controller.target_pan;
        controller
    }

    // ------------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------------

    /// 当前视口快照
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn target_pan(&self) -> Vec2 {
        self.target_pan
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// 订阅视口变更通知
    ///
    /// 每当积分实际移动了视口，订阅者收到一份快照。断开的订阅者
    /// 在下次通知时被移除。
    pub fn subscribe_viewport(&mut self) -> crossbeam_channel::Receiver<Viewport> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// 更新屏幕像素尺寸（宿主窗口变化时调用）
    pub fn set_screen_size(&mut self, screen_size: Vec2) {
        self.screen_size = screen_size.max(Vec2::ONE);
    }

    // ------------------------------------------------------------------
    // 输入事件
    // ------------------------------------------------------------------

    /// 指针按下
    pub fn pointer_down(&mut self, id: PointerId, screen: Vec2) {
        if self.gesture.is_focus_animating() {
            // 任何按下都打断聚焦动画
            tracing::debug!(target: "camera", "Focus animation interrupted by pointer down");
            self.gesture = GestureState::Idle;
        }

        self.pointers.register(id, screen);

        match self.pointers.len() {
            2 if self.zoom_cfg.enabled => {
                if let Some((_, distance)) = self.pointers.pinch_midpoint_and_distance() {
                    if distance > MIN_PINCH_DISTANCE {
                        // 捏合开始：丢弃拖拽状态，记录基线
                        self.gesture = GestureState::Pinching {
                            initial_distance: distance,
                            initial_zoom: self.target_zoom,
                        };
                    }
                }
            }
            1 if self.pan_cfg.enabled => {
                self.gesture = GestureState::Panning {
                    last_screen: screen,
                };
            }
            _ => {}
        }
    }

    /// 指针移动
    pub fn pointer_move(&mut self, id: PointerId, screen: Vec2) {
        if !self.pointers.update(id, screen) {
            // 没有匹配按下事件的移动：无操作
            return;
        }

        match self.gesture {
            GestureState::Pinching {
                initial_distance,
                initial_zoom,
            } => {
                if let Some((midpoint, distance)) = self.pointers.pinch_midpoint_and_distance() {
                    if initial_distance > MIN_PINCH_DISTANCE && distance > MIN_PINCH_DISTANCE {
                        let ratio = distance / initial_distance;
                        let new_zoom = self.clamp_zoom(initial_zoom * ratio);
                        self.zoom_about(midpoint, new_zoom);
                    }
                }
            }
            GestureState::Panning { last_screen } => {
                // 只有最早注册的指针驱动平移
                if self.pointers.first().map(|(pid, _)| pid) != Some(id) {
                    return;
                }
                let delta = screen - last_screen;
                // 用当前（而非目标）缩放下的视野换算：拖拽跟手
                let world_delta = space::screen_delta_to_world(
                    delta,
                    self.viewport.zoom,
                    &self.frustum,
                    self.screen_size,
                );
                self.target_pan -= world_delta;
                self.clamp_target_pan();
                self.gesture = GestureState::Panning {
                    last_screen: screen,
                };
            }
            GestureState::Idle | GestureState::FocusAnimating { .. } => {}
        }
    }

    /// 指针抬起
    pub fn pointer_up(&mut self, id: PointerId) {
        if !self.pointers.remove(id) {
            // 没有匹配按下事件的抬起：无操作
            return;
        }

        let was_pinching = matches!(self.gesture, GestureState::Pinching { .. });
        match self.pointers.len() {
            1 if was_pinching && self.pan_cfg.enabled => {
                // 捏合结束、剩一个指针：无缝转入拖拽
                if let Some((_, screen)) = self.pointers.first() {
                    self.gesture = GestureState::Panning {
                        last_screen: screen,
                    };
                }
            }
            0 => {
                self.gesture = GestureState::Idle;
            }
            _ => {
                if was_pinching && self.pointers.len() < 2 {
                    self.gesture = GestureState::Idle;
                }
            }
        }
    }

    /// 滚轮缩放
    ///
    /// 视为光标位置上的瞬时缩放手势，锚点保持与捏合一致。
    pub fn wheel(&mut self, screen: Vec2, delta_y: f32) {
        if !self.zoom_cfg.enabled {
            return;
        }
        let scale = (1.0 - delta_y * self.zoom_cfg.scroll_speed).max(MIN_WHEEL_SCALE);
        let new_zoom = self.clamp_zoom(self.target_zoom * scale);
        self.zoom_about(screen, new_zoom);
    }

    /// 聚焦请求（如“聚焦这个标记”）
    ///
    /// 目标平移设为该世界坐标（钳制后），可选地把目标缩放抬升到
    /// 偏好值。后续任何指针按下都会打断动画。
    pub fn focus_on(&mut self, world: Vec2, preferred_zoom: Option<f32>) {
        if let Some(zoom) = preferred_zoom {
            self.target_zoom = self.clamp_zoom(zoom);
        }
        self.target_pan = world;
        self.clamp_target_pan();
        self.gesture = GestureState::FocusAnimating {
            target_world: world,
        };
        tracing::debug!(target: "camera", "Focus requested at ({}, {})", world.x, world.y);
    }

    // ------------------------------------------------------------------
    // 每帧积分
    // ------------------------------------------------------------------

    /// 每帧调用一次，把当前视口向目标积分，返回本帧快照
    ///
    /// 平滑系数不随 `delta_time` 缩放（见模块文档），参数保留在
    /// 签名中以固定逐帧调用的契约。
    pub fn tick(&mut self, _delta_time: f32) -> Viewport {
        let mut changed = false;

        let zoom_delta = self.target_zoom - self.viewport.zoom;
        if zoom_delta.abs() >= ZOOM_SNAP_EPSILON {
            self.viewport.zoom += zoom_delta * self.zoom_cfg.easing_factor;
            changed = true;
        }

        let pan_delta = self.target_pan - self.viewport.pan;
        if pan_delta.x.abs() >= PAN_SNAP_EPSILON || pan_delta.y.abs() >= PAN_SNAP_EPSILON {
            self.viewport.pan += pan_delta * self.pan_cfg.easing_factor;
            changed = true;
        } else if self.gesture.is_focus_animating() && zoom_delta.abs() < ZOOM_SNAP_EPSILON {
            // 聚焦动画收敛完成
            self.gesture = GestureState::Idle;
        }

        if changed {
            self.notify_subscribers();
        }
        self.viewport
    }

    // ------------------------------------------------------------------
    // 内部
    // ------------------------------------------------------------------

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.zoom_cfg.min_zoom, self.zoom_cfg.max_zoom)
    }

    /// 锚点保持缩放
    ///
    /// 调整目标平移，使锚点屏幕位置下的世界点在缩放前后不动：
    /// `pan' = pan + ndc * (half_before - half_after)`。
    fn zoom_about(&mut self, screen_anchor: Vec2, new_zoom: f32) {
        let ndc = space::screen_to_ndc(screen_anchor, self.screen_size);
        let half_before = self.frustum.half_extents(self.target_zoom);
        let half_after = self.frustum.half_extents(new_zoom);
        self.target_pan += ndc * (half_before - half_after);
        self.target_zoom = new_zoom;
        self.clamp_target_pan();
    }

    /// 把目标平移钳制到内容边界内
    ///
    /// 使用目标缩放下的可见范围；内容在某轴上比视口窄时，该轴
    /// 平移收敛到 0。
    fn clamp_target_pan(&mut self) {
        let visible = self.frustum.half_extents(self.target_zoom);
        self.target_pan.x = space::clamp_pan_axis(
            self.target_pan.x,
            self.content.half_extents().x,
            visible.x,
        );
        self.target_pan.y = space::clamp_pan_axis(
            self.target_pan.y,
            self.content.half_extents().y,
            visible.y,
        );
    }

    fn notify_subscribers(&mut self) {
        let viewport = self.viewport;
        self.subscribers
            .retain(|sender| sender.send(viewport).is_ok());
    }
}
