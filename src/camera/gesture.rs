//! 手势状态机与指针注册表
//!
//! 手势互斥由标签联合表达：任一时刻只有一个手势生效，非法的
//! 同时状态（既拖拽又捏合）在类型层面不可表示。状态迁移由指针
//! 数量与输入事件边沿触发，见 `controller`。

use glam::Vec2;

/// 平台指针标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// 手势状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// 无手势
    Idle,
    /// 单指/鼠标拖拽平移
    Panning {
        /// 上一次处理的屏幕坐标
        last_screen: Vec2,
    },
    /// 双指捏合缩放
    Pinching {
        /// 捏合开始时的指针间距（基线）
        initial_distance: f32,
        /// 捏合开始时的目标缩放
        initial_zoom: f32,
    },
    /// 程序化聚焦动画（被任何指针按下打断）
    FocusAnimating {
        /// 聚焦的世界坐标
        target_world: Vec2,
    },
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    pub fn is_focus_animating(&self) -> bool {
        matches!(self, GestureState::FocusAnimating { .. })
    }
}

/// 活动指针注册表
///
/// 按注册顺序保存指针及其最近的屏幕坐标，捏合手势始终取最早
/// 注册的两个指针，保证多指序列下的确定性。移除是幂等的：没有
/// 匹配按下事件的抬起是无操作。
#[derive(Debug, Clone, Default)]
pub struct PointerRegistry {
    pointers: Vec<(PointerId, Vec2)>,
}

impl PointerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册指针；已注册时只更新坐标
    pub fn register(&mut self, id: PointerId, screen: Vec2) {
        if let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) {
            entry.1 = screen;
        } else {
            self.pointers.push((id, screen));
        }
    }

    /// 更新指针坐标；未注册的指针被忽略，返回 false
    pub fn update(&mut self, id: PointerId, screen: Vec2) -> bool {
        if let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) {
            entry.1 = screen;
            true
        } else {
            false
        }
    }

    /// 移除指针；返回是否确实移除
    pub fn remove(&mut self, id: PointerId) -> bool {
        let before = self.pointers.len();
        self.pointers.retain(|(pid, _)| *pid != id);
        self.pointers.len() != before
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn get(&self, id: PointerId) -> Option<Vec2> {
        self.pointers
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, pos)| *pos)
    }

    /// 最早注册的指针
    pub fn first(&self) -> Option<(PointerId, Vec2)> {
        self.pointers.first().copied()
    }

    /// 最早注册的两个指针（捏合手势用）
    pub fn first_two(&self) -> Option<(Vec2, Vec2)> {
        if self.pointers.len() < 2 {
            return None;
        }
        Some((self.pointers[0].1, self.pointers[1].1))
    }

    /// 最早两个指针的中点与间距
    pub fn pinch_midpoint_and_distance(&self) -> Option<(Vec2, f32)> {
        let (a, b) = self.first_two()?;
        Some(((a + b) * 0.5, (b - a).length()))
    }
}
