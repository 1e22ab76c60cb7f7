//! 缓动函数模块
//!
//! 把命名预设或显式的三次贝塞尔控制点解析为纯函数 `t -> t'`。
//! 引擎中所有需要插值的量（镜头聚焦、图层动画）都建立在这里的
//! 求值器之上，因此该模块的正确性是基础性的：单调预设必须保持
//! 单调，标准曲线的输出必须落在 [0, 1] 内。
//!
//! 求解策略：给定 `t`，先用牛顿迭代求 `bezier_x(s) = t` 的参数 `s`，
//! 迭代不收敛时回退到二分查找，最后返回 `bezier_y(s)`。

use serde::{Deserialize, Serialize};

/// 牛顿迭代次数上限
const NEWTON_ITERATIONS: usize = 8;
/// 收敛阈值（函数值与导数共用）
const SOLVE_EPSILON: f64 = 1e-7;
/// 二分查找迭代上限
const BISECTION_ITERATIONS: usize = 64;

/// 缓动预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingPreset {
    /// 线性（恒等函数）
    #[serde(rename = "linear")]
    Linear,
    /// 缓入
    #[serde(rename = "ease-in")]
    EaseIn,
    /// 缓出
    #[serde(rename = "ease-out")]
    EaseOut,
    /// 缓入缓出
    #[serde(rename = "ease-in-out")]
    EaseInOut,
}

impl EasingPreset {
    /// 预设对应的贝塞尔控制点（CSS标准值）
    fn control_points(self) -> Option<[f64; 4]> {
        match self {
            EasingPreset::Linear => None,
            EasingPreset::EaseIn => Some([0.42, 0.0, 1.0, 1.0]),
            EasingPreset::EaseOut => Some([0.0, 0.0, 0.58, 1.0]),
            EasingPreset::EaseInOut => Some([0.42, 0.0, 0.58, 1.0]),
        }
    }
}

/// 缓动配置：命名预设，或显式控制点 `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EasingConfig {
    Preset(EasingPreset),
    ControlPoints([f64; 4]),
}

impl Default for EasingConfig {
    fn default() -> Self {
        EasingConfig::Preset(EasingPreset::Linear)
    }
}

impl EasingConfig {
    /// 解析为可求值的缓动函数
    ///
    /// `linear` 短路为恒等函数，不进入数值求解。
    pub fn resolve(self) -> Easing {
        match self {
            EasingConfig::Preset(preset) => match preset.control_points() {
                None => Easing::Linear,
                Some([x1, y1, x2, y2]) => Easing::Bezier(CubicBezier::new(x1, y1, x2, y2)),
            },
            EasingConfig::ControlPoints([x1, y1, x2, y2]) => {
                Easing::Bezier(CubicBezier::new(x1, y1, x2, y2))
            }
        }
    }
}

/// 已解析的缓动函数
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// 恒等函数
    Linear,
    /// 三次贝塞尔求值器
    Bezier(CubicBezier),
}

impl Easing {
    /// 求值，定义域与值域均为 [0, 1]
    ///
    /// `t <= 0` 返回 0，`t >= 1` 返回 1，均不触发求解器。
    pub fn eval(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::Bezier(bezier) => bezier.eval(t),
        }
    }
}

/// 三次贝塞尔缓动曲线
///
/// 端点固定为 (0,0) 与 (1,1)，由两个控制点 (x1,y1)、(x2,y2) 决定形状。
/// 多项式系数预先展开，求值时不再重算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl CubicBezier {
    /// 从控制点构造
    ///
    /// x 控制点被钳制到 [0, 1]，保证 `bezier_x` 在 [0, 1] 上可解。
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x1 = x1.clamp(0.0, 1.0);
        let x2 = x2.clamp(0.0, 1.0);

        // x(s) = ((ax*s + bx)*s + cx)*s，端点 (0,0)/(1,1) 已隐含
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;

        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;

        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    fn sample_x(&self, s: f64) -> f64 {
        ((self.ax * s + self.bx) * s + self.cx) * s
    }

    fn sample_y(&self, s: f64) -> f64 {
        ((self.ay * s + self.by) * s + self.cy) * s
    }

    fn sample_x_derivative(&self, s: f64) -> f64 {
        (3.0 * self.ax * s + 2.0 * self.bx) * s + self.cx
    }

    /// 在曲线上求值：解 `bezier_x(s) = t`，返回 `bezier_y(s)`
    fn eval(&self, t: f64) -> f64 {
        self.sample_y(self.solve_parameter(t))
    }

    /// 牛顿迭代求参数，失败时回退二分查找
    fn solve_parameter(&self, t: f64) -> f64 {
        let mut s = t;
        for _ in 0..NEWTON_ITERATIONS {
            let error = self.sample_x(s) - t;
            if error.abs() < SOLVE_EPSILON {
                return s;
            }
            let derivative = self.sample_x_derivative(s);
            if derivative.abs() < SOLVE_EPSILON {
                // 导数过小，牛顿步不可信
                break;
            }
            s -= error / derivative;
        }

        // 二分查找：bezier_x 在 [0,1] 上单调（x 控制点已钳制）
        let mut lower = 0.0;
        let mut upper = 1.0;
        s = t.clamp(lower, upper);
        for _ in 0..BISECTION_ITERATIONS {
            let error = self.sample_x(s) - t;
            if error.abs() < SOLVE_EPSILON {
                break;
            }
            if error > 0.0 {
                upper = s;
            } else {
                lower = s;
            }
            s = (lower + upper) * 0.5;
        }
        s
    }
}
