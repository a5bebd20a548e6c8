//! # Visibility 模块
//!
//! 叠加元素、导航点、交互热点共用的可见性判定。
//!
//! 一个元素的可见方式有三种：
//!
//! - **始终可见**：只受条件表达式约束
//! - **图层键**：当前 UI 图层键与元素的键相同时可见
//! - **朝向**：相机 pitch/yaw 同时落在元素的目标范围内时可见
//!
//! 判定本身是纯查询，不产生任何副作用。条件表达式交给
//! [`ConditionEvaluator`] 求值（通常由外部脚本引擎实现）。

use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};

/// 条件求值器
///
/// 空条件永远为真，[`check`](Self::check) 已经处理了这一点，
/// 实现方只需要处理非空条件。
pub trait ConditionEvaluator {
    /// 求值非空条件
    fn evaluate(&self, condition: &str) -> bool;

    /// 求值条件，空条件为真
    fn check(&self, condition: &str) -> bool {
        condition.trim().is_empty() || self.evaluate(condition)
    }
}

/// 所有条件都成立（没有接入脚本引擎时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct AllConditionsPass;

impl ConditionEvaluator for AllConditionsPass {
    fn evaluate(&self, _condition: &str) -> bool {
        true
    }
}

/// 把闭包包装成求值器
pub struct FnConditions<F>(pub F);

impl<F: Fn(&str) -> bool> ConditionEvaluator for FnConditions<F> {
    fn evaluate(&self, condition: &str) -> bool {
        (self.0)(condition)
    }
}

/// 目标范围
///
/// 构造时由中心值和容差一次性算出前后边界，命中测试只做区间包含判断。
/// 两端都是闭区间，相邻热点共享边界时不会出现缝隙。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetRange {
    pub leading: f64,
    pub trailing: f64,
}

impl TargetRange {
    /// 以 `center` 为中心、`tolerance` 为半宽的范围
    pub fn around(center: f64, tolerance: f64) -> Self {
        let tolerance = tolerance.abs();
        Self {
            leading: center - tolerance,
            trailing: center + tolerance,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.leading && value <= self.trailing
    }
}

/// 当前的查看上下文
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewContext {
    /// 图层可见性键，空字符串表示没有激活任何图层
    pub key: String,
    /// 相机俯仰角
    pub pitch: f64,
    /// 相机偏航角
    pub yaw: f64,
}

impl ViewContext {
    pub fn new(key: impl Into<String>, pitch: f64, yaw: f64) -> Self {
        Self {
            key: key.into(),
            pitch,
            yaw,
        }
    }

    /// 只有图层键的上下文
    pub fn with_key(key: impl Into<String>) -> Self {
        Self::new(key, 0.0, 0.0)
    }

    /// 只有朝向的上下文
    pub fn at(pitch: f64, yaw: f64) -> Self {
        Self::new("", pitch, yaw)
    }
}

/// 可见方式
#[derive(Debug, Clone, PartialEq)]
pub enum VisibilityMode {
    Always,
    Key(String),
    Orientation { pitch: TargetRange, yaw: TargetRange },
}

impl Default for VisibilityMode {
    fn default() -> Self {
        Self::Always
    }
}

/// 可见性规则
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    pub mode: VisibilityMode,
    /// 额外条件（脚本表达式），空表示无条件
    pub condition: String,
}

impl Visibility {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            mode: VisibilityMode::Key(key.into()),
            condition: String::new(),
        }
    }

    /// 由中心朝向和容差构造
    pub fn orientation(pitch: f64, yaw: f64, tolerance: f64) -> Self {
        Self {
            mode: VisibilityMode::Orientation {
                pitch: TargetRange::around(pitch, tolerance),
                yaw: TargetRange::around(yaw, tolerance),
            },
            condition: String::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn is_always(&self) -> bool {
        matches!(self.mode, VisibilityMode::Always)
    }

    /// 键或朝向是否与上下文匹配（不含条件）
    pub fn matches_context(&self, ctx: &ViewContext) -> bool {
        match &self.mode {
            VisibilityMode::Always => true,
            VisibilityMode::Key(key) => !key.is_empty() && *key == ctx.key,
            VisibilityMode::Orientation { pitch, yaw } => {
                pitch.contains(ctx.pitch) && yaw.contains(ctx.yaw)
            }
        }
    }

    /// 布局位：始终可见的元素需要条件成立，键/朝向元素只看是否匹配
    pub fn layout_bit<E>(&self, ctx: &ViewContext, eval: &E) -> bool
    where
        E: ConditionEvaluator + ?Sized,
    {
        match &self.mode {
            VisibilityMode::Always => eval.check(&self.condition),
            _ => self.matches_context(ctx),
        }
    }

    /// 是否可见：匹配上下文且条件成立
    pub fn is_visible<E>(&self, ctx: &ViewContext, eval: &E) -> bool
    where
        E: ConditionEvaluator + ?Sized,
    {
        self.matches_context(ctx) && eval.check(&self.condition)
    }
}

impl Record for Visibility {
    const DIVIDER: Divider = codec::VISIBILITY;

    fn write(&self, out: &mut FieldWriter) {
        let (mode, key, pitch, yaw) = match &self.mode {
            VisibilityMode::Always => ("always", "", Default::default(), Default::default()),
            VisibilityMode::Key(key) => ("key", key.as_str(), Default::default(), Default::default()),
            VisibilityMode::Orientation { pitch, yaw } => ("orientation", "", *pitch, *yaw),
        };
        out.str(mode)
            .str(key)
            .double(pitch.leading)
            .double(pitch.trailing)
            .double(yaw.leading)
            .double(yaw.trailing)
            .text(&self.condition);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        let mode = input.str();
        let key = input.str();
        let pitch = TargetRange {
            leading: input.double(),
            trailing: input.double(),
        };
        let yaw = TargetRange {
            leading: input.double(),
            trailing: input.double(),
        };
        let condition = input.text();

        let mode = match mode.as_str() {
            "key" => VisibilityMode::Key(key),
            "orientation" => VisibilityMode::Orientation { pitch, yaw },
            _ => VisibilityMode::Always,
        };
        Self { mode, condition }
    }
}
