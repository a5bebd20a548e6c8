//! 非槽位的热点：导航点、交互点、触摸区域
//!
//! 每页可以有任意多个热点，解析时按定义顺序取第一个命中且条件成立的。

use super::geometry::{Point, Rect};
use super::visibility::{ConditionEvaluator, ViewContext, Visibility};
use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};

/// 导航点：命中后跳转到目标页
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationPoint {
    /// 目标页 id（可以是 `chapter|page`）
    pub target_page_id: String,
    pub label: String,
    pub visibility: Visibility,
    /// 跳转前执行的脚本
    pub action: String,
}

impl NavigationPoint {
    pub fn new(target: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            target_page_id: target.into(),
            visibility,
            ..Default::default()
        }
    }
}

impl Record for NavigationPoint {
    const DIVIDER: Divider = codec::NAVIGATION_POINT;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.target_page_id)
            .text(&self.label)
            .child(&self.visibility)
            .text(&self.action);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            target_page_id: input.str(),
            label: input.text(),
            visibility: input.child(),
            action: input.text(),
        }
    }
}

/// 交互点：命中后执行脚本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub label: String,
    pub visibility: Visibility,
    pub action: String,
    /// 触发时播放的音效
    pub sound: String,
}

impl Interaction {
    pub fn new(id: impl Into<String>, visibility: Visibility, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visibility,
            action: action.into(),
            ..Default::default()
        }
    }
}

impl Record for Interaction {
    const DIVIDER: Divider = codec::INTERACTION;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.label)
            .child(&self.visibility)
            .text(&self.action)
            .str(&self.sound);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            label: input.text(),
            visibility: input.child(),
            action: input.text(),
            sound: input.str(),
        }
    }
}

/// 触摸区域：屏幕矩形内的点击
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchZone {
    pub id: String,
    pub rect: Rect,
    pub condition: String,
    pub action: String,
    /// 非空时点击后跳转
    pub target_page_id: String,
}

impl Record for TouchZone {
    const DIVIDER: Divider = codec::TOUCH_ZONE;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .rect(self.rect)
            .text(&self.condition)
            .text(&self.action)
            .str(&self.target_page_id);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            rect: input.rect(),
            condition: input.text(),
            action: input.text(),
            target_page_id: input.str(),
        }
    }
}

/// 取第一个可见的导航点
pub fn first_navigation_point<'a, E>(
    points: &'a [NavigationPoint],
    ctx: &ViewContext,
    eval: &E,
) -> Option<&'a NavigationPoint>
where
    E: ConditionEvaluator + ?Sized,
{
    points.iter().find(|p| p.visibility.is_visible(ctx, eval))
}

/// 取第一个可见的交互点
pub fn first_interaction<'a, E>(
    interactions: &'a [Interaction],
    ctx: &ViewContext,
    eval: &E,
) -> Option<&'a Interaction>
where
    E: ConditionEvaluator + ?Sized,
{
    interactions
        .iter()
        .find(|i| i.visibility.is_visible(ctx, eval))
}

/// 取第一个包含该点且条件成立的触摸区域
pub fn first_touch_zone<'a, E>(zones: &'a [TouchZone], point: Point, eval: &E) -> Option<&'a TouchZone>
where
    E: ConditionEvaluator + ?Sized,
{
    zones
        .iter()
        .find(|z| z.rect.contains(point) && eval.check(&z.condition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::model::visibility::{AllConditionsPass, FnConditions};

    #[test]
    fn test_first_match_wins_in_definition_order() {
        let points = vec![
            NavigationPoint::new("a", Visibility::orientation(0.0, 0.0, 20.0)),
            NavigationPoint::new("b", Visibility::orientation(0.0, 10.0, 20.0)),
        ];
        let ctx = ViewContext::at(0.0, 10.0);
        let hit = first_navigation_point(&points, &ctx, &AllConditionsPass);
        assert_eq!(hit.map(|p| p.target_page_id.as_str()), Some("a"));
    }

    #[test]
    fn test_condition_failure_falls_through() {
        let interactions = vec![
            Interaction::new(
                "locked",
                Visibility::key("door").with_condition("hasKey"),
                "open()",
            ),
            Interaction::new("knock", Visibility::key("door"), "knock()"),
        ];
        let no_key = FnConditions(|c: &str| c != "hasKey");
        let ctx = ViewContext::with_key("door");
        let hit = first_interaction(&interactions, &ctx, &no_key);
        assert_eq!(hit.map(|i| i.id.as_str()), Some("knock"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let points = vec![NavigationPoint::new("a", Visibility::key("x"))];
        assert!(first_navigation_point(&points, &ViewContext::default(), &AllConditionsPass).is_none());
    }

    #[test]
    fn test_touch_zone_hit() {
        let zones = vec![
            TouchZone {
                id: "hidden".to_string(),
                rect: Rect::new(0.0, 0.0, 1.0, 1.0),
                condition: "false".to_string(),
                ..Default::default()
            },
            TouchZone {
                id: "visible".to_string(),
                rect: Rect::new(0.0, 0.0, 0.5, 0.5),
                ..Default::default()
            },
        ];
        let eval = FnConditions(|c: &str| c != "false");
        let hit = first_touch_zone(&zones, Point::new(0.5, 0.5), &eval);
        assert_eq!(hit.map(|z| z.id.as_str()), Some("visible"));
        assert!(first_touch_zone(&zones, Point::new(0.9, 0.9), &eval).is_none());
    }

    #[test]
    fn test_hotspot_round_trip() {
        let point = NavigationPoint {
            target_page_id: "mid|p2".to_string(),
            label: "下一页".to_string(),
            visibility: Visibility::orientation(0.0, 45.0, 15.0),
            action: "setBool(\"seen\", true)".to_string(),
        };
        assert_eq!(decode::<NavigationPoint>(&encode(&point)), point);

        let zone = TouchZone {
            id: "z".to_string(),
            rect: Rect::new(0.1, 0.2, 0.3, 0.4),
            condition: String::new(),
            action: String::new(),
            target_page_id: "p9".to_string(),
        };
        assert_eq!(decode::<TouchZone>(&encode(&zone)), zone);
    }
}
