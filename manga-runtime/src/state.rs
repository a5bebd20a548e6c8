//! # State 模块
//!
//! 游戏状态：扁平的字符串键值表。
//!
//! ## 设计原则
//!
//! - 底层只存字符串，类型化读写都建立在 [`StateStore::get_string`] 之上
//! - 解析失败返回类型零值（`false` / `0` / `0.0`），从不报错
//! - 使用 `BTreeMap`，保证存档输出稳定
//! - 没有历史或版本层，写入直接覆盖

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 脚本值
///
/// 脚本绑定的参数与返回值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptValue {
    /// 无返回值
    Unit,
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 布尔值
    Bool(bool),
}

impl ScriptValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => Ok(()),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// 游戏状态表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStore {
    values: BTreeMap<String, String>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由原始表构造（读档用）
    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// 读取字符串，缺失时为空串
    pub fn get_string(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_default()
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// `"true"` / `"1"` 为真，其余为假
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get_string(key).trim(), "true" | "1")
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set_string(key, value.to_string());
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get_string(key).trim().parse().unwrap_or(0)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set_string(key, value.to_string());
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.get_string(key).trim().parse().unwrap_or(0.0)
    }

    pub fn set_double(&mut self, key: impl Into<String>, value: f64) {
        self.set_string(key, value.to_string());
    }

    /// 整数自增，返回新值
    pub fn increment(&mut self, key: &str, by: i64) -> i64 {
        let value = self.get_int(key).saturating_add(by);
        self.set_int(key, value);
        value
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_round_trip() {
        let mut state = StateStore::new();
        state.set_bool("flag", true);
        state.set_int("count", -7);
        state.set_double("ratio", 0.25);
        state.set_string("name", "Mika");

        assert!(state.get_bool("flag"));
        assert_eq!(state.get_int("count"), -7);
        assert_eq!(state.get_double("ratio"), 0.25);
        assert_eq!(state.get_string("name"), "Mika");
        assert_eq!(state.len(), 4);
    }

    #[test]
    fn test_parse_failures_default_to_zero() {
        let mut state = StateStore::new();
        state.set_string("junk", "not a number");

        assert!(!state.get_bool("junk"));
        assert_eq!(state.get_int("junk"), 0);
        assert_eq!(state.get_double("junk"), 0.0);

        assert!(!state.get_bool("missing"));
        assert_eq!(state.get_int("missing"), 0);
        assert_eq!(state.get_string("missing"), "");
        assert!(!state.contains("missing"));
    }

    #[test]
    fn test_bool_accepts_one() {
        let mut state = StateStore::new();
        state.set_string("legacy", "1");
        assert!(state.get_bool("legacy"));
        state.set_string("legacy", "yes");
        assert!(!state.get_bool("legacy"));
    }

    #[test]
    fn test_set_overwrites_across_types() {
        let mut state = StateStore::new();
        state.set_int("x", 3);
        state.set_bool("x", true);
        assert_eq!(state.get_string("x"), "true");
        assert_eq!(state.get_int("x"), 0);
    }

    #[test]
    fn test_increment_and_remove() {
        let mut state = StateStore::new();
        assert_eq!(state.increment("visits", 1), 1);
        assert_eq!(state.increment("visits", 2), 3);
        assert_eq!(state.remove("visits"), Some("3".to_string()));
        assert!(state.is_empty());
    }

    #[test]
    fn test_keys_are_ordered() {
        let mut state = StateStore::new();
        state.set_string("b", "");
        state.set_string("a", "");
        state.set_string("c", "");
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_script_value_display() {
        assert_eq!(ScriptValue::from("x").to_string(), "x");
        assert_eq!(ScriptValue::from(3_i64).to_string(), "3");
        assert_eq!(ScriptValue::from(true).to_string(), "true");
        assert_eq!(ScriptValue::Unit.to_string(), "");
        assert_eq!(ScriptValue::Int(2).as_float(), Some(2.0));
    }

    #[test]
    fn test_state_serialization() {
        let mut state = StateStore::new();
        state.set_int("n", 1);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"n":"1"}"#);
        let back: StateStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
