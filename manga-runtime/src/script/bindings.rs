//! # Bindings 模块
//!
//! 脚本可以调用的宿主函数表。
//!
//! 每个绑定在注册时声明参数类型和返回类型，注册阶段就拒绝空名、重名和
//! 超过 [`MAX_PARAMS`] 个参数的签名；调用阶段检查参数个数和类型。

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::book::Book;
use crate::script::ScriptRequest;
use crate::state::ScriptValue;

/// 单个绑定最多接受的参数个数
pub const MAX_PARAMS: usize = 4;

/// 参数 / 返回值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// 任意值
    Any,
    Unit,
    Int,
    /// 浮点数，也接受整数
    Float,
    String,
    Bool,
}

impl ArgType {
    /// 值是否满足该类型
    pub fn accepts(self, value: &ScriptValue) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::Unit, ScriptValue::Unit)
                | (Self::Int, ScriptValue::Int(_))
                | (Self::Float, ScriptValue::Float(_) | ScriptValue::Int(_))
                | (Self::String, ScriptValue::String(_))
                | (Self::Bool, ScriptValue::Bool(_))
        )
    }

    fn of(value: &ScriptValue) -> Self {
        match value {
            ScriptValue::Unit => Self::Unit,
            ScriptValue::Int(_) => Self::Int,
            ScriptValue::Float(_) => Self::Float,
            ScriptValue::String(_) => Self::String,
            ScriptValue::Bool(_) => Self::Bool,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Unit => "unit",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// 绑定错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("绑定名不能为空")]
    EmptyName,

    #[error("绑定 '{name}' 已注册")]
    Duplicate { name: String },

    #[error("绑定 '{name}' 声明了 {count} 个参数，最多 {max} 个")]
    TooManyParams {
        name: String,
        count: usize,
        max: usize,
    },

    #[error("未知绑定 '{name}'")]
    Unknown { name: String },

    #[error("绑定 '{name}' 需要 {expected} 个参数，实际 {actual} 个")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("绑定 '{name}' 第 {index} 个参数期望 {expected}，实际 {actual}")]
    TypeMismatch {
        name: String,
        index: usize,
        expected: ArgType,
        actual: ArgType,
    },
}

/// 绑定执行时能访问的范围
///
/// 书可以直接读写；导航和会触发钩子的操作只能排队，
/// 由运行时在脚本返回后处理。
pub struct BindingScope<'a> {
    pub book: &'a mut Book,
    pub requests: &'a mut Vec<ScriptRequest>,
}

/// 绑定处理函数
pub type BindingHandler = Box<dyn Fn(&mut BindingScope<'_>, &[ScriptValue]) -> ScriptValue>;

/// 已注册的绑定
pub struct Binding {
    pub params: Vec<ArgType>,
    pub returns: ArgType,
    handler: BindingHandler,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// 绑定表
#[derive(Debug, Default)]
pub struct ScriptBindings {
    bindings: BTreeMap<String, Binding>,
}

impl ScriptBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册绑定
    pub fn register<F>(
        &mut self,
        name: &str,
        params: Vec<ArgType>,
        returns: ArgType,
        handler: F,
    ) -> Result<(), BindingError>
    where
        F: Fn(&mut BindingScope<'_>, &[ScriptValue]) -> ScriptValue + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(BindingError::EmptyName);
        }
        if self.bindings.contains_key(name) {
            return Err(BindingError::Duplicate {
                name: name.to_string(),
            });
        }
        if params.len() > MAX_PARAMS {
            return Err(BindingError::TooManyParams {
                name: name.to_string(),
                count: params.len(),
                max: MAX_PARAMS,
            });
        }

        self.bindings.insert(
            name.to_string(),
            Binding {
                params,
                returns,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 调用绑定
    pub fn invoke(
        &self,
        name: &str,
        scope: &mut BindingScope<'_>,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, BindingError> {
        let binding = self.bindings.get(name).ok_or_else(|| BindingError::Unknown {
            name: name.to_string(),
        })?;

        if args.len() != binding.params.len() {
            return Err(BindingError::ArityMismatch {
                name: name.to_string(),
                expected: binding.params.len(),
                actual: args.len(),
            });
        }
        for (index, (expected, arg)) in binding.params.iter().zip(args).enumerate() {
            if !expected.accepts(arg) {
                return Err(BindingError::TypeMismatch {
                    name: name.to_string(),
                    index,
                    expected: *expected,
                    actual: ArgType::of(arg),
                });
            }
        }

        Ok((binding.handler)(scope, args))
    }

    /// 运行时默认提供的绑定
    pub fn standard() -> Self {
        let mut bindings = Self::new();
        for (name, params, returns, handler) in standard_bindings() {
            // 名字都是字面量且互不相同，注册不会失败
            if let Err(e) = bindings.register(name, params, returns, handler) {
                tracing::error!(error = %e, "注册标准绑定失败");
            }
        }
        bindings
    }
}

type StandardBinding = (&'static str, Vec<ArgType>, ArgType, BindingHandler);

fn text(args: &[ScriptValue], index: usize) -> String {
    args.get(index).map(ToString::to_string).unwrap_or_default()
}

fn handler<F>(f: F) -> BindingHandler
where
    F: Fn(&mut BindingScope<'_>, &[ScriptValue]) -> ScriptValue + 'static,
{
    Box::new(f)
}

fn standard_bindings() -> Vec<StandardBinding> {
    use ArgType::{Any, Bool, Int, Unit};

    vec![
        (
            "getState",
            vec![ArgType::String],
            ArgType::String,
            handler(|scope, args| scope.book.state.get_string(&text(args, 0)).into()),
        ),
        (
            "setState",
            vec![ArgType::String, Any],
            Unit,
            handler(|scope, args| {
                scope.book.state.set_string(text(args, 0), text(args, 1));
                ScriptValue::Unit
            }),
        ),
        (
            "getBool",
            vec![ArgType::String],
            Bool,
            handler(|scope, args| scope.book.state.get_bool(&text(args, 0)).into()),
        ),
        (
            "setBool",
            vec![ArgType::String, Bool],
            Unit,
            handler(|scope, args| {
                let value = args.get(1).and_then(ScriptValue::as_bool).unwrap_or_default();
                scope.book.state.set_bool(text(args, 0), value);
                ScriptValue::Unit
            }),
        ),
        (
            "getInt",
            vec![ArgType::String],
            Int,
            handler(|scope, args| scope.book.state.get_int(&text(args, 0)).into()),
        ),
        (
            "setInt",
            vec![ArgType::String, Int],
            Unit,
            handler(|scope, args| {
                let value = args.get(1).and_then(ScriptValue::as_int).unwrap_or_default();
                scope.book.state.set_int(text(args, 0), value);
                ScriptValue::Unit
            }),
        ),
        (
            "increment",
            vec![ArgType::String, Int],
            Int,
            handler(|scope, args| {
                let by = args.get(1).and_then(ScriptValue::as_int).unwrap_or_default();
                scope.book.state.increment(&text(args, 0), by).into()
            }),
        ),
        (
            "hasItem",
            vec![ArgType::String],
            Bool,
            handler(|scope, args| scope.book.inventory.is_carried(&text(args, 0)).into()),
        ),
        (
            "takeItem",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::TakeItem(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
        (
            "dropItem",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::DropItem(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
        (
            "useItem",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::UseItem(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
        (
            "displayPage",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::DisplayPage(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
        (
            "showLayer",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::ShowLayer(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
        (
            "discoverNote",
            vec![ArgType::String],
            Unit,
            handler(|scope, args| {
                scope.requests.push(ScriptRequest::DiscoverNote(text(args, 0)));
                ScriptValue::Unit
            }),
        ),
    ]
}
