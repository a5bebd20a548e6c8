//! # Script 模块
//!
//! 与外部脚本引擎的边界。
//!
//! 运行时不解释任何脚本语言：页面上的条件、动作和钩子都是不透明文本，
//! 交给注入的 [`ScriptEngine`]。引擎通过 [`ScriptContext::call`] 回调
//! [`ScriptBindings`] 中注册的宿主函数。
//!
//! 会触发导航或钩子的绑定不会在脚本执行过程中立即生效，而是排成
//! [`ScriptRequest`]，由运行时在脚本返回后按顺序处理，避免脚本执行期间
//! 重入运行时。

mod bindings;

use thiserror::Error;
use tracing::debug;

use crate::book::Book;
use crate::model::ConditionEvaluator;
use crate::state::ScriptValue;

pub use bindings::{
    ArgType, Binding, BindingError, BindingHandler, BindingScope, MAX_PARAMS, ScriptBindings,
};

/// 脚本排队的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRequest {
    DisplayPage(String),
    ShowLayer(String),
    TakeItem(String),
    /// 丢到当前页
    DropItem(String),
    UseItem(String),
    DiscoverNote(String),
}

/// 脚本执行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// 引擎报告的执行失败
    #[error("脚本执行失败: {message}")]
    Failed { message: String },

    /// 绑定调用失败
    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl ScriptError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// 脚本执行上下文
pub struct ScriptContext<'a> {
    scope: BindingScope<'a>,
    bindings: &'a ScriptBindings,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        book: &'a mut Book,
        bindings: &'a ScriptBindings,
        requests: &'a mut Vec<ScriptRequest>,
    ) -> Self {
        Self {
            scope: BindingScope { book, requests },
            bindings,
        }
    }

    pub fn book(&self) -> &Book {
        &*self.scope.book
    }

    pub fn book_mut(&mut self) -> &mut Book {
        &mut *self.scope.book
    }

    /// 调用宿主绑定
    pub fn call(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, BindingError> {
        self.bindings.invoke(name, &mut self.scope, args)
    }

    /// 直接排队一个请求
    pub fn request(&mut self, request: ScriptRequest) {
        self.scope.requests.push(request);
    }
}

/// 外部脚本引擎
pub trait ScriptEngine {
    /// 求值条件表达式
    fn evaluate_condition(&self, condition: &str, book: &Book) -> bool;

    /// 执行一段脚本
    fn run(&mut self, script: &str, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError>;

    /// 展开文本中的宏（页 id、显示文本）
    fn expand_macros(&self, text: &str, _book: &Book) -> String {
        text.to_string()
    }
}

/// 空引擎：条件全部成立，脚本什么也不做
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScriptEngine;

impl ScriptEngine for NullScriptEngine {
    fn evaluate_condition(&self, _condition: &str, _book: &Book) -> bool {
        true
    }

    fn run(&mut self, script: &str, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        debug!(script = script, "没有注入脚本引擎，跳过脚本");
        Ok(())
    }
}

/// 以脚本引擎为后端的条件求值器
pub struct BookConditions<'a> {
    pub engine: &'a dyn ScriptEngine,
    pub book: &'a Book,
}

impl<'a> BookConditions<'a> {
    pub fn new(engine: &'a dyn ScriptEngine, book: &'a Book) -> Self {
        Self { engine, book }
    }
}

impl ConditionEvaluator for BookConditions<'_> {
    fn evaluate(&self, condition: &str) -> bool {
        self.engine.evaluate_condition(condition, self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 把 `name arg` 形式的每一行当作一次绑定调用
    struct LineEngine;

    impl ScriptEngine for LineEngine {
        fn evaluate_condition(&self, condition: &str, book: &Book) -> bool {
            book.state.get_bool(condition)
        }

        fn run(&mut self, script: &str, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
            for line in script.lines() {
                let mut parts = line.split_whitespace();
                let Some(name) = parts.next() else { continue };
                let args: Vec<ScriptValue> = parts.map(ScriptValue::from).collect();
                ctx.call(name, &args)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_context_routes_calls_through_bindings() {
        let bindings = ScriptBindings::standard();
        let mut book = Book::default();
        let mut requests = Vec::new();
        let mut engine = LineEngine;

        {
            let mut ctx = ScriptContext::new(&mut book, &bindings, &mut requests);
            engine
                .run("setState door open\ndisplayPage mid|p2", &mut ctx)
                .unwrap();
            assert_eq!(ctx.book().state.get_string("door"), "open");
        }
        assert_eq!(requests, vec![ScriptRequest::DisplayPage("mid|p2".to_string())]);
    }

    #[test]
    fn test_binding_errors_surface_as_script_errors() {
        let bindings = ScriptBindings::standard();
        let mut book = Book::default();
        let mut requests = Vec::new();
        let mut ctx = ScriptContext::new(&mut book, &bindings, &mut requests);

        let err = LineEngine.run("setBool flag", &mut ctx).unwrap_err();
        assert!(matches!(err, ScriptError::Binding(BindingError::ArityMismatch { .. })));
    }

    #[test]
    fn test_book_conditions() {
        let mut book = Book::default();
        book.state.set_bool("lit", true);
        let conditions = BookConditions::new(&LineEngine, &book);

        assert!(conditions.check(""));
        assert!(conditions.check("lit"));
        assert!(!conditions.check("dark"));
    }

    #[test]
    fn test_null_engine() {
        let bindings = ScriptBindings::new();
        let mut book = Book::default();
        let mut requests = Vec::new();
        let mut ctx = ScriptContext::new(&mut book, &bindings, &mut requests);
        let mut engine = NullScriptEngine;

        assert!(engine.run("anything()", &mut ctx).is_ok());
        assert!(engine.evaluate_condition("false", ctx.book()));
        assert_eq!(engine.expand_macros("{{x}}", ctx.book()), "{{x}}");
    }
}
