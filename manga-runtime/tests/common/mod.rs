//! 集成测试共用的测试替身

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use manga_runtime::{
    Book, LoadRequest, ResourceLoader, ScriptContext, ScriptEngine, ScriptError, ScriptValue,
};

/// 按行解释脚本的测试引擎
///
/// - 每行 `name arg...` 是一次绑定调用；`true`/`false` 解析为布尔，数字解析为整数
/// - 单独一行 `fail` 让脚本报错
/// - 条件是状态键，`!` 前缀取反
/// - 宏 `{{key}}` 替换为状态值
#[derive(Default, Clone)]
pub struct ScriptedEngine {
    pub executed: Rc<RefCell<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

fn parse_arg(token: &str) -> ScriptValue {
    match token {
        "true" => ScriptValue::Bool(true),
        "false" => ScriptValue::Bool(false),
        _ => token
            .parse::<i64>()
            .map(ScriptValue::Int)
            .unwrap_or_else(|_| ScriptValue::from(token)),
    }
}

impl ScriptEngine for ScriptedEngine {
    fn evaluate_condition(&self, condition: &str, book: &Book) -> bool {
        let condition = condition.trim();
        match condition.strip_prefix('!') {
            Some(key) => !book.state.get_bool(key.trim()),
            None => book.state.get_bool(condition),
        }
    }

    fn run(&mut self, script: &str, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.executed.borrow_mut().push(script.to_string());
        for line in script.lines() {
            let mut tokens = line.split_whitespace();
            let Some(name) = tokens.next() else { continue };
            if name == "fail" {
                return Err(ScriptError::failed("脚本主动失败"));
            }
            let args: Vec<ScriptValue> = tokens.map(parse_arg).collect();
            ctx.call(name, &args)?;
        }
        Ok(())
    }

    fn expand_macros(&self, text: &str, book: &Book) -> String {
        let mut out = String::new();
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            let Some(end) = rest[start..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push_str(&book.state.get_string(&rest[start + 2..start + end]));
            rest = &rest[start + end + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// 记录所有加载请求的资源加载方
#[derive(Default, Clone)]
pub struct RecordingLoader {
    pub requests: Rc<RefCell<Vec<LoadRequest>>>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_ticket(&self) -> Option<u64> {
        self.requests.borrow().last().map(|r| r.ticket)
    }
}

impl ResourceLoader for RecordingLoader {
    fn request(&mut self, request: &LoadRequest) {
        self.requests.borrow_mut().push(request.clone());
    }
}
