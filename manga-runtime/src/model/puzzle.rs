//! 密码与符号谜题
//!
//! 比较前，作者写的答案和玩家输入都要经过宏展开，
//! 所以这里的判定函数接收已经展开好的答案。

use serde::{Deserialize, Serialize};

use crate::codec::{self, Divider, FieldReader, FieldWriter, Record};

/// 谜题判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleOutcome {
    /// 解开了，附带成功后跳转的页（可能为空）
    Solved { success_page_id: String },
    Failed,
    /// 当前页没有该谜题
    NoPuzzle,
}

impl PuzzleOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }
}

/// PIN 码谜题
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinPuzzle {
    pub code: String,
    pub success_page_id: String,
    pub on_success: String,
    pub on_failure: String,
}

impl PinPuzzle {
    /// 输入与（展开后的）答案比较，忽略首尾空白
    pub fn matches(expected: &str, entered: &str) -> bool {
        !expected.trim().is_empty() && expected.trim() == entered.trim()
    }
}

impl Record for PinPuzzle {
    const DIVIDER: Divider = codec::PIN_PUZZLE;

    fn write(&self, out: &mut FieldWriter) {
        out.text(&self.code)
            .str(&self.success_page_id)
            .text(&self.on_success)
            .text(&self.on_failure);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            code: input.text(),
            success_page_id: input.str(),
            on_success: input.text(),
            on_failure: input.text(),
        }
    }
}

/// 符号序列谜题
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolPuzzle {
    /// 可选符号
    pub symbols: Vec<String>,
    /// 正确序列，逗号分隔
    pub pattern: String,
    pub success_page_id: String,
    pub on_success: String,
    pub on_failure: String,
}

impl SymbolPuzzle {
    /// 拆分（展开后的）答案序列
    pub fn solution(pattern: &str) -> Vec<&str> {
        pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// 输入序列与答案逐项比较
    pub fn matches(pattern: &str, entered: &[String]) -> bool {
        let solution = Self::solution(pattern);
        !solution.is_empty()
            && solution.len() == entered.len()
            && solution
                .iter()
                .zip(entered)
                .all(|(expected, got)| *expected == got.trim())
    }
}

impl Record for SymbolPuzzle {
    const DIVIDER: Divider = codec::SYMBOL_PUZZLE;

    fn write(&self, out: &mut FieldWriter) {
        out.strings(&self.symbols, codec::SYMBOL_LIST)
            .text(&self.pattern)
            .str(&self.success_page_id)
            .text(&self.on_success)
            .text(&self.on_failure);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            symbols: input.strings(codec::SYMBOL_LIST),
            pattern: input.text(),
            success_page_id: input.str(),
            on_success: input.text(),
            on_failure: input.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn test_pin_matches_trimmed() {
        assert!(PinPuzzle::matches("1234", " 1234 "));
        assert!(!PinPuzzle::matches("1234", "4321"));
        // 空答案永远解不开
        assert!(!PinPuzzle::matches("", ""));
    }

    #[test]
    fn test_symbol_sequence_must_match_exactly() {
        let entered = |s: &[&str]| s.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        assert!(SymbolPuzzle::matches("moon, sun ,star", &entered(&["moon", "sun", "star"])));
        assert!(!SymbolPuzzle::matches("moon,sun,star", &entered(&["moon", "sun"])));
        assert!(!SymbolPuzzle::matches("moon,sun", &entered(&["sun", "moon"])));
        assert!(!SymbolPuzzle::matches("", &entered(&[])));
    }

    #[test]
    fn test_puzzle_round_trip() {
        let symbols = SymbolPuzzle {
            symbols: vec!["moon".to_string(), "sun".to_string(), "star~x".to_string()],
            pattern: "sun,moon".to_string(),
            success_page_id: "vault|open".to_string(),
            on_success: "setBool(\"vault\", true)".to_string(),
            on_failure: String::new(),
        };
        assert_eq!(decode::<SymbolPuzzle>(&encode(&symbols)), symbols);

        let pin = PinPuzzle {
            code: "{{door.code}}".to_string(),
            ..Default::default()
        };
        assert_eq!(decode::<PinPuzzle>(&encode(&pin)), pin);
    }
}
