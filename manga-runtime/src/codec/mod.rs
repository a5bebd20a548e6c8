//! # Codec 模块
//!
//! 存档使用的紧凑文本序列化协议。
//!
//! ## 格式
//!
//! 每种实体类型都有一对**独占的**分隔符（[`Divider`]）：
//!
//! - `field`：分隔该实体自身的字段
//! - `list`：分隔该实体组成的列表 / 固定槽位数组的元素
//!
//! 分隔符统一写成 `~tag~` 的形式。普通字符串中出现 `~` 时会自动转义，
//! 因此任何 `~` 都一定是某个分隔符的开头，切分时按完整 token 匹配，
//! 不同层级之间不会互相误判。
//!
//! ```text
//! Chapter:  id ~ch~ title ~ch~ purgable ~ch~ pages
//! pages:    2 ~pg*~ <page> ~pg*~ <page>
//! ```
//!
//! ## 容错
//!
//! 解码永远不会失败：字段缺失或格式错误时取类型默认值
//! （空字符串、`false`、`0`），与 [`StateStore`](crate::state::StateStore)
//! 的类型化读取保持一致。

mod dividers;
mod escape;
mod reader;
mod writer;

pub use dividers::*;
pub use reader::FieldReader;
pub use writer::FieldWriter;

/// 实体类型的分隔符对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Divider {
    /// 字段分隔符
    pub field: &'static str,
    /// 列表元素分隔符
    pub list: &'static str,
}

impl Divider {
    /// 创建分隔符对
    pub const fn new(field: &'static str, list: &'static str) -> Self {
        Self { field, list }
    }
}

/// 可序列化的实体
///
/// 字段的写入顺序就是存档格式的一部分，调整顺序会破坏已有存档。
/// 新字段只能追加在末尾。
pub trait Record: Default {
    /// 该类型独占的分隔符
    const DIVIDER: Divider;

    /// 按固定顺序写出所有字段
    fn write(&self, out: &mut FieldWriter);

    /// 按相同顺序读回所有字段
    fn read(input: &mut FieldReader<'_>) -> Self;
}

/// 以稳定字符串编码的枚举
pub trait Code: Sized + Default {
    /// 存档中使用的编码
    fn code(&self) -> &'static str;

    /// 从编码还原，未知编码返回 `None`
    fn from_code(code: &str) -> Option<Self>;
}

/// 序列化实体
pub fn encode<T: Record>(value: &T) -> String {
    let mut out = FieldWriter::new(T::DIVIDER);
    value.write(&mut out);
    out.finish()
}

/// 反序列化实体
///
/// 不会失败，格式错误的字段回退为默认值。
pub fn decode<T: Record>(input: &str) -> T {
    let mut reader = FieldReader::new(input, T::DIVIDER);
    T::read(&mut reader)
}

/// 按完整的分隔符 token 切分
///
/// `~` 总是开启一个分隔符，分隔符持续到下一个 `~`。
/// 只有与 `token` 完全相同的分隔符才会切分。
pub(crate) fn split_on<'a>(input: &'a str, token: &str) -> Vec<&'a str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'~' {
            i += 1;
            continue;
        }
        let Some(offset) = input[i + 1..].find('~') else {
            break;
        };
        let close = i + 1 + offset;
        if &input[i..=close] == token {
            parts.push(&input[start..i]);
            start = close + 1;
        }
        i = close + 1;
    }

    parts.push(&input[start..]);
    parts
}
