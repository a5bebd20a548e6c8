//! 字符串转义
//!
//! - 普通字符串：原样写出；包含保留字符 `~` 或以 `=` 开头时改写为 `=` + base64
//! - 自由文本（脚本源码、玩家输入）：总是 base64

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

const RESERVED: char = '~';
const ESCAPED_PREFIX: char = '=';

pub(crate) fn encode_plain(value: &str) -> String {
    if value.contains(RESERVED) || value.starts_with(ESCAPED_PREFIX) {
        format!("{ESCAPED_PREFIX}{}", STANDARD.encode(value))
    } else {
        value.to_string()
    }
}

pub(crate) fn decode_plain(field: &str) -> String {
    match field.strip_prefix(ESCAPED_PREFIX) {
        Some(encoded) => decode_base64(encoded),
        None => field.to_string(),
    }
}

pub(crate) fn encode_text(value: &str) -> String {
    STANDARD.encode(value)
}

pub(crate) fn decode_text(field: &str) -> String {
    decode_base64(field)
}

fn decode_base64(encoded: &str) -> String {
    match STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        Err(e) => {
            debug!(error = %e, "转义字段解码失败，使用空字符串");
            String::new()
        }
    }
}
