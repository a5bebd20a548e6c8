use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::debug;

use super::escape::{decode_plain, decode_text};
use super::{Code, Divider, Record, decode, split_on};
use crate::model::{Color, Point, Rect};

/// 字段读取器
///
/// 按写入顺序依次读取字段。读到末尾之后的字段全部视为空字段，
/// 所以旧版本存档缺少新字段时会得到默认值。
pub struct FieldReader<'a> {
    fields: Vec<&'a str>,
    cursor: usize,
    divider: Divider,
}

impl<'a> FieldReader<'a> {
    /// 创建读取器
    pub fn new(input: &'a str, divider: Divider) -> Self {
        Self {
            fields: split_on(input, divider.field),
            cursor: 0,
            divider,
        }
    }

    /// 剩余未读字段数
    pub fn remaining(&self) -> usize {
        self.fields.len().saturating_sub(self.cursor)
    }

    fn next(&mut self) -> &'a str {
        let field = self.fields.get(self.cursor).copied().unwrap_or("");
        self.cursor += 1;
        field
    }

    fn parse<T: FromStr + Default>(&mut self, kind: &str) -> T {
        let field = self.next();
        if field.is_empty() {
            return T::default();
        }
        field.parse().unwrap_or_else(|_| {
            debug!(
                field = field,
                kind = kind,
                divider = self.divider.field,
                "字段解析失败，使用默认值"
            );
            T::default()
        })
    }

    pub fn str(&mut self) -> String {
        decode_plain(self.next())
    }

    pub fn text(&mut self) -> String {
        decode_text(self.next())
    }

    pub fn bool(&mut self) -> bool {
        matches!(self.next(), "1" | "true")
    }

    pub fn int(&mut self) -> i64 {
        self.parse("int")
    }

    pub fn double(&mut self) -> f64 {
        self.parse("double")
    }

    pub fn float(&mut self) -> f32 {
        self.parse("float")
    }

    pub fn point(&mut self) -> Point {
        let [x, y] = components::<2>(self.next());
        Point::new(x, y)
    }

    pub fn color(&mut self) -> Color {
        let field = self.next();
        if field.is_empty() {
            return Color::default();
        }
        let [r, g, b, a] = components::<4>(field);
        Color::rgba(r as f32, g as f32, b as f32, a as f32)
    }

    pub fn rect(&mut self) -> Rect {
        let [x, y, width, height] = components::<4>(self.next());
        Rect::new(x, y, width, height)
    }

    pub fn code<C: Code>(&mut self) -> C {
        let field = self.next();
        C::from_code(field).unwrap_or_else(|| {
            if !field.is_empty() {
                debug!(code = field, "未知枚举编码，使用默认值");
            }
            C::default()
        })
    }

    pub fn child<T: Record>(&mut self) -> T {
        decode(self.next())
    }

    pub fn optional<T: Record>(&mut self) -> Option<T> {
        self.next().strip_prefix('1').map(decode)
    }

    pub fn list<T: Record>(&mut self) -> Vec<T> {
        let parts = split_on(self.next(), T::DIVIDER.list);
        let count = parts[0].parse::<usize>().unwrap_or(0);
        parts[1..].iter().take(count).map(|part| decode(part)).collect()
    }

    /// 读取固定槽位数组，缺失的槽位补 `None`
    pub fn slots<T: Record>(&mut self, count: usize) -> Vec<Option<T>> {
        let field = self.next();
        let parts = if field.is_empty() {
            Vec::new()
        } else {
            split_on(field, T::DIVIDER.list)
        };
        (0..count)
            .map(|i| {
                parts
                    .get(i)
                    .and_then(|part| part.strip_prefix('1'))
                    .map(decode)
            })
            .collect()
    }

    pub fn map(&mut self, token: &str) -> BTreeMap<String, String> {
        let field = self.next();
        if field.is_empty() {
            return BTreeMap::new();
        }
        split_on(field, token)
            .chunks_exact(2)
            .map(|pair| (decode_plain(pair[0]), decode_plain(pair[1])))
            .collect()
    }

    pub fn strings(&mut self, token: &str) -> Vec<String> {
        let parts = split_on(self.next(), token);
        let count = parts[0].parse::<usize>().unwrap_or(0);
        parts[1..]
            .iter()
            .take(count)
            .map(|part| decode_plain(part))
            .collect()
    }
}

/// 解析逗号分隔的数值分量，缺失或非法分量取 0
fn components<const N: usize>(field: &str) -> [f64; N] {
    let mut values = [0.0; N];
    for (slot, part) in values.iter_mut().zip(field.split(',')) {
        *slot = part.trim().parse().unwrap_or(0.0);
    }
    values
}
