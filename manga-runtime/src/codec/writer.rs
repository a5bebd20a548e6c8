use std::collections::BTreeMap;

use super::escape::{encode_plain, encode_text};
use super::{Code, Divider, Record, encode};
use crate::model::{Color, Point, Rect};

/// 字段写入器
///
/// 所有方法返回 `&mut Self`，可以链式调用。
pub struct FieldWriter {
    divider: Divider,
    fields: Vec<String>,
}

impl FieldWriter {
    /// 创建写入器
    pub fn new(divider: Divider) -> Self {
        Self {
            divider,
            fields: Vec::new(),
        }
    }

    fn push(&mut self, field: String) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// 普通字符串（id、路径等）
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.push(encode_plain(value))
    }

    /// 自由文本（脚本、正文），总是转义
    pub fn text(&mut self, value: &str) -> &mut Self {
        self.push(encode_text(value))
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.push(if value { "1" } else { "0" }.to_string())
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.push(value.to_string())
    }

    pub fn double(&mut self, value: f64) -> &mut Self {
        self.push(value.to_string())
    }

    pub fn float(&mut self, value: f32) -> &mut Self {
        self.push(value.to_string())
    }

    pub fn point(&mut self, value: Point) -> &mut Self {
        self.push(format!("{},{}", value.x, value.y))
    }

    pub fn color(&mut self, value: Color) -> &mut Self {
        self.push(format!("{},{},{},{}", value.r, value.g, value.b, value.a))
    }

    pub fn rect(&mut self, value: Rect) -> &mut Self {
        self.push(format!(
            "{},{},{},{}",
            value.x, value.y, value.width, value.height
        ))
    }

    /// 枚举
    pub fn code<C: Code>(&mut self, value: &C) -> &mut Self {
        self.push(value.code().to_string())
    }

    /// 必有的子实体
    pub fn child<T: Record>(&mut self, value: &T) -> &mut Self {
        self.push(encode(value))
    }

    /// 可选子实体：`0` 表示不存在，`1` + 子实体编码表示存在
    pub fn optional<T: Record>(&mut self, value: Option<&T>) -> &mut Self {
        let field = match value {
            Some(child) => format!("1{}", encode(child)),
            None => "0".to_string(),
        };
        self.push(field)
    }

    /// 子实体列表：数量 + 以元素类型的 list 分隔符连接的元素
    pub fn list<T: Record>(&mut self, values: &[T]) -> &mut Self {
        let mut field = values.len().to_string();
        for value in values {
            field.push_str(T::DIVIDER.list);
            field.push_str(&encode(value));
        }
        self.push(field)
    }

    /// 固定槽位数组，每个槽位按可选子实体编码
    pub fn slots<T: Record>(&mut self, slots: &[Option<T>]) -> &mut Self {
        let field = slots
            .iter()
            .map(|slot| match slot {
                Some(child) => format!("1{}", encode(child)),
                None => "0".to_string(),
            })
            .collect::<Vec<_>>()
            .join(T::DIVIDER.list);
        self.push(field)
    }

    /// 字符串字典，展开为 key/value 交替序列
    pub fn map(&mut self, values: &BTreeMap<String, String>, token: &str) -> &mut Self {
        let field = values
            .iter()
            .flat_map(|(k, v)| [encode_plain(k), encode_plain(v)])
            .collect::<Vec<_>>()
            .join(token);
        self.push(field)
    }

    /// 字符串列表：数量 + 元素
    pub fn strings(&mut self, values: &[String], token: &str) -> &mut Self {
        let mut field = values.len().to_string();
        for value in values {
            field.push_str(token);
            field.push_str(&encode_plain(value));
        }
        self.push(field)
    }

    /// 以字段分隔符连接所有字段
    pub fn finish(self) -> String {
        self.fields.join(self.divider.field)
    }
}
