use serde_json::{Map, Value};

use crate::error::{Result, VoiceAgentError};

/// 配置对象的输入/输出映射：字段名 -> JSON 值，保持插入顺序
pub type FieldMap = Map<String, Value>;

/// 从调用方提供的字段映射中按名称取出固定 schema 字段
///
/// - `null` 等同于未提供，返回 `None`，调用方保留默认值
/// - 类型不符时返回 `InvalidFieldShape`
/// - 未被取走的字段通过 [`FieldReader::into_extra`] 原样保留
#[derive(Debug, Default)]
pub struct FieldReader {
    fields: FieldMap,
}

impl FieldReader {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        match self.fields.shift_remove(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    /// 原样取出字段值，由调用方自行解释类型
    pub fn value(&mut self, key: &str) -> Option<Value> {
        self.take(key)
    }

    pub fn string(&mut self, key: &str) -> Result<Option<String>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a string")),
        }
    }

    pub fn bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(value)),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a boolean")),
        }
    }

    pub fn number(&mut self, key: &str) -> Result<Option<f64>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Number(value)) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| VoiceAgentError::invalid_shape(key, "a finite number")),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a number")),
        }
    }

    pub fn integer(&mut self, key: &str) -> Result<Option<u64>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Number(value)) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| VoiceAgentError::invalid_shape(key, "a non-negative integer")),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a non-negative integer")),
        }
    }

    pub fn mapping(&mut self, key: &str) -> Result<Option<FieldMap>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Object(value)) => Ok(Some(value)),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a mapping")),
        }
    }

    pub fn string_list(&mut self, key: &str) -> Result<Option<Vec<String>>> {
        let Some(items) = self.list(key)? else {
            return Ok(None);
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(value) => Ok(value),
                _ => Err(VoiceAgentError::invalid_shape(
                    format!("{key}[{index}]"),
                    "a string",
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// 列表中的每个元素都必须是 mapping，例如 tools、nodes
    pub fn mapping_list(&mut self, key: &str) -> Result<Option<Vec<FieldMap>>> {
        let Some(items) = self.list(key)? else {
            return Ok(None);
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(value) => Ok(value),
                _ => Err(VoiceAgentError::invalid_shape(
                    format!("{key}[{index}]"),
                    "a mapping",
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn list(&mut self, key: &str) -> Result<Option<Vec<Value>>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(VoiceAgentError::invalid_shape(key, "a list")),
        }
    }

    /// 剩余的非 schema 字段，按调用方提供的顺序
    pub fn into_extra(self) -> FieldMap {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader(value: Value) -> FieldReader {
        match value {
            Value::Object(map) => FieldReader::new(map),
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_null_is_treated_as_missing() {
        let mut fields = reader(json!({"agent_name": null}));
        assert_eq!(fields.string("agent_name").unwrap(), None);
        assert!(fields.into_extra().is_empty());
    }

    #[test]
    fn test_wrong_type_reports_field() {
        let mut fields = reader(json!({"language": 42}));
        match fields.string("language") {
            Err(VoiceAgentError::InvalidFieldShape { field, .. }) => assert_eq!(field, "language"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_mapping_list_reports_element_index() {
        let mut fields = reader(json!({"tools": [{"name": "a"}, "b"]}));
        match fields.mapping_list("tools") {
            Err(VoiceAgentError::InvalidFieldShape { field, expected }) => {
                assert_eq!(field, "tools[1]");
                assert_eq!(expected, "a mapping");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extra_keeps_unknown_fields_in_order() {
        let mut fields = reader(json!({"zeta": 1, "agent_name": "Bob", "alpha": 2}));
        assert_eq!(fields.string("agent_name").unwrap().as_deref(), Some("Bob"));
        let keys: Vec<_> = fields.into_extra().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
