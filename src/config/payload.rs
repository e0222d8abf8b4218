use serde_json::Value;

use super::fields::FieldMap;
use crate::error::Result;

/// 可以从字段映射构造、并序列化为 API 请求体的配置对象
pub trait ConfigPayload: Sized {
    /// 用任意字段集合构造对象，未知字段保留到 extra 中
    fn from_fields(fields: FieldMap) -> Result<Self>;

    /// 生成可直接作为 JSON 请求体提交的映射
    fn to_payload(&self) -> FieldMap;

    fn to_json(&self) -> Value {
        Value::Object(self.to_payload())
    }
}

/// 空值（null、空字符串、空列表、空映射）在序列化时省略，交由远端 API 使用其默认值
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// 按固定顺序写出请求体
///
/// 跳过空值以及 API 在写路径上拒绝的只读字段
pub struct PayloadWriter {
    payload: FieldMap,
    excluded: &'static [&'static str],
}

impl PayloadWriter {
    pub fn new(excluded: &'static [&'static str]) -> Self {
        Self {
            payload: FieldMap::new(),
            excluded,
        }
    }

    pub fn field(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if is_absent(&value) || self.excluded.contains(&key) {
            return self;
        }
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn optional<T: Into<Value>>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.field(key, value);
        }
        self
    }

    /// 合并 extra 字段；不会覆盖已写出的固定字段
    pub fn extend(&mut self, extra: &FieldMap) -> &mut Self {
        for (key, value) in extra {
            if self.payload.contains_key(key) {
                tracing::debug!(field = %key, "extra field shadows a fixed field, skipped");
                continue;
            }
            self.field(key, value.clone());
        }
        self
    }

    pub fn finish(self) -> FieldMap {
        self.payload
    }
}

/// 为配置对象实现 `Serialize`，输出与 `to_payload` 相同
#[macro_export]
macro_rules! impl_payload_serialize {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let payload = $crate::config::ConfigPayload::to_payload(self);
                serde::Serialize::serialize(&payload, serializer)
            }
        }
    };
}
