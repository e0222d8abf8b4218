use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::config::FieldMap;
use crate::error::{Result, VoiceAgentError};

/// 通话时由平台替换的动态变量，按名称排序
pub type DynamicVariables = BTreeMap<String, String>;

/// 合并默认值与覆盖值，覆盖值优先
pub fn merge_variables(defaults: &DynamicVariables, overrides: &DynamicVariables) -> DynamicVariables {
    let mut merged = defaults.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// 转为 `default_dynamic_variables` 等字段使用的映射
pub fn variables_to_fields(variables: &DynamicVariables) -> FieldMap {
    variables
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Variable { raw: &'a str, name: &'a str },
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// 切分文本与占位符
///
/// 无效的 `{{` 只作为普通文本消耗两个字符，扫描从其后继续，
/// 因此 `{{ {{name}}` 中的 `{{name}}` 仍会被识别。
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            parts.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let variable = after.find("}}").and_then(|end| {
            let name = after[..end].trim();
            is_variable_name(name).then(|| (&rest[start..start + 2 + end + 2], name, end))
        });
        match variable {
            Some((raw, name, end)) => {
                parts.push(Segment::Variable { raw, name });
                rest = &after[end + 2..];
            }
            None => {
                parts.push(Segment::Text(&rest[start..start + 2]));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        parts.push(Segment::Text(rest));
    }
    parts
}

/// 带 `{{name}}` 占位符的 prompt 模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt template `{}`", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 模板中出现的变量名，按首次出现顺序，去重
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        segments(&self.text)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Variable { name, .. } if seen.insert(name) => Some(name.to_string()),
                _ => None,
            })
            .collect()
    }

    /// 替换已知变量；未提供的变量原样保留，交给平台在通话时替换
    pub fn render(&self, variables: &DynamicVariables) -> String {
        segments(&self.text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => text,
                Segment::Variable { raw, name } => {
                    variables.get(name).map(String::as_str).unwrap_or(raw)
                }
            })
            .collect()
    }

    /// 所有变量都必须提供，否则返回 `MissingVariable`
    pub fn render_strict(&self, variables: &DynamicVariables) -> Result<String> {
        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| !variables.contains_key(name))
        {
            return Err(VoiceAgentError::MissingVariable(missing));
        }
        Ok(self.render(variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> DynamicVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_placeholders_in_first_seen_order() {
        let template = PromptTemplate::new(
            "Hello {{customer_name}}, this is {{ agent_name }} from {{company_name}}. Bye {{customer_name}}",
        );
        assert_eq!(
            template.placeholders(),
            vec!["customer_name", "agent_name", "company_name"]
        );
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let template = PromptTemplate::new("Hi {{customer_name}}, account {{account_type}}");
        let rendered = template.render(&vars(&[("customer_name", "John")]));
        assert_eq!(rendered, "Hi John, account {{account_type}}");
    }

    #[test]
    fn test_render_ignores_template_tags_and_unclosed_braces() {
        let template = PromptTemplate::new("{% if x %}{{ not valid! }} {{open");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&DynamicVariables::new()), template.text());
    }

    #[test]
    fn test_invalid_opener_does_not_swallow_following_placeholder() {
        let template = PromptTemplate::new("{{ {{name}} and {{bad name}} {{x}}");
        assert_eq!(template.placeholders(), vec!["name", "x"]);
        assert_eq!(
            template.render(&vars(&[("name", "Ava"), ("x", "1")])),
            "{{ Ava and {{bad name}} 1"
        );
    }

    #[test]
    fn test_render_strict_reports_missing() {
        let template = PromptTemplate::new("{{a}} and {{b}}");
        match template.render_strict(&vars(&[("a", "1")])) {
            Err(VoiceAgentError::MissingVariable(name)) => assert_eq!(name, "b"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            template.render_strict(&vars(&[("a", "1"), ("b", "2")])).unwrap(),
            "1 and 2"
        );
    }

    #[test]
    fn test_merge_variables_prefers_overrides() {
        let merged = merge_variables(
            &vars(&[("customer_name", "Valued Customer"), ("account_type", "Standard")]),
            &vars(&[("customer_name", "Jane")]),
        );
        assert_eq!(merged["customer_name"], "Jane");
        assert_eq!(merged["account_type"], "Standard");
    }
}
