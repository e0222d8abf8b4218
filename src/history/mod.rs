//! 根据客户的历史通话记录推导动态变量
//!
//! 只做纯计算；记录从哪里来（webhook、数据库、`list_calls`）由调用方决定。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FieldMap;
use crate::prompt::DynamicVariables;

/// 参与推导的最近通话数量
pub const RECENT_CALL_LIMIT: usize = 5;

const POSITIVE_SENTIMENT: &str = "Positive";
const ISSUE_CATEGORY: &str = "issue_category";

/// 通话分析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallAnalysis {
    #[serde(default)]
    pub call_summary: Option<String>,
    #[serde(default)]
    pub call_successful: Option<bool>,
    #[serde(default)]
    pub user_sentiment: Option<String>,
}

/// 一次通话的记录，字段与 call_ended / call_analyzed 事件中的 `call` 对象一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub call_type: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub end_timestamp: Option<i64>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub retell_llm_dynamic_variables: FieldMap,
    #[serde(default)]
    pub call_analysis: Option<CallAnalysis>,
    #[serde(default)]
    pub disconnection_reason: Option<String>,
    #[serde(default)]
    pub collected_dynamic_variables: FieldMap,
}

impl CallRecord {
    /// 客户号码：呼入取主叫号码，其余取被叫号码
    pub fn customer_phone(&self) -> Option<&str> {
        if self.direction.as_deref() == Some("inbound") {
            self.from_number.as_deref()
        } else {
            self.to_number.as_deref()
        }
    }

    pub fn issue_category(&self) -> Option<&str> {
        self.collected_dynamic_variables
            .get(ISSUE_CATEGORY)
            .and_then(Value::as_str)
    }

    fn analysis(&self) -> Option<&CallAnalysis> {
        self.call_analysis.as_ref()
    }

    fn sentiment(&self) -> Option<&str> {
        self.analysis()
            .and_then(|a| a.user_sentiment.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// 客户基本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub account_type: String,
    pub priority_level: String,
}

impl CustomerProfile {
    /// 从通话时传入的动态变量中提取客户信息
    pub fn from_call(call: &CallRecord) -> Self {
        let lookup = |key: &str, default: &str| {
            call.retell_llm_dynamic_variables
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };
        Self {
            name: lookup("customer_name", "Unknown"),
            account_type: lookup("account_type", "Standard"),
            priority_level: lookup("priority_level", "Normal"),
        }
    }
}

/// 推导客户上下文时使用的公司侧固定信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContext {
    pub agent_name: String,
    pub company_name: String,
    pub business_hours: String,
}

impl Default for CustomerContext {
    fn default() -> Self {
        Self {
            agent_name: "Sarah Johnson".to_string(),
            company_name: "Acme Corporation".to_string(),
            business_hours: "9 AM to 5 PM EST".to_string(),
        }
    }
}

impl CustomerContext {
    /// 生成通话时注入的动态变量
    ///
    /// 只使用按 `start_timestamp` 倒序的最近 [`RECENT_CALL_LIMIT`] 次通话。
    pub fn derive(&self, profile: Option<&CustomerProfile>, calls: &[CallRecord]) -> DynamicVariables {
        let recent = recent_calls(calls);
        let mut vars = DynamicVariables::new();
        let mut set = |key: &str, value: String| {
            vars.insert(key.to_string(), value);
        };

        set(
            "customer_name",
            profile.map_or("Valued Customer".to_string(), |p| p.name.clone()),
        );
        set(
            "account_type",
            profile.map_or("Standard".to_string(), |p| p.account_type.clone()),
        );
        set(
            "priority_level",
            profile.map_or("Normal".to_string(), |p| p.priority_level.clone()),
        );
        set("total_previous_calls", recent.len().to_string());
        set("agent_name", self.agent_name.clone());
        set("company_name", self.company_name.clone());
        set("business_hours", self.business_hours.clone());

        match recent.first() {
            Some(latest) => {
                let analysis = latest.analysis();
                set(
                    "last_call_summary",
                    analysis
                        .and_then(|a| a.call_summary.clone())
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "No summary available".to_string()),
                );
                set(
                    "last_call_successful",
                    match analysis.and_then(|a| a.call_successful) {
                        Some(true) => "True".to_string(),
                        Some(false) => "False".to_string(),
                        None => "Unknown".to_string(),
                    },
                );
                set(
                    "last_call_sentiment",
                    latest.sentiment().unwrap_or("Neutral").to_string(),
                );
                set("previous_issues", common_issues(&recent));
                set("customer_satisfaction_trend", satisfaction_trend(&recent));
            }
            None => {
                set("last_call_summary", "No previous calls on record".to_string());
                set("last_call_successful", "N/A".to_string());
                set("last_call_sentiment", "N/A".to_string());
                set("previous_issues", "None on record".to_string());
                set("customer_satisfaction_trend", "New customer".to_string());
            }
        }

        tracing::debug!(calls = recent.len(), "customer context derived");
        vars
    }
}

fn recent_calls(calls: &[CallRecord]) -> Vec<&CallRecord> {
    let mut sorted: Vec<&CallRecord> = calls.iter().collect();
    sorted.sort_by(|a, b| b.start_timestamp.cmp(&a.start_timestamp));
    sorted.truncate(RECENT_CALL_LIMIT);
    sorted
}

/// 历史通话中出现过的问题分类，去重并排序
pub fn common_issues(calls: &[&CallRecord]) -> String {
    let issues: BTreeSet<&str> = calls.iter().filter_map(|c| c.issue_category()).collect();
    if issues.is_empty() {
        return "No specific issues identified".to_string();
    }
    let issues: Vec<&str> = issues.into_iter().collect();
    format!("Common issues: {}", issues.join(", "))
}

/// 按正面情绪占比给出满意度趋势
pub fn satisfaction_trend(calls: &[&CallRecord]) -> String {
    let sentiments: Vec<&str> = calls.iter().filter_map(|c| c.sentiment()).collect();
    if sentiments.is_empty() {
        return "No sentiment data".to_string();
    }
    let positive = sentiments.iter().filter(|s| **s == POSITIVE_SENTIMENT).count();
    let ratio = positive as f64 / sentiments.len() as f64;
    if ratio > 0.7 {
        "Generally satisfied".to_string()
    } else if ratio > 0.4 {
        "Mixed satisfaction".to_string()
    } else {
        "Needs attention".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(start: i64, sentiment: Option<&str>, issue: Option<&str>) -> CallRecord {
        let mut collected = FieldMap::new();
        if let Some(issue) = issue {
            collected.insert(ISSUE_CATEGORY.to_string(), json!(issue));
        }
        CallRecord {
            call_id: format!("call_{start}"),
            start_timestamp: Some(start),
            call_analysis: Some(CallAnalysis {
                call_summary: Some(format!("summary {start}")),
                call_successful: Some(true),
                user_sentiment: sentiment.map(str::to_string),
            }),
            collected_dynamic_variables: collected,
            ..Default::default()
        }
    }

    #[test]
    fn test_customer_phone_by_direction() {
        let mut record = CallRecord {
            from_number: Some("+1000".into()),
            to_number: Some("+2000".into()),
            direction: Some("inbound".into()),
            ..Default::default()
        };
        assert_eq!(record.customer_phone(), Some("+1000"));
        record.direction = Some("outbound".into());
        assert_eq!(record.customer_phone(), Some("+2000"));
    }

    #[test]
    fn test_satisfaction_thresholds() {
        let calls = [
            call(1, Some("Positive"), None),
            call(2, Some("Positive"), None),
            call(3, Some("Negative"), None),
        ];
        let refs: Vec<&CallRecord> = calls.iter().collect();
        assert_eq!(satisfaction_trend(&refs), "Mixed satisfaction");
        assert_eq!(satisfaction_trend(&refs[..2]), "Generally satisfied");
        assert_eq!(satisfaction_trend(&refs[2..]), "Needs attention");

        let silent = [call(4, None, None)];
        let refs: Vec<&CallRecord> = silent.iter().collect();
        assert_eq!(satisfaction_trend(&refs), "No sentiment data");
    }

    #[test]
    fn test_common_issues_sorted_and_deduped() {
        let calls = [
            call(1, None, Some("technical")),
            call(2, None, Some("billing")),
            call(3, None, Some("technical")),
        ];
        let refs: Vec<&CallRecord> = calls.iter().collect();
        assert_eq!(common_issues(&refs), "Common issues: billing, technical");
        assert_eq!(common_issues(&[]), "No specific issues identified");
    }

    #[test]
    fn test_recent_calls_limited_and_ordered() {
        let calls: Vec<CallRecord> = (1..=7).map(|i| call(i, None, None)).collect();
        let recent = recent_calls(&calls);
        assert_eq!(recent.len(), RECENT_CALL_LIMIT);
        assert_eq!(recent[0].start_timestamp, Some(7));
        assert_eq!(recent[4].start_timestamp, Some(3));
    }
}
