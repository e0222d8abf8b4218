use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tools::FunctionTool;
use crate::config::{ConversationFlow, FieldMap};
use crate::error::Result;

const USER_FEEDBACK: &str = "user_feedback";
const CONVERSATION_SUMMARY: &str = "conversation_summary";

/// 催缴发票通知场景的 prompt 与工具
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceReminder {
    pub company_name: String,
    pub agent_name: String,
    pub customer_name: String,
    pub due_date: String,
    pub service_name: String,
    pub balance: String,
    pub current_date_time: String,
}

impl InvoiceReminder {
    pub fn prompt(&self) -> String {
        let Self {
            company_name,
            agent_name,
            customer_name,
            due_date,
            service_name,
            balance,
            current_date_time,
        } = self;
        [
            format!("You are {agent_name}, a virtual agent for a company called {company_name}."),
            format!("Current date-time is {current_date_time}."),
            format!(
                "Your job is to notify the user about their pending invoice, which refers to an outstanding payment the user is required to make for services or products rendered by {company_name}."
            ),
            format!(
                "You are speaking with {customer_name}, whose invoice of {balance} has a due-date of {due_date} for the service {service_name}."
            ),
            "Start by introducing yourself as virtual agent and addressing the user by their first name.".to_string(),
            "Politely ask if it is a good time to talk, and wait for their response.".to_string(),
            "If the user indicates they are unavailable, ask for a date and time to reschedule, and pass these to the reschedule_call function.".to_string(),
            "If the user confirms, explain the purpose of the call: to notify them of a pending invoice and ask for a payment date.".to_string(),
            "If a payment date is provided, pass it to the inform_invoice function.".to_string(),
            "If the user disputes, pass their response to the dispute function.".to_string(),
            "If the user says they have already paid, pass their response to the invoice_paid function.".to_string(),
            "Keep responses polite, concise, and professional.".to_string(),
        ]
        .join(" ")
    }

    /// 四个函数工具：改期、告知付款日期、争议、已付款
    pub fn tools(&self) -> Vec<FunctionTool> {
        let with_common = |builder: super::tools::FunctionToolBuilder| {
            builder
                .string_param(USER_FEEDBACK, "User's feedback.")
                .string_param(CONVERSATION_SUMMARY, "Summary of the conversation.")
                .build()
        };

        vec![
            with_common(
                FunctionTool::builder("reschedule_call")
                    .description("Reschedules a call for a pending invoice. Requires date and time.")
                    .string_param("reschedule_call_datetime", "Date and time for rescheduling."),
            ),
            with_common(
                FunctionTool::builder("inform_invoice")
                    .description("Inform the user about their pending invoice and ask for payment date.")
                    .string_param("payment_date", "Date the user will pay."),
            ),
            with_common(
                FunctionTool::builder("dispute")
                    .description("Handle user disputes about the invoice.")
                    .string_param("dispute", "Reason for dispute."),
            ),
            with_common(
                FunctionTool::builder("invoice_paid")
                    .description("Handle user confirmation of invoice payment.")
                    .string_param("invoice_paid", "Details of payment confirmation."),
            ),
        ]
    }

    pub fn tool_values(&self) -> Result<Vec<Value>> {
        self.tools().iter().map(FunctionTool::to_value).collect()
    }

    /// 以该 prompt 和工具构建单节点对话流程
    pub fn conversation_flow(&self, overrides: FieldMap) -> Result<ConversationFlow> {
        ConversationFlow::single_prompt_flow(self.prompt(), Some(self.tool_values()?), overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder() -> InvoiceReminder {
        InvoiceReminder {
            company_name: "Alpha".into(),
            agent_name: "Ava".into(),
            customer_name: "John Doe".into(),
            due_date: "2025-09-01".into(),
            service_name: "Web Hosting".into(),
            balance: "150.00".into(),
            current_date_time: "2025-08-20 10:00:00".into(),
        }
    }

    #[test]
    fn test_prompt_mentions_context() {
        let prompt = reminder().prompt();
        assert!(prompt.starts_with("You are Ava, a virtual agent for a company called Alpha."));
        assert!(prompt.contains("John Doe"));
        assert!(prompt.contains("2025-09-01"));
        assert!(prompt.contains("Web Hosting"));
        assert!(prompt.contains("150.00"));
        assert!(prompt.contains("2025-08-20 10:00:00"));
    }

    #[test]
    fn test_tools_share_common_parameters() {
        let tools = reminder().tools();
        let names: Vec<_> = tools.iter().map(FunctionTool::name).collect();
        assert_eq!(names, vec!["reschedule_call", "inform_invoice", "dispute", "invoice_paid"]);
        for tool in &tools {
            let props = &tool.function.parameters.properties;
            assert_eq!(props.len(), 3);
            assert!(props.contains_key("user_feedback"));
            assert!(props.contains_key("conversation_summary"));
        }
    }

    #[test]
    fn test_conversation_flow_carries_tools() {
        let flow = reminder().conversation_flow(FieldMap::new()).unwrap();
        assert_eq!(flow.tools().len(), 4);
        assert_eq!(flow.nodes().len(), 1);
    }
}
