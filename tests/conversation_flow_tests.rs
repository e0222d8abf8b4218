use serde_json::{json, Value};
use voiceagent::{
    conversation_node, ConfigPayload, ConversationFlow, FieldMap, InvoiceReminder, VoiceAgentError,
};

fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn single_prompt_flow_has_one_conversation_node() {
    let flow = ConversationFlow::single_prompt_flow("Hello", None, FieldMap::new()).unwrap();
    assert_eq!(
        flow.to_json(),
        json!({
            "nodes": [{
                "id": "start",
                "instruction": {"text": "Hello", "type": "prompt"},
                "type": "conversation"
            }],
            "start_node_id": "start",
            "start_speaker": "agent",
            "model_choice": {"model": "gpt-4o-mini", "type": "cascading"}
        })
    );
    flow.validate_graph().unwrap();
}

#[test]
fn overrides_take_precedence_over_defaults() {
    let flow = ConversationFlow::single_prompt_flow(
        "Hi",
        None,
        fields(json!({
            "start_speaker": "user",
            "start_node_id": "greeting",
            "model_choice": {"model": "gpt-4o", "type": "cascading"},
            "global_prompt": "Be brief."
        })),
    )
    .unwrap();

    assert_eq!(flow.start_speaker(), "user");
    assert_eq!(flow.start_node_id(), "greeting");
    assert_eq!(flow.model_choice()["model"], json!("gpt-4o"));
    assert_eq!(flow.global_prompt(), Some("Be brief."));
    assert!(flow.get_node("greeting").is_some());
    flow.validate_graph().unwrap();
}

#[test]
fn tools_must_be_mappings() {
    let err = ConversationFlow::single_prompt_flow(
        "Hi",
        Some(vec![json!({"name": "a"}), json!(42)]),
        FieldMap::new(),
    )
    .expect_err("should fail");
    match err {
        VoiceAgentError::InvalidFieldShape { field, .. } => assert_eq!(field, "tools[1]"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn builder_accumulates_nodes_and_validates_graph() {
    let flow = ConversationFlow::builder()
        .node(conversation_node("start", "Greet the caller."))
        .node(conversation_node("wrap_up", "Say goodbye."))
        .model_temperature(0.3)
        .build()
        .unwrap();
    assert_eq!(flow.nodes().len(), 2);
    flow.validate_graph().unwrap();

    let duplicated = ConversationFlow::builder()
        .node(conversation_node("start", "a"))
        .node(conversation_node("start", "b"))
        .build()
        .unwrap();
    assert!(matches!(
        duplicated.validate_graph(),
        Err(VoiceAgentError::DuplicateNode(id)) if id == "start"
    ));

    let dangling = ConversationFlow::builder()
        .node(conversation_node("intro", "a"))
        .build()
        .unwrap();
    assert!(matches!(
        dangling.validate_graph(),
        Err(VoiceAgentError::UnknownNode(id)) if id == "start"
    ));
}

#[test]
fn response_fields_are_read_but_not_written() {
    let flow = ConversationFlow::from_fields(fields(json!({
        "conversation_flow_id": "cf_1",
        "version": 3,
        "nodes": [],
        "custom_setting": "keep"
    })))
    .unwrap();
    assert_eq!(flow.conversation_flow_id(), Some("cf_1"));

    let payload = flow.to_payload();
    assert!(!payload.contains_key("conversation_flow_id"));
    assert!(!payload.contains_key("version"));
    assert!(!payload.contains_key("nodes"));
    assert_eq!(payload["custom_setting"], json!("keep"));
}

#[test]
fn invoice_flow_round_trips() {
    let reminder = InvoiceReminder {
        company_name: "Alpha".into(),
        agent_name: "Ava".into(),
        customer_name: "Jordan Lee".into(),
        due_date: "2024-07-01".into(),
        service_name: "Premium Hosting".into(),
        balance: "$120.00".into(),
        current_date_time: "2024-06-20 10:00".into(),
    };
    let flow = reminder.conversation_flow(FieldMap::new()).unwrap();
    assert_eq!(flow.tools().len(), 4);

    let payload = flow.to_payload();
    let rebuilt = ConversationFlow::from_fields(payload.clone()).unwrap();
    assert_eq!(rebuilt, flow);
    assert_eq!(rebuilt.to_payload(), payload);
}
