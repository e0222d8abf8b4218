use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use voiceagent::logging::LoggingConfig;
use voiceagent::{
    AgentConfig, ConfigPayload, ConversationFlow, DynamicVariables, EnvConfig, FieldMap,
    InvoiceReminder, PromptTemplate,
};

#[derive(Parser)]
#[command(name = "voiceagent", version, about = "Voice agent payload tooling", author)]
struct Cli {
    /// Print compact JSON instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    Flow {
        #[command(subcommand)]
        command: FlowCommand,
    },
    Prompt {
        #[command(subcommand)]
        command: PromptCommand,
    },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Render a create-agent request body
    Render {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        voice_id: Option<String>,
        #[arg(long)]
        voice_model: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        webhook_url: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        /// Extra field as key=value; the value is parsed as JSON when possible
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
enum FlowCommand {
    /// Render a single-node conversation flow
    Single {
        #[arg(long)]
        prompt: String,
        /// JSON file holding a list of tool definitions
        #[arg(long)]
        tools: Option<PathBuf>,
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
enum PromptCommand {
    /// Substitute {{variables}} in a template file
    Render {
        #[arg(long)]
        template: PathBuf,
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Fail when a placeholder has no value
        #[arg(long)]
        strict: bool,
    },
    /// Invoice reminder prompt and its tools
    Invoice {
        #[arg(long, default_value = "Alpha")]
        company: String,
        #[arg(long, default_value = "Ava")]
        agent: String,
        #[arg(long)]
        customer: String,
        #[arg(long)]
        due_date: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        balance: String,
        #[arg(long)]
        date_time: String,
        /// Emit a conversation flow payload instead of prompt + tools
        #[arg(long)]
        flow: bool,
    },
}

fn main() -> anyhow::Result<()> {
    EnvConfig::load_dotenv();
    LoggingConfig::init();

    let cli = Cli::parse();
    let output = run(cli.command)?;

    match output {
        Value::String(text) => println!("{text}"),
        value if cli.compact => println!("{}", serde_json::to_string(&value)?),
        value => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

fn run(command: Command) -> anyhow::Result<Value> {
    let output = match command {
        Command::Agent { command } => match command {
            AgentCommand::Render {
                name,
                voice_id,
                voice_model,
                language,
                webhook_url,
                prompt,
                fields,
            } => {
                let mut map = parse_fields(&fields)?;
                insert_opt(&mut map, "agent_name", name);
                insert_opt(&mut map, "voice_id", voice_id);
                insert_opt(&mut map, "voice_model", voice_model);
                insert_opt(&mut map, "language", language);
                insert_opt(&mut map, "webhook_url", webhook_url);
                insert_opt(&mut map, "prompt", prompt);
                AgentConfig::from_fields(map)?.to_json()
            }
        },
        Command::Flow { command } => match command {
            FlowCommand::Single {
                prompt,
                tools,
                fields,
            } => {
                let tools = tools.map(|path| read_tools(&path)).transpose()?;
                ConversationFlow::single_prompt_flow(prompt, tools, parse_fields(&fields)?)?
                    .to_json()
            }
        },
        Command::Prompt { command } => match command {
            PromptCommand::Render {
                template,
                vars,
                strict,
            } => {
                let template = PromptTemplate::from_file(&template)?;
                let vars = parse_vars(&vars)?;
                let text = if strict {
                    template.render_strict(&vars)?
                } else {
                    template.render(&vars)
                };
                Value::String(text)
            }
            PromptCommand::Invoice {
                company,
                agent,
                customer,
                due_date,
                service,
                balance,
                date_time,
                flow,
            } => {
                let reminder = InvoiceReminder {
                    company_name: company,
                    agent_name: agent,
                    customer_name: customer,
                    due_date,
                    service_name: service,
                    balance,
                    current_date_time: date_time,
                };
                if flow {
                    reminder.conversation_flow(FieldMap::new())?.to_json()
                } else {
                    json!({
                        "prompt": reminder.prompt(),
                        "tools": reminder.tool_values()?,
                    })
                }
            }
        },
    };
    Ok(output)
}

fn split_pair(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{raw}`"))
}

fn parse_fields(raw: &[String]) -> anyhow::Result<FieldMap> {
    let mut map = FieldMap::new();
    for item in raw {
        let (key, value) = split_pair(item)?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn parse_vars(raw: &[String]) -> anyhow::Result<DynamicVariables> {
    raw.iter()
        .map(|item| split_pair(item).map(|(k, v)| (k.to_string(), v.to_string())))
        .collect()
}

fn insert_opt(map: &mut FieldMap, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value));
    }
}

fn read_tools(path: &PathBuf) -> anyhow::Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read tools file `{}`", path.display()))?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => Ok(items),
        _ => Err(anyhow!("tools file `{}` must hold a JSON list", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("voiceagent").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_fields_json_or_string() {
        let fields = parse_fields(&[
            "max_call_duration_ms=1800000".to_string(),
            "boosted_keywords=[\"Acme\"]".to_string(),
            "ambient_sound=coffee-shop".to_string(),
            "note=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(fields["max_call_duration_ms"], json!(1800000));
        assert_eq!(fields["boosted_keywords"], json!(["Acme"]));
        assert_eq!(fields["ambient_sound"], json!("coffee-shop"));
        assert_eq!(fields["note"], json!("a=b"));

        assert!(parse_fields(&["novalue".to_string()]).is_err());
        assert!(parse_fields(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_agent_render_command() {
        let cli = parse(&[
            "--compact",
            "agent",
            "render",
            "--name",
            "Sarah",
            "--voice-model",
            "not_a_model",
            "--prompt",
            "Be brief.",
            "--field",
            "agent_id=agent_1",
            "--field",
            "enable_backchannel=true",
        ]);
        assert!(cli.compact);
        let output = run(cli.command).unwrap();
        assert_eq!(
            output,
            json!({
                "agent_name": "Sarah",
                "allow_user_dtmf": true,
                "language": "en-US",
                "voice_model": "eleven_turbo_v2",
                "enable_backchannel": true,
                "config": {"prompt": "Be brief."}
            })
        );
    }

    #[test]
    fn test_flow_single_command_with_tools_file() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools.json");
        fs::write(&tools, r#"[{"type": "function", "function": {"name": "end_call"}}]"#).unwrap();

        let cli = parse(&[
            "flow",
            "single",
            "--prompt",
            "Hello",
            "--tools",
            tools.to_str().unwrap(),
            "--field",
            "start_speaker=user",
        ]);
        let output = run(cli.command).unwrap();
        assert_eq!(output["start_speaker"], json!("user"));
        assert_eq!(output["nodes"][0]["id"], json!("start"));
        assert_eq!(output["tools"][0]["function"]["name"], json!("end_call"));
    }

    #[test]
    fn test_tools_file_must_hold_list() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools.json");
        fs::write(&tools, r#"{"name": "end_call"}"#).unwrap();
        assert!(read_tools(&tools).is_err());
    }

    #[test]
    fn test_prompt_render_command() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("prompt.txt");
        fs::write(&template, "Hi {{customer_name}} from {{company_name}}").unwrap();
        let path = template.to_str().unwrap();

        let cli = parse(&["prompt", "render", "--template", path, "--var", "customer_name=Jordan"]);
        assert_eq!(
            run(cli.command).unwrap(),
            json!("Hi Jordan from {{company_name}}")
        );

        let strict = parse(&[
            "prompt",
            "render",
            "--template",
            path,
            "--var",
            "customer_name=Jordan",
            "--strict",
        ]);
        assert!(run(strict.command).is_err());
    }

    #[test]
    fn test_prompt_invoice_command() {
        let base = [
            "prompt",
            "invoice",
            "--customer",
            "Jordan Lee",
            "--due-date",
            "2024-07-01",
            "--service",
            "Premium Hosting",
            "--balance",
            "$120.00",
            "--date-time",
            "2024-06-20 10:00",
        ];
        let output = run(parse(&base).command).unwrap();
        assert!(output["prompt"].as_str().unwrap().contains("$120.00"));
        assert_eq!(output["tools"].as_array().unwrap().len(), 4);

        let mut with_flow = base.to_vec();
        with_flow.push("--flow");
        let flow = run(parse(&with_flow).command).unwrap();
        assert_eq!(flow["tools"].as_array().unwrap().len(), 4);
        assert_eq!(flow["start_node_id"], json!("start"));
    }

    #[test]
    fn test_missing_required_argument_is_rejected() {
        assert!(Cli::try_parse_from(["voiceagent", "flow", "single"]).is_err());
    }
}
