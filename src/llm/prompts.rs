//! Chat prompt construction
//!
//! A system message carrying the response schema, three few-shot pairs and
//! the user's request.

use serde::{Deserialize, Serialize};

/// Schema the model is asked to follow
pub const REVERB_SCHEMA_SNIPPET: &str = r#"{
  "schema_version": "reverb_v1",
  "reverb": {
    "gains_db": [number, ... 12 items total, each between -12 and 12],
    "decays_s": [number, ... 12 items total, each between 0.2 and 6.0],
    "mix": number between 0 and 1
  },
  "reason": "optional string up to 280 chars"
}"#;

/// Appended to the last user message when the first reply was not JSON
pub const JSON_ONLY_REMINDER: &str = "\nRespond with JSON only.";

const FEW_SHOTS: [(&str, &str); 3] = [
    (
        "intimate vocal, small room",
        r#"{"schema_version":"reverb_v1","reverb":{"gains_db":[0,0,0,0,-1,-2,-2,-1,0,0,0,0],"decays_s":[0.8,0.8,0.8,0.8,0.9,1.0,1.0,1.0,0.9,0.9,0.8,0.8],"mix":0.20},"reason":"Small room, slight HF damp."}"#,
    ),
    (
        "large hall pad, airy",
        r#"{"schema_version":"reverb_v1","reverb":{"gains_db":[1,1,1,1,0,0,0,0,1,1,2,2],"decays_s":[2.2,2.2,2.4,2.5,2.6,2.8,3.0,3.2,3.3,3.4,3.6,3.8],"mix":0.45},"reason":"Long tail, bright top."}"#,
    ),
    (
        "tight drum room",
        r#"{"schema_version":"reverb_v1","reverb":{"gains_db":[0,0,0,0,0,0,0,-1,-2,-2,-2,-2],"decays_s":[0.4,0.4,0.45,0.5,0.55,0.6,0.6,0.55,0.5,0.45,0.4,0.35],"mix":0.15},"reason":"Short decay, rolled highs."}"#,
    ),
];

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat-completions message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

fn system_prompt(fx_type: &str) -> String {
    format!(
        "You convert natural-language mixing instructions into JSON parameters for {fx_type}.\n\
         Return a single JSON object exactly matching this schema:\n\n\
         {REVERB_SCHEMA_SNIPPET}\n\n\
         No text outside JSON. No comments. No trailing commas.\n"
    )
}

/// Build the full message list for one translation request
pub fn build_messages(fx_type: &str, instruction: &str, instrument: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + 2 * FEW_SHOTS.len());
    messages.push(ChatMessage::new(Role::System, system_prompt(fx_type)));
    for (text, example) in FEW_SHOTS {
        messages.push(ChatMessage::new(Role::User, text));
        messages.push(ChatMessage::new(Role::Assistant, example));
    }
    messages.push(ChatMessage::new(
        Role::User,
        format!(
            "Instruction: \"{}\"\nInstrument: \"{}\"\nOutput JSON only.",
            instruction, instrument
        ),
    ));
    messages
}
