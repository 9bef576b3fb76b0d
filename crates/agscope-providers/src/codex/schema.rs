use serde::Deserialize;
use serde_json::Value;

// Lenient record shapes: every field defaults, unknown variants fall
// through to `Other`, and a shape mismatch leaves the record to the
// generic decoder.

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum CodexRecord {
    SessionMeta {
        #[serde(default)]
        payload: Value,
    },
    TurnContext {
        #[serde(default)]
        payload: Value,
    },
    ResponseItem {
        payload: ResponseItem,
    },
    EventMsg {
        payload: EventMsg,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum ResponseItem {
    Message {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        role: String,
        #[serde(default)]
        content: Value,
    },
    Reasoning {
        #[serde(default)]
        summary: Value,
    },
    FunctionCall {
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: Value,
        #[serde(default)]
        call_id: Option<String>,
    },
    FunctionCallOutput {
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        output: Value,
    },
    CustomToolCall {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
        #[serde(default)]
        call_id: Option<String>,
    },
    CustomToolCallOutput {
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        output: Value,
    },
    LocalShellCall {
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        action: Value,
    },
    WebSearchCall {
        #[serde(default)]
        action: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub(crate) enum EventMsg {
    UserMessage {
        #[serde(default)]
        message: String,
    },
    AgentMessage {
        #[serde(default)]
        message: String,
    },
    AgentReasoning {
        #[serde(default)]
        text: String,
    },
    AgentMessageDelta {
        #[serde(default)]
        delta: String,
        #[serde(default, alias = "id")]
        item_id: Option<String>,
    },
    AgentReasoningDelta {
        #[serde(default)]
        delta: String,
        #[serde(default, alias = "id")]
        item_id: Option<String>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    StreamError {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Other,
}
