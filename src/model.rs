use crate::error::PanelError;
use serde::{Deserialize, Serialize};

/// Output token budget sent with every panel request.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// News item loaded by the "example" action.
pub const EXAMPLE_NEWS: &str = "NVIDIA unveils an energy\u{2011}efficient GPU architecture aimed at hyperscale datacenters.\nVendors expect lower TCO due to reduced power draw.";

/// One outbound request. `text` is sent as-is; blank text never gets this far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRequest {
    pub text: String,
    pub max_output_tokens: u32,
}

impl PanelRequest {
    pub fn new(text: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            text: text.into(),
            max_output_tokens,
        }
    }

    /// JSON body for `POST /full_pipeline`.
    pub fn wire_body(&self) -> FullPipelineBody<'_> {
        FullPipelineBody {
            news: &self.text,
            max_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FullPipelineBody<'a> {
    pub news: &'a str,
    pub max_tokens: u32,
}

/// Response body of `POST /full_pipeline`, as loose as the service allows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelResponse {
    #[serde(default)]
    pub news: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<WireReaction>>,
    // Usually a string, but objects are accepted and re-serialized.
    #[serde(default)]
    pub meta_review: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    pub personality: String,
    #[serde(default)]
    pub reaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reaction {
    pub personality_id: String,
    pub reaction_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub personality_id: String,
    pub message: String,
}

/// Parsed outcome of one successful request. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelResult {
    pub source_text: String,
    pub reactions: Vec<Reaction>,
    /// Raw meta review text; its mode is decided at render time.
    pub meta_review: Option<String>,
    pub per_item_errors: Vec<ItemError>,
}

impl From<PanelResponse> for PanelResult {
    fn from(resp: PanelResponse) -> Self {
        let reactions = resp
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|r| Reaction {
                personality_id: r.personality,
                reaction_text: r.reaction,
            })
            .collect();

        let meta_review = match resp.meta_review {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        let per_item_errors = resp
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|(personality_id, v)| ItemError {
                personality_id,
                message: match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            })
            .collect();

        Self {
            source_text: resp.news.unwrap_or_default(),
            reactions,
            meta_review,
            per_item_errors,
        }
    }
}

/// Lifecycle of the panel. Exactly one is active; owned by `PanelController`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Succeeded(PanelResult),
    Failed(String),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Running => "Running",
            RunState::Succeeded(_) => "Done",
            RunState::Failed(_) => "Failed",
        }
    }
}

/// Events sent from the request dispatcher back to whoever owns the controller.
#[derive(Debug)]
pub enum PanelEvent {
    Completed {
        seq: u64,
        outcome: Result<PanelResult, PanelError>,
    },
    Info(String),
}
