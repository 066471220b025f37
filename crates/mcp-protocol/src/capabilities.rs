//! Capability declarations (§3 "Capability declaration").
//!
//! Presence of a sub-struct is the signal, not any field inside it — both
//! engines auto-derive these from which handler callbacks were registered
//! (§4.8, §4.9) rather than asking the caller to declare them by hand, though
//! explicit overrides are still honored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplingCapabilities {
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElicitationCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<ElicitationCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

impl ClientCapabilities {
    /// Merge `auto` (derived from registered callbacks) with `explicit`
    /// (caller-declared). Per §4.8, explicit entries for a given field win —
    /// auto-derivation only fills gaps.
    pub fn merge(explicit: ClientCapabilities, auto: ClientCapabilities) -> Self {
        Self {
            roots: explicit.roots.or(auto.roots),
            sampling: explicit.sampling.or(auto.sampling),
            elicitation: explicit.elicitation.or(auto.elicitation),
            experimental: explicit.experimental.or(auto.experimental),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingCapabilities {
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionsCapabilities {
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<CompletionsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_capability_wins_over_auto_derived() {
        let explicit = ClientCapabilities {
            roots: Some(RootsCapabilities {
                list_changed: Some(false),
            }),
            ..Default::default()
        };
        let auto = ClientCapabilities {
            roots: Some(RootsCapabilities {
                list_changed: Some(true),
            }),
            sampling: Some(SamplingCapabilities::default()),
            ..Default::default()
        };
        let merged = ClientCapabilities::merge(explicit, auto);
        assert_eq!(merged.roots.unwrap().list_changed, Some(false));
        assert!(merged.sampling.is_some());
    }

    #[test]
    fn empty_capability_struct_serializes_as_empty_object() {
        let caps = SamplingCapabilities::default();
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn absent_capabilities_are_omitted_from_json() {
        let caps = ServerCapabilities::default();
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
