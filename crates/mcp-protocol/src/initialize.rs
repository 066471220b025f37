//! The `initialize` handshake envelope (§4.8, §4.9).

use serde::{Deserialize, Serialize};

use crate::capabilities::{ClientCapabilities, ServerCapabilities};

/// Name/version pair identifying one side of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Parameters of the `initialize` request, sent client → server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: Implementation,
}

impl InitializeParams {
    pub fn new(capabilities: ClientCapabilities, client_info: Implementation) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION.to_string(),
            capabilities,
            client_info,
        }
    }
}

/// Result of a successful `initialize`, sent server → client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResult {
    pub fn new(capabilities: ServerCapabilities, server_info: Implementation) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION.to_string(),
            capabilities,
            server_info,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Negotiate the protocol version to report back to the client, per
    /// §4.9: prefer an identical match, otherwise fall back to the version
    /// this server actually supports.
    pub fn negotiate_version(requested: &str) -> String {
        if requested == crate::PROTOCOL_VERSION {
            requested.to_string()
        } else {
            crate::PROTOCOL_VERSION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiates_identical_version() {
        assert_eq!(
            InitializeResult::negotiate_version("2025-11-25"),
            "2025-11-25"
        );
    }

    #[test]
    fn falls_back_to_supported_version_on_mismatch() {
        assert_eq!(
            InitializeResult::negotiate_version("2024-01-01"),
            crate::PROTOCOL_VERSION
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = InitializeResult::new(
            ServerCapabilities::default(),
            Implementation::new("demo-server", "0.1.0"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["protocolVersion"], "2025-11-25");
        assert_eq!(json["serverInfo"]["name"], "demo-server");
        assert!(json.get("instructions").is_none());
    }
}
