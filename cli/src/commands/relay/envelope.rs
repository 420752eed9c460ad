//! # Relay Request and Reply Envelopes
//!
//! File: cli/src/commands/relay/envelope.rs
//!
//! ## Overview
//!
//! The wire types of the relay. A request is a JSON object with an optional
//! `prompt`; a reply is exactly one of four shapes:
//!
//! | Variant          | JSON                                           |
//! |------------------|------------------------------------------------|
//! | `Reply`          | `{"reply": "..."}`                             |
//! | `Degraded`       | `{"reply": "...", "warning": "..."}`           |
//! | `ImportFallback` | `{"reply": "...", "import_error": "..."}`      |
//! | `RunnerError`    | `{"error": "runner_error", "detail": "..."}`   |
//!
use crate::core::error::{Result, StackAiError};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Value of the `error` field for top-level failures.
pub const RUNNER_ERROR: &str = "runner_error";

/// Incoming payload. Unknown fields are ignored.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatRequest {
    /// Parses the raw stdin payload. Blank input counts as `{}`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let invalid = |e: serde_json::Error| anyhow!(StackAiError::InvalidRequest(e.to_string()));
        let value: serde_json::Value = serde_json::from_str(raw).map_err(invalid)?;
        // Derived struct deserializers also accept arrays.
        if !value.is_object() {
            anyhow::bail!(StackAiError::InvalidRequest(
                "expected a JSON object".to_string()
            ));
        }
        serde_json::from_value(value).map_err(invalid)
    }

    /// The prompt, with absent and `null` both read as empty.
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("")
    }
}

/// Outgoing payload.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Envelope {
    Reply {
        reply: String,
    },
    Degraded {
        reply: String,
        warning: String,
    },
    ImportFallback {
        reply: String,
        import_error: String,
    },
    RunnerError {
        error: &'static str,
        detail: String,
    },
}

impl Envelope {
    pub fn runner_error(err: &anyhow::Error) -> Self {
        Envelope::RunnerError {
            error: RUNNER_ERROR,
            detail: trace_text(err),
        }
    }

    /// Writes the envelope as one compact JSON object, without a trailing newline.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *out, self).context("Failed to serialize reply envelope")?;
        out.flush().context("Failed to flush reply envelope")?;
        Ok(())
    }
}

/// Diagnostic text for an error: its message followed by the `Caused by:` chain.
pub fn trace_text(err: &anyhow::Error) -> String {
    format!("{:?}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_reads_prompt() {
        let request = ChatRequest::parse(r#"{"prompt": "hello"}"#).unwrap();
        assert_eq!(request.prompt(), "hello");
    }

    #[test]
    fn parse_treats_missing_and_null_prompt_as_empty() {
        assert_eq!(ChatRequest::parse("{}").unwrap().prompt(), "");
        assert_eq!(ChatRequest::parse(r#"{"prompt": null}"#).unwrap().prompt(), "");
        assert_eq!(
            ChatRequest::parse(r#"{"other": 1, "prompt": "x"}"#).unwrap().prompt(),
            "x"
        );
    }

    #[test]
    fn parse_treats_blank_input_as_empty_object() {
        assert_eq!(ChatRequest::parse("").unwrap(), ChatRequest::default());
        assert_eq!(ChatRequest::parse(" \n").unwrap(), ChatRequest::default());
    }

    #[test]
    fn parse_rejects_malformed_payloads() {
        for raw in ["{not json", "[1, 2]", r#"["hello"]"#, r#"{"prompt": 42}"#, "\"hello\""] {
            let err = ChatRequest::parse(raw).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<StackAiError>(),
                    Some(StackAiError::InvalidRequest(_))
                ),
                "expected InvalidRequest for {raw}"
            );
        }
    }

    #[test]
    fn envelopes_serialize_to_their_documented_shapes() {
        let reply = Envelope::Reply { reply: "ok".into() };
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({"reply": "ok"}));

        let degraded = Envelope::Degraded {
            reply: "fb".into(),
            warning: "trace".into(),
        };
        assert_eq!(
            serde_json::to_value(&degraded).unwrap(),
            json!({"reply": "fb", "warning": "trace"})
        );

        let import = Envelope::ImportFallback {
            reply: "fb".into(),
            import_error: "trace".into(),
        };
        assert_eq!(
            serde_json::to_value(&import).unwrap(),
            json!({"reply": "fb", "import_error": "trace"})
        );

        let failure = serde_json::to_value(Envelope::runner_error(&anyhow!("stdin closed"))).unwrap();
        let fields = failure.as_object().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["error"], "runner_error");
        assert!(fields["detail"].as_str().unwrap().starts_with("stdin closed"));
    }

    #[test]
    fn write_to_emits_compact_unescaped_json() {
        let envelope = Envelope::Reply {
            reply: "• bullet".into(),
        };
        let mut out = Vec::new();
        envelope.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"reply":"• bullet"}"#);
    }

    #[test]
    fn trace_text_includes_causes() {
        let err = anyhow!("connection refused").context("Failed to reach model endpoint");
        let text = trace_text(&err);
        assert!(text.contains("Failed to reach model endpoint"));
        assert!(text.contains("connection refused"));
    }
}
