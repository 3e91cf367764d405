//! Acknowledgement decoding
//!
//! A CosmWasm IBC acknowledgement is UTF-8 JSON of the form
//! `{"result":"<base64>"}` or `{"error":"<message>"}`. The `result` payload
//! is base64-encoded JSON and contracts often nest further envelopes or
//! base64 fields inside it (e.g. ack -> result -> results[0] -> ok).
//!
//! `decode` unwraps exactly one base64 layer, so whatever JSON a contract
//! acknowledged comes back unchanged. Deeper layers are only followed on
//! request, through `decode_nested` or `decode_path`.
//!
//! Level 0 is the raw acknowledgement; every base64 layer unwrapped adds one
//! level. Decode errors report the level they happened at.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde_json::Value;
use std::fmt;

use super::error::HarnessError;
use crate::models::AckRecord;

/// Default bound on nested base64 layers
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// One acknowledgement envelope layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AckEnvelope {
    /// Base64-encoded success payload
    Result(String),
    /// Error message, surfaced as-is
    Error(String),
}

impl AckEnvelope {
    /// Parse the top-level acknowledgement bytes
    ///
    /// Exactly one of `result`/`error` must be present and non-empty.
    pub fn parse(bytes: &[u8]) -> Result<Self, HarnessError> {
        let value = parse_json(bytes, 0)?;
        let object = value
            .as_object()
            .ok_or_else(|| HarnessError::decode(0, "acknowledgement is not a JSON object"))?;

        match (object.get("result"), object.get("error")) {
            (Some(_), Some(_)) => Err(HarnessError::decode(
                0,
                "acknowledgement has both 'result' and 'error'",
            )),
            (None, None) => Err(HarnessError::decode(
                0,
                "acknowledgement has neither 'result' nor 'error'",
            )),
            (Some(result), None) => match result.as_str() {
                Some("") => Err(HarnessError::decode(0, "ack result unexpectedly empty")),
                Some(encoded) => Ok(AckEnvelope::Result(encoded.to_string())),
                None => Err(HarnessError::decode(0, "'result' is not a base64 string")),
            },
            (None, Some(error)) => match error.as_str() {
                Some("") => Err(HarnessError::decode(0, "ack error unexpectedly empty")),
                Some(message) => Ok(AckEnvelope::Error(message.to_string())),
                None => Err(HarnessError::decode(0, "'error' is not a string")),
            },
        }
    }

    /// Interpret an already decoded payload as a nested envelope
    ///
    /// Only single-key objects whose value is a string qualify, so payloads
    /// that merely carry a `result` field among others are left alone.
    fn nested(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        match (object.get("result"), object.get("error")) {
            (Some(Value::String(encoded)), None) => Some(AckEnvelope::Result(encoded.clone())),
            (None, Some(Value::String(message))) => Some(AckEnvelope::Error(message.clone())),
            _ => None,
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, AckEnvelope::Result(_))
    }
}

/// Fully decoded acknowledgement
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedAck {
    Result(Value),
    Error(String),
}

impl DecodedAck {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodedAck::Result(_))
    }

    #[cfg(test)]
    pub fn result(&self) -> Option<&Value> {
        match self {
            DecodedAck::Result(value) => Some(value),
            DecodedAck::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DecodedAck::Result(_) => None,
            DecodedAck::Error(message) => Some(message),
        }
    }

    /// `{"result": <payload>}` or `{"error": "<message>"}`
    pub fn to_json(&self) -> Value {
        match self {
            DecodedAck::Result(value) => serde_json::json!({ "result": value }),
            DecodedAck::Error(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// Step into a decoded payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathStep {
    Field(String),
    Index(usize),
}

impl PathStep {
    /// Parse `results.0.ok` (or `results[0].ok`) into steps
    pub fn parse_path(path: &str) -> Vec<PathStep> {
        path.replace('[', ".")
            .replace(']', "")
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(index) => PathStep::Index(index),
                Err(_) => PathStep::Field(s.to_string()),
            })
            .collect()
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => write!(f, "{name}"),
            PathStep::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Acknowledgement decoder with a bounded unwrap depth
#[derive(Clone, Copy, Debug)]
pub struct AckDecoder {
    max_depth: usize,
}

impl Default for AckDecoder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AckDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Decode an acknowledgement, unwrapping one base64 layer
    pub fn decode(&self, ack: &AckRecord) -> Result<DecodedAck, HarnessError> {
        self.decode_bytes(ack.as_bytes())
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedAck, HarnessError> {
        match AckEnvelope::parse(bytes)? {
            AckEnvelope::Error(message) => Ok(DecodedAck::Error(message)),
            AckEnvelope::Result(encoded) => {
                self.check_depth(1)?;
                Ok(DecodedAck::Result(decode_base64_json(&encoded, 1)?))
            }
        }
    }

    /// Decode, then keep unwrapping payloads that are envelopes themselves
    ///
    /// For contracts that wrap an inner ack in their own `result`/`error`
    /// envelope. An inner error ends decoding as an error ack.
    pub fn decode_nested(&self, bytes: &[u8]) -> Result<DecodedAck, HarnessError> {
        let mut envelope = AckEnvelope::parse(bytes)?;
        let mut level = 0;

        loop {
            let encoded = match envelope {
                AckEnvelope::Error(message) => return Ok(DecodedAck::Error(message)),
                AckEnvelope::Result(encoded) => encoded,
            };

            level += 1;
            self.check_depth(level)?;
            let payload = decode_base64_json(&encoded, level)?;

            match AckEnvelope::nested(&payload) {
                Some(inner) => envelope = inner,
                None => return Ok(DecodedAck::Result(payload)),
            }
        }
    }

    /// Decode along a contract-specific path of base64 fields
    ///
    /// Every step that lands on a string decodes it as base64 JSON; the
    /// final step must land on such a string.
    pub fn decode_path(
        &self,
        ack: &AckRecord,
        path: &[PathStep],
    ) -> Result<DecodedAck, HarnessError> {
        let encoded = match AckEnvelope::parse(ack.as_bytes())? {
            AckEnvelope::Error(message) => return Ok(DecodedAck::Error(message)),
            AckEnvelope::Result(encoded) => encoded,
        };

        let mut level = 1;
        self.check_depth(level)?;
        let mut current = decode_base64_json(&encoded, level)?;

        for (i, step) in path.iter().enumerate() {
            let selected = select(&current, step).ok_or_else(|| {
                HarnessError::decode(level, format!("no '{step}' in decoded payload"))
            })?;

            current = match selected {
                Value::String(encoded) => {
                    level += 1;
                    self.check_depth(level)?;
                    decode_base64_json(encoded, level)?
                }
                _ if i + 1 == path.len() => {
                    return Err(HarnessError::decode(
                        level,
                        format!("'{step}' is already decoded JSON, expected a base64 string"),
                    ));
                }
                other => other.clone(),
            };
        }

        Ok(DecodedAck::Result(current))
    }

    fn check_depth(&self, level: usize) -> Result<(), HarnessError> {
        if level > self.max_depth {
            return Err(HarnessError::decode(
                level,
                format!("nesting exceeds maximum depth {}", self.max_depth),
            ));
        }
        Ok(())
    }
}

/// Decode with the default decoder
pub fn decode(ack: &AckRecord) -> Result<DecodedAck, HarnessError> {
    AckDecoder::default().decode(ack)
}

/// Success acknowledgement bytes wrapping `payload`
pub fn encode_result(payload: &Value) -> Vec<u8> {
    serde_json::json!({ "result": encode_payload(payload) })
        .to_string()
        .into_bytes()
}

/// Error acknowledgement bytes
pub fn encode_error(message: &str) -> Vec<u8> {
    serde_json::json!({ "error": message })
        .to_string()
        .into_bytes()
}

/// Base64 of the JSON serialization of `payload`
pub fn encode_payload(payload: &Value) -> String {
    BASE64_STANDARD.encode(payload.to_string())
}

fn parse_json(bytes: &[u8], level: usize) -> Result<Value, HarnessError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| HarnessError::decode(level, format!("invalid UTF-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| HarnessError::decode(level, format!("invalid JSON: {e}")))
}

fn decode_base64_json(encoded: &str, level: usize) -> Result<Value, HarnessError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| HarnessError::decode(level, format!("invalid base64: {e}")))?;
    parse_json(&bytes, level)
}

fn select<'a>(value: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match step {
        PathStep::Field(name) => value.get(name.as_str()),
        PathStep::Index(index) => value.get(*index),
    }
}
