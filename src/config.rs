//! Cast configuration feeding the descriptor builders

use crate::error::{CastError, CastResult};
use serde::{Deserialize, Serialize};

/// Payload codec selected for a cast session
///
/// The codec is advisory for the element graph (payloads stay opaque) but
/// is carried on the encoder so receivers can negotiate it out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Vp8,
    Vp9,
    H264,
}

impl Codec {
    /// Parse a codec from its wire name
    pub fn parse(name: &str) -> CastResult<Codec> {
        match name.to_lowercase().as_str() {
            "vp8" => Ok(Codec::Vp8),
            "vp9" => Ok(Codec::Vp9),
            "h264" => Ok(Codec::H264),
            other => Err(CastError::UnknownCodec(other.to_string())),
        }
    }

    /// Wire name of this codec
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Vp8 => "vp8",
            Codec::Vp9 => "vp9",
            Codec::H264 => "h264",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings for one cast session
///
/// `source` and `destination` are descriptor fragments: the source feeds
/// a caster pipeline, the destination terminates a receiver pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastConfig {
    pub codec: Codec,
    /// Source fragment for the caster pipeline, e.g. `testsrc num-buffers=120`
    pub source: String,
    /// Terminal fragment for the receiver pipeline, e.g. `fakesink`
    pub destination: String,
    /// Encoder bitrate in kbit/s
    pub bitrate_kbps: u32,
    /// Payloader packet size limit in bytes
    pub mtu: u32,
    /// Packetization session identifier
    pub session_id: u32,
}

impl CastConfig {
    /// Load a configuration from its JSON representation
    pub fn from_json(json: &str) -> serde_json::Result<CastConfig> {
        serde_json::from_str(json)
    }

    /// Serialize this configuration to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for CastConfig {
    fn default() -> Self {
        CastConfig {
            codec: Codec::H264,
            source: "testsrc".to_string(),
            destination: "fakesink".to_string(),
            bitrate_kbps: 2048,
            mtu: 1200,
            session_id: 0,
        }
    }
}
