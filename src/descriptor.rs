//! Launch-style pipeline descriptors
//!
//! A descriptor is a `!`-separated chain of elements, each a factory
//! name followed by `key=value` property assignments. `name=` sets the
//! element's addressable name; it defaults to the factory name.
//!
//! ```text
//! testsrc num-buffers=120 ! encoder name=encoder bitrate=4096 ! appsink
//! ```

use crate::config::CastConfig;
use crate::engine::element::Element;
use crate::engine::graph::Graph;
use crate::error::ParseError;
use crate::runtime;
use std::sync::Arc;

/// Agreed name of the sample-exposing sink element
pub const SINK_NAME: &str = "appsink";
/// Agreed name of the packetizing element
pub const PAYLOADER_NAME: &str = "payloader";
/// Agreed name of the encoding element
pub const ENCODER_NAME: &str = "encoder";

/// Parse a descriptor into a validated element graph
pub fn parse(descriptor: &str) -> Result<Graph, ParseError> {
    runtime::ensure_initialized();

    if descriptor.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut elements = Vec::new();
    for segment in descriptor.split('!') {
        let mut tokens = segment.split_whitespace();
        let Some(factory) = tokens.next() else {
            return Err(ParseError::Empty);
        };
        let Some(kind) = runtime::factory(factory) else {
            return Err(ParseError::UnknownFactory(factory.to_string()));
        };

        let mut name = factory.to_string();
        let mut overrides = Vec::new();
        for token in tokens {
            let Some((key, value)) = token.split_once('=') else {
                return Err(ParseError::BadAssignment(token.to_string()));
            };
            if key == "name" {
                name = value.to_string();
            } else {
                overrides.push((key.to_string(), value.to_string()));
            }
        }

        elements.push(Arc::new(Element::with_properties(kind, name, overrides)?));
    }

    Graph::new(elements)
}

/// Descriptor for a caster pipeline built from a cast configuration
///
/// The source fragment feeds an encoder and a payloader, terminating in
/// the sample-exposing sink under its agreed name.
pub fn caster(config: &CastConfig) -> String {
    format!(
        "{} ! {ENCODER_NAME} name={ENCODER_NAME} codec={} bitrate={} ! \
         {PAYLOADER_NAME} name={PAYLOADER_NAME} mtu={} session-id={} ! \
         {SINK_NAME} name={SINK_NAME}",
        config.source, config.codec, config.bitrate_kbps, config.mtu, config.session_id
    )
}

/// Descriptor for a receiver pipeline built from a cast configuration
///
/// Buffers enter through a fed source and terminate in the configured
/// destination fragment.
pub fn receiver(config: &CastConfig) -> String {
    format!("appsrc name=appsrc ! queue ! {}", config.destination)
}
