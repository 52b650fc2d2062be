//! Element model: factories, typed properties, sink queue

use crate::error::ParseError;
use crate::sample::Sample;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};

/// Built-in element factories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Synthesizes patterned payloads, then signals end-of-stream
    TestSrc,
    /// Payloads fed externally through `Pipeline::push`
    AppSrc,
    /// Synthesizes payloads, then posts a bus error
    FaultSrc,
    /// Pass-through
    Queue,
    /// Pass-through with a live-tunable `bitrate`
    Encoder,
    /// Pass-through with a live-tunable `session-id`
    Payloader,
    /// Terminal sink exposing samples to the sample bridge
    AppSink,
    /// Terminal sink that counts and discards
    FakeSink,
}

impl ElementKind {
    /// Every registered factory
    pub const ALL: [ElementKind; 8] = [
        ElementKind::TestSrc,
        ElementKind::AppSrc,
        ElementKind::FaultSrc,
        ElementKind::Queue,
        ElementKind::Encoder,
        ElementKind::Payloader,
        ElementKind::AppSink,
        ElementKind::FakeSink,
    ];

    /// Registered factory name, also the default element name
    pub fn factory_name(&self) -> &'static str {
        match self {
            ElementKind::TestSrc => "testsrc",
            ElementKind::AppSrc => "appsrc",
            ElementKind::FaultSrc => "faultsrc",
            ElementKind::Queue => "queue",
            ElementKind::Encoder => "encoder",
            ElementKind::Payloader => "payloader",
            ElementKind::AppSink => "appsink",
            ElementKind::FakeSink => "fakesink",
        }
    }

    /// Whether this factory produces data
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            ElementKind::TestSrc | ElementKind::AppSrc | ElementKind::FaultSrc
        )
    }

    /// Whether this factory terminates the graph
    pub fn is_sink(&self) -> bool {
        matches!(self, ElementKind::AppSink | ElementKind::FakeSink)
    }
}

/// Typed element property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Uint(u32),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl PropertyValue {
    /// Parse a raw descriptor token into the same type as `like`
    fn parse_as(like: &PropertyValue, raw: &str) -> Option<PropertyValue> {
        match like {
            PropertyValue::Uint(_) => raw.parse().ok().map(PropertyValue::Uint),
            PropertyValue::Int(_) => raw.parse().ok().map(PropertyValue::Int),
            PropertyValue::Bool(_) => raw.parse().ok().map(PropertyValue::Bool),
            PropertyValue::Str(_) => Some(PropertyValue::Str(raw.to_string())),
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            PropertyValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Uint(v) => write!(f, "{v}"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Str(v) => write!(f, "{v}"),
        }
    }
}

/// One node of the pipeline graph
///
/// Properties are fixed per factory at construction; values can be read
/// and replaced while the pipeline is playing.
pub struct Element {
    kind: ElementKind,
    name: String,
    props: RwLock<HashMap<&'static str, PropertyValue>>,
    sink_queue: Mutex<VecDeque<Sample>>,
}

/// Exposed properties and their defaults, per factory
fn default_props(kind: ElementKind) -> HashMap<&'static str, PropertyValue> {
    let mut props = HashMap::new();
    match kind {
        ElementKind::TestSrc => {
            // num-buffers=0 keeps producing until stop or teardown
            props.insert("num-buffers", PropertyValue::Uint(0));
            props.insert("blocksize", PropertyValue::Uint(1024));
            props.insert("interval-ms", PropertyValue::Uint(1));
        }
        ElementKind::FaultSrc => {
            props.insert("error-after", PropertyValue::Uint(3));
            props.insert("blocksize", PropertyValue::Uint(1024));
            props.insert("interval-ms", PropertyValue::Uint(1));
            props.insert(
                "message",
                PropertyValue::Str("synthetic element fault".to_string()),
            );
        }
        ElementKind::Encoder => {
            props.insert("bitrate", PropertyValue::Uint(2048));
            props.insert("codec", PropertyValue::Str("h264".to_string()));
        }
        ElementKind::Payloader => {
            props.insert("session-id", PropertyValue::Uint(0));
            props.insert("mtu", PropertyValue::Uint(1200));
        }
        ElementKind::AppSink => {
            props.insert("emit-signals", PropertyValue::Bool(true));
        }
        ElementKind::AppSrc | ElementKind::Queue | ElementKind::FakeSink => {}
    }
    props
}

impl Element {
    /// Instantiate an element, applying descriptor property overrides
    pub(crate) fn with_properties(
        kind: ElementKind,
        name: String,
        overrides: Vec<(String, String)>,
    ) -> Result<Element, ParseError> {
        let mut props = default_props(kind);
        for (key, raw) in overrides {
            let (known_key, current) = match props.get_key_value(key.as_str()) {
                Some((k, v)) => (*k, v.clone()),
                None => {
                    return Err(ParseError::UnknownProperty {
                        element: name,
                        property: key,
                    });
                }
            };
            let Some(value) = PropertyValue::parse_as(&current, &raw) else {
                return Err(ParseError::BadAssignment(format!("{key}={raw}")));
            };
            props.insert(known_key, value);
        }

        Ok(Element {
            kind,
            name,
            props: RwLock::new(props),
            sink_queue: Mutex::new(VecDeque::new()),
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Addressable name of this element within its pipeline
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read a property value; `None` if the factory does not expose it
    pub fn get_property(&self, key: &str) -> Option<PropertyValue> {
        self.props.read().unwrap().get(key).cloned()
    }

    /// Replace a property value; `None` if the factory does not expose it
    ///
    /// The caller is responsible for type agreement; the typed accessor
    /// layer enforces it.
    pub fn set_property(&self, key: &str, value: PropertyValue) -> Option<()> {
        let mut props = self.props.write().unwrap();
        let known_key = match props.get_key_value(key) {
            Some((k, _)) => *k,
            None => return None,
        };
        props.insert(known_key, value);
        Some(())
    }

    /// Queue a finished sample at this sink
    pub(crate) fn push_sample(&self, sample: Sample) {
        self.sink_queue.lock().unwrap().push_back(sample);
    }

    /// Pull the oldest queued sample, if any
    pub fn pull_sample(&self) -> Option<Sample> {
        self.sink_queue.lock().unwrap().pop_front()
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

/// Payload pattern synthesized by `testsrc` and `faultsrc`
///
/// Deterministic per sequence number so consumers can verify delivered
/// buffers byte for byte.
pub fn synth_payload(seq: u64, blocksize: usize) -> Bytes {
    let mut data = Vec::with_capacity(blocksize);
    for i in 0..blocksize {
        data.push(((seq as usize + i) & 0xff) as u8);
    }
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(kind: ElementKind, overrides: Vec<(&str, &str)>) -> Result<Element, ParseError> {
        Element::with_properties(
            kind,
            kind.factory_name().to_string(),
            overrides
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn overrides_replace_defaults() {
        let elem = make(ElementKind::TestSrc, vec![("num-buffers", "12")]).unwrap();
        assert_eq!(elem.get_property("num-buffers").unwrap().as_uint(), Some(12));
        assert_eq!(elem.get_property("blocksize").unwrap().as_uint(), Some(1024));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let err = make(ElementKind::Queue, vec![("latency", "5")]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownProperty {
                element: "queue".to_string(),
                property: "latency".to_string(),
            }
        );
    }

    #[test]
    fn mistyped_value_is_rejected() {
        let err = make(ElementKind::Encoder, vec![("bitrate", "fast")]).unwrap_err();
        assert_eq!(err, ParseError::BadAssignment("bitrate=fast".to_string()));
    }

    #[test]
    fn set_property_only_touches_exposed_keys() {
        let elem = make(ElementKind::Payloader, vec![]).unwrap();
        assert!(elem.set_property("session-id", PropertyValue::Uint(9)).is_some());
        assert!(elem.set_property("ssrc", PropertyValue::Uint(9)).is_none());
        assert_eq!(elem.get_property("session-id").unwrap().as_uint(), Some(9));
    }

    #[test]
    fn sink_queue_is_fifo() {
        let sink = make(ElementKind::AppSink, vec![]).unwrap();
        for seq in 0..3 {
            sink.push_sample(crate::sample::Sample {
                buffer: Some(synth_payload(seq, 8)),
                pts: crate::sample::Timestamp::from_micros(seq),
                seq,
            });
        }
        assert_eq!(sink.pull_sample().unwrap().seq, 0);
        assert_eq!(sink.pull_sample().unwrap().seq, 1);
        assert_eq!(sink.pull_sample().unwrap().seq, 2);
        assert!(sink.pull_sample().is_none());
    }

    #[test]
    fn synth_payload_is_deterministic() {
        assert_eq!(synth_payload(5, 4), synth_payload(5, 4));
        assert_ne!(synth_payload(5, 4), synth_payload(6, 4));
        assert_eq!(synth_payload(0, 4).as_ref(), &[0, 1, 2, 3]);
    }
}
