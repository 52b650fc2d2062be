//! Error types for the pipeline core

use thiserror::Error;

/// Result type for pipeline operations
pub type CastResult<T> = Result<T, CastError>;

/// Errors surfaced by pipeline construction, control and tuning
#[derive(Error, Debug)]
pub enum CastError {
    /// Malformed pipeline descriptor
    #[error("descriptor parse error: {0}")]
    Parse(#[from] ParseError),

    /// A named element is absent from the pipeline graph
    #[error("no element named `{element}` in the pipeline")]
    MissingElement { element: String },

    /// The element exists but does not expose the requested property
    #[error("element `{element}` has no property `{property}`")]
    MissingProperty { element: String, property: String },

    /// The property exists but holds a value of a different type
    #[error("property `{property}` on `{element}` holds a different type")]
    PropertyType { element: String, property: String },

    /// A pipeline with this identifier is already registered
    #[error("pipeline id {0} is already in use")]
    PipelineIdInUse(u32),

    /// The operation is not valid in the pipeline's current state
    #[error("cannot {operation} a pipeline in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// The pipeline has no feedable source element
    #[error("pipeline source does not accept pushed buffers")]
    NotFeedable,

    /// Another driving loop is already pumping the bus
    #[error("a driving loop is already running in this process")]
    MainLoopAlreadyRunning,

    /// Unsupported codec name in a descriptor builder
    #[error("unknown codec `{0}`")]
    UnknownCodec(String),
}

/// Descriptor parse failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Descriptor contains no elements
    #[error("empty pipeline descriptor")]
    Empty,

    /// No factory registered under this name
    #[error("unknown element factory `{0}`")]
    UnknownFactory(String),

    /// A property token is not a `key=value` pair or its value failed to parse
    #[error("malformed property assignment `{0}`")]
    BadAssignment(String),

    /// The factory does not expose this property
    #[error("element `{element}` has no property `{property}`")]
    UnknownProperty { element: String, property: String },

    /// Two elements share the same addressable name
    #[error("duplicate element name `{0}`")]
    DuplicateName(String),

    /// The first element is not a source
    #[error("pipeline must begin with a source element")]
    MissingSource,

    /// The last element is not a sink
    #[error("pipeline must end with a sink element")]
    MissingSink,

    /// A source or sink element appears in the middle of the graph
    #[error("element `{0}` cannot be linked mid-pipeline")]
    MisplacedElement(String),
}

/// Structured runtime error carried on the bus
///
/// Replaces the opaque native message format: the failing element is
/// identified by name and the message text is preserved verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("element `{element}` failed: {message}")]
pub struct PipelineError {
    /// Name of the element that reported the failure
    pub element: String,
    /// Failure description
    pub message: String,
}

impl PipelineError {
    pub fn new(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            message: message.into(),
        }
    }
}
