//! Pipeline control layer
//!
//! Separates the lifecycle state machine, the shared callback context,
//! the sample bridge, the bus watcher and the parameter accessors from
//! the engine that executes the graph.

pub mod bridge;
pub mod context;
pub mod controller;
pub mod health;
pub mod params;
pub mod state;
pub mod watch;

pub use controller::Pipeline;
pub use state::PipelineState;

/// Role of a pipeline within a cast session
///
/// The roles handle end-of-stream asymmetrically: a caster treats it as
/// an expected, recoverable signal and is told through its handler; a
/// receiver treats it as the end of the session and shuts the process
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Produces and delivers samples (send side)
    Caster,
    /// Consumes fed buffers (receive side)
    Receiver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Caster => write!(f, "caster"),
            Role::Receiver => write!(f, "receiver"),
        }
    }
}
