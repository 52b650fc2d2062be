//! Pipeline execution engine
//!
//! A deliberately small element engine: elements carry named typed
//! properties and move opaque byte payloads from one source, through
//! pass-through transforms, into one terminal sink. Each playing
//! pipeline owns a single worker thread; status messages travel over
//! the process-global bus.

pub mod bus;
pub mod element;
pub mod graph;
pub(crate) mod worker;

pub use element::{Element, ElementKind, PropertyValue};
pub use graph::Graph;
