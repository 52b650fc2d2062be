//! Caller-facing handler trait and the pipeline handler registry
//!
//! Dispatch is keyed by an opaque token, the pipeline identifier: every
//! callback originating inside the engine looks its handler up here
//! instead of relying on out-of-band global callback slots. Messages for
//! an identifier with no live registration are discarded with a log line.

use crate::error::{CastError, CastResult, PipelineError};
use crate::pipeline::context::CallbackContext;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

/// Caller-assigned identifier of one running pipeline
///
/// Embedded in every sample callback so callers can demultiplex across
/// concurrently active pipelines.
pub type PipelineId = u32;

/// Callbacks a caller supplies when starting a pipeline
///
/// Sample callbacks execute on the pipeline worker thread and bus
/// callbacks on the driving-loop thread, concurrently with the caller's
/// own control flow; implementations must be reentrant-safe.
pub trait PipelineHandler: Send + Sync {
    /// One freshly allocated payload per produced sample, exactly once
    fn on_sample_buffer(&self, data: Bytes, pipeline_id: PipelineId);

    /// End of stream surfaced on the bus (caster role only)
    fn on_end_of_stream(&self) {}

    /// An element reported an unrecoverable failure; the process
    /// terminates after this returns
    fn on_error(&self, _error: &PipelineError) {}
}

static REGISTRY: Lazy<RwLock<HashMap<PipelineId, Arc<CallbackContext>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a callback context under its pipeline identifier
///
/// Fails while a prior pipeline with the same identifier is still
/// registered, which keeps identifiers unique among live pipelines.
pub(crate) fn register(context: Arc<CallbackContext>) -> CastResult<()> {
    let mut registry = REGISTRY.write().unwrap();
    match registry.entry(context.id) {
        Entry::Occupied(_) => Err(CastError::PipelineIdInUse(context.id)),
        Entry::Vacant(slot) => {
            slot.insert(context);
            Ok(())
        }
    }
}

/// Drop the registration, releasing the registry's context reference
pub(crate) fn unregister(id: PipelineId) -> Option<Arc<CallbackContext>> {
    REGISTRY.write().unwrap().remove(&id)
}

/// Resolve the context for a live pipeline
pub(crate) fn lookup(id: PipelineId) -> Option<Arc<CallbackContext>> {
    REGISTRY.read().unwrap().get(&id).map(Arc::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Role;

    struct NullHandler;

    impl PipelineHandler for NullHandler {
        fn on_sample_buffer(&self, _data: Bytes, _pipeline_id: PipelineId) {}
    }

    fn context(id: PipelineId) -> Arc<CallbackContext> {
        Arc::new(CallbackContext::new(id, Role::Caster, Arc::new(NullHandler)))
    }

    #[test]
    fn identifiers_are_unique_among_live_registrations() {
        let id = 9001;
        register(context(id)).unwrap();
        assert!(matches!(
            register(context(id)),
            Err(CastError::PipelineIdInUse(conflict)) if conflict == id
        ));

        unregister(id).unwrap();
        register(context(id)).unwrap();
        unregister(id).unwrap();
    }

    #[test]
    fn lookup_misses_after_unregister() {
        let id = 9002;
        register(context(id)).unwrap();
        assert!(lookup(id).is_some());
        unregister(id);
        assert!(lookup(id).is_none());
    }
}
