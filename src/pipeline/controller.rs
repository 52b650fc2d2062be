//! Pipeline controller: build, start, stop, destroy
//!
//! Owns the element graph and the worker for one pipeline and walks it
//! through the lifecycle state machine. Handler registration always
//! precedes the transition to Playing so no early event is lost.

use crate::descriptor::{self, ENCODER_NAME, PAYLOADER_NAME, SINK_NAME};
use crate::engine::bus;
use crate::engine::element::PropertyValue;
use crate::engine::graph::Graph;
use crate::engine::worker::{self, WorkerHandle};
use crate::error::{CastError, CastResult};
use crate::handler::{self, PipelineHandler, PipelineId};
use crate::pipeline::Role;
use crate::pipeline::bridge;
use crate::pipeline::context::CallbackContext;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::params;
use crate::pipeline::state::PipelineState;
use crate::runtime;
use bytes::Bytes;
use log::info;
use std::sync::Arc;

/// Handle to one managed media pipeline
///
/// Exclusively owned for its lifetime. Delivery callbacks run
/// concurrently with the owner's control flow on internal threads;
/// `destroy` (and `Drop`) block until in-flight callbacks have drained,
/// so neither may be called from inside a callback.
pub struct Pipeline {
    descriptor: String,
    role: Role,
    graph: Arc<Graph>,
    state: PipelineState,
    id: Option<PipelineId>,
    context: Option<Arc<CallbackContext>>,
    worker: Option<WorkerHandle>,
    health: Arc<PipelineHealth>,
}

impl Pipeline {
    /// Parse a descriptor into a runnable pipeline
    ///
    /// Performs the one-time runtime initialization on first use.
    pub fn build(descriptor: &str, role: Role) -> CastResult<Pipeline> {
        runtime::ensure_initialized();
        let graph = descriptor::parse(descriptor)?;
        info!("built {role} pipeline: '{descriptor}'");

        Ok(Pipeline {
            descriptor: descriptor.to_string(),
            role,
            graph: Arc::new(graph),
            state: PipelineState::Built,
            id: None,
            context: None,
            worker: None,
            health: Arc::new(PipelineHealth::new()),
        })
    }

    /// Start the pipeline under a caller-assigned identifier
    ///
    /// Registers the handler and wires the sample bridge and the bus
    /// watcher before the pipeline transitions to Playing. Fails if the
    /// identifier is still registered to a live pipeline, or if a caster
    /// graph lacks the agreed sink element.
    pub fn start(&mut self, id: PipelineId, handler: Arc<dyn PipelineHandler>) -> CastResult<()> {
        if self.state != PipelineState::Built
            || !self.state.can_transition_to(&PipelineState::Playing)
        {
            return Err(CastError::InvalidState {
                operation: "start",
                state: self.state.description(),
            });
        }
        if self.role == Role::Caster && self.graph.appsink().is_none() {
            return Err(CastError::MissingElement {
                element: SINK_NAME.to_string(),
            });
        }

        let context = Arc::new(CallbackContext::new(id, self.role, handler));
        handler::register(Arc::clone(&context))?;

        let hook_context = Arc::clone(&context);
        let hook_health = Arc::clone(&self.health);
        let sink_hook = Box::new(move |sink: &crate::engine::element::Element| {
            bridge::on_sample_ready(sink, &hook_context, &hook_health)
        });

        let worker = worker::spawn(
            id,
            Arc::clone(&self.graph),
            bus::port(id),
            Arc::clone(&self.health),
            sink_hook,
        );

        self.id = Some(id);
        self.context = Some(context);
        self.worker = Some(worker);
        self.state = PipelineState::Playing;
        info!("pipeline {id}: playing");
        Ok(())
    }

    /// Send an end-of-stream signal downstream
    ///
    /// Callback processing continues; the end-of-stream message
    /// propagates naturally and surfaces on the bus exactly once.
    pub fn stop(&self) -> CastResult<()> {
        let worker = self.playing_worker("stop")?;
        worker.request_eos();
        info!("pipeline {}: end of stream requested", self.id.unwrap_or(0));
        Ok(())
    }

    /// Feed one buffer to the pipeline's `appsrc` element
    ///
    /// Blocks on backpressure. Fails on a pipeline whose source is not
    /// feedable or that is not playing.
    pub fn push(&self, data: Bytes) -> CastResult<()> {
        self.playing_worker("push")?.push(data)
    }

    /// Signal the end of the fed stream
    pub fn push_eos(&self) -> CastResult<()> {
        self.playing_worker("push eos into")?.push_eos()
    }

    /// Tear the pipeline down and release its resources
    ///
    /// Transitions to Draining, refuses new callback dispatch, blocks
    /// until the last in-flight callback returns, quiesces the worker
    /// and only then releases the callback context. Idempotent.
    pub fn destroy(&mut self) -> CastResult<()> {
        if self.state.is_destroyed() {
            return Ok(());
        }

        self.state = PipelineState::Draining;
        if let Some(context) = &self.context {
            context.gate.drain();
        }
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        self.state = PipelineState::Stopped;

        if let Some(id) = self.id.take() {
            handler::unregister(id);
            info!("pipeline {id}: destroyed");
        }
        self.context = None;
        self.state = PipelineState::Destroyed;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Role this pipeline was built for
    pub fn role(&self) -> Role {
        self.role
    }

    /// Identifier assigned at start, if started
    pub fn id(&self) -> Option<PipelineId> {
        self.id
    }

    /// The descriptor this pipeline was built from
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Health counters shared with the delivery path
    pub fn health(&self) -> Arc<PipelineHealth> {
        Arc::clone(&self.health)
    }

    // ── Live tuning ─────────────────────────────────────────────

    /// Session identifier of the packetizing element
    pub fn session_id(&self) -> CastResult<u32> {
        params::get_uint(&self.graph, PAYLOADER_NAME, "session-id")
    }

    /// Retarget the packetizing element's session identifier
    pub fn set_session_id(&self, session_id: u32) -> CastResult<()> {
        params::set_uint(&self.graph, PAYLOADER_NAME, "session-id", session_id)
    }

    /// Retarget the encoding element's bitrate (kbit/s)
    pub fn set_bitrate(&self, bitrate: u32) -> CastResult<()> {
        params::set_uint(&self.graph, ENCODER_NAME, "bitrate", bitrate)
    }

    /// Read one property of a named element
    pub fn get_property(&self, element: &str, property: &str) -> CastResult<PropertyValue> {
        params::get(&self.graph, element, property)
    }

    /// Write one property of a named element
    pub fn set_property(
        &self,
        element: &str,
        property: &str,
        value: PropertyValue,
    ) -> CastResult<()> {
        params::set(&self.graph, element, property, value)
    }

    fn playing_worker(&self, operation: &'static str) -> CastResult<&WorkerHandle> {
        if !self.state.is_playing() {
            return Err(CastError::InvalidState {
                operation,
                state: self.state.description(),
            });
        }
        self.worker.as_ref().ok_or(CastError::InvalidState {
            operation,
            state: self.state.description(),
        })
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let _ = self.destroy();
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::PipelineHandler;
    use bytes::Bytes;

    struct NullHandler;

    impl PipelineHandler for NullHandler {
        fn on_sample_buffer(&self, _data: Bytes, _pipeline_id: PipelineId) {}
    }

    const CASTER: &str =
        "testsrc num-buffers=4 ! encoder name=encoder ! payloader name=payloader ! appsink";

    #[test]
    fn build_reports_parse_failures() {
        let err = Pipeline::build("webcam ! appsink", Role::Caster).unwrap_err();
        assert!(matches!(err, CastError::Parse(_)));
    }

    #[test]
    fn session_id_round_trips_on_a_built_pipeline() {
        let pipeline = Pipeline::build(CASTER, Role::Caster).unwrap();
        pipeline.set_session_id(1234).unwrap();
        assert_eq!(pipeline.session_id().unwrap(), 1234);
        pipeline.set_bitrate(768).unwrap();
        assert_eq!(
            pipeline
                .get_property("encoder", "bitrate")
                .unwrap()
                .as_uint(),
            Some(768)
        );
    }

    #[test]
    fn tuning_a_missing_element_is_a_typed_error() {
        let pipeline = Pipeline::build("testsrc num-buffers=1 ! appsink", Role::Caster).unwrap();
        assert!(matches!(
            pipeline.set_session_id(1),
            Err(CastError::MissingElement { element }) if element == PAYLOADER_NAME
        ));
    }

    #[test]
    fn stop_requires_a_playing_pipeline() {
        let pipeline = Pipeline::build(CASTER, Role::Caster).unwrap();
        assert!(matches!(
            pipeline.stop(),
            Err(CastError::InvalidState { operation: "stop", .. })
        ));
    }

    #[test]
    fn caster_without_appsink_cannot_start() {
        let mut pipeline = Pipeline::build("testsrc ! fakesink", Role::Caster).unwrap();
        let err = pipeline.start(600, Arc::new(NullHandler)).unwrap_err();
        assert!(matches!(err, CastError::MissingElement { element } if element == SINK_NAME));
        assert_eq!(pipeline.state(), PipelineState::Built);
    }

    #[test]
    fn destroy_without_start_releases_cleanly() {
        let mut pipeline = Pipeline::build(CASTER, Role::Caster).unwrap();
        pipeline.destroy().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Destroyed);

        // destroy is idempotent
        pipeline.destroy().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Destroyed);
    }

    #[test]
    fn start_after_destroy_is_refused() {
        let mut pipeline = Pipeline::build(CASTER, Role::Caster).unwrap();
        pipeline.destroy().unwrap();
        assert!(matches!(
            pipeline.start(601, Arc::new(NullHandler)),
            Err(CastError::InvalidState { operation: "start", .. })
        ));
    }

    #[test]
    fn push_is_refused_on_a_sourceful_pipeline() {
        let mut pipeline = Pipeline::build(CASTER, Role::Caster).unwrap();
        pipeline.start(602, Arc::new(NullHandler)).unwrap();
        assert!(matches!(
            pipeline.push(Bytes::from_static(b"x")),
            Err(CastError::NotFeedable)
        ));
        pipeline.destroy().unwrap();
    }
}
