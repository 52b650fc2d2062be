//! Sample bridge: from the sink queue into the caller's handler
//!
//! Runs on the pipeline worker thread, once per available sample. The
//! payload is copied into fresh caller-owned memory before the handler
//! sees it, so the engine and the caller never alias a buffer.

use crate::engine::element::Element;
use crate::pipeline::context::CallbackContext;
use crate::pipeline::health::PipelineHealth;
use crate::sample;
use log::debug;

/// Pull the ready sample and forward its payload
///
/// A sample without a buffer is released silently. Samples arriving
/// after teardown began are counted as drops and never delivered. The
/// return value always asks the pipeline to continue normal flow.
pub(crate) fn on_sample_ready(
    sink: &Element,
    context: &CallbackContext,
    health: &PipelineHealth,
) -> bool {
    let Some(sample) = sink.pull_sample() else {
        return true;
    };
    let Some(buffer) = sample.buffer.as_ref() else {
        return true;
    };

    let copy = sample::copy_buffer(buffer);
    match context.gate.enter() {
        Some(_guard) => {
            context.handler.on_sample_buffer(copy, context.id);
            health.record_delivered(sample.size());
        }
        None => {
            health.record_dropped();
            debug!(
                "pipeline {}: sample {} dropped during teardown",
                context.id, sample.seq
            );
        }
    }

    true
}
