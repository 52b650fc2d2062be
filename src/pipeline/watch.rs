//! Bus watcher: routes status messages to the caller
//!
//! Runs on the driving-loop thread. End-of-stream handling differs by
//! role: a caster is notified and keeps watching, a receiver shuts the
//! process down. Element errors are fatal for either role because the
//! pipeline's invariants cannot be trusted once an element has failed.

use crate::engine::bus::BusMessage;
use crate::pipeline::context::CallbackContext;
use log::{error, info};
use std::process;

/// Handle one bus message for a live pipeline
///
/// Returns whether the loop should keep dispatching for this pipeline.
/// The fatal paths do not return.
pub(crate) fn dispatch(context: &CallbackContext, message: BusMessage) -> bool {
    match message {
        BusMessage::Eos => match context.role {
            crate::pipeline::Role::Caster => {
                if let Some(_guard) = context.gate.enter() {
                    context.handler.on_end_of_stream();
                }
                true
            }
            crate::pipeline::Role::Receiver => {
                info!("pipeline {}: end of stream, shutting down", context.id);
                process::exit(0);
            }
        },
        BusMessage::Error(err) => {
            error!("pipeline {}: {}", context.id, err);
            if let Some(_guard) = context.gate.enter() {
                context.handler.on_error(&err);
            }
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{PipelineHandler, PipelineId};
    use crate::pipeline::Role;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EosCounter {
        eos: AtomicUsize,
    }

    impl PipelineHandler for EosCounter {
        fn on_sample_buffer(&self, _data: Bytes, _pipeline_id: PipelineId) {}

        fn on_end_of_stream(&self) {
            self.eos.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn caster_eos_notifies_and_keeps_watching() {
        let handler = Arc::new(EosCounter {
            eos: AtomicUsize::new(0),
        });
        let context = CallbackContext::new(3, Role::Caster, handler.clone());

        assert!(dispatch(&context, BusMessage::Eos));
        assert!(dispatch(&context, BusMessage::Eos));
        assert_eq!(handler.eos.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn caster_eos_after_drain_is_suppressed() {
        let handler = Arc::new(EosCounter {
            eos: AtomicUsize::new(0),
        });
        let context = CallbackContext::new(3, Role::Caster, handler.clone());

        context.gate.drain();
        assert!(dispatch(&context, BusMessage::Eos));
        assert_eq!(handler.eos.load(Ordering::SeqCst), 0);
    }
}
