//! Pipeline status bus
//!
//! Workers post end-of-stream and error messages here; the driving loop
//! pumps them and routes each to its pipeline's registered watcher. The
//! queue is process-global so a single loop serves every pipeline.

use crate::error::PipelineError;
use crate::handler::PipelineId;
use log::warn;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A tagged status event read from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    /// End of the media stream reached the sink
    Eos,
    /// An element reported an unrecoverable failure
    Error(PipelineError),
}

pub(crate) enum Dispatch {
    Message {
        id: PipelineId,
        message: BusMessage,
    },
    Quit,
}

struct BusQueue {
    tx: UnboundedSender<Dispatch>,
    rx: Mutex<Option<UnboundedReceiver<Dispatch>>>,
}

static QUEUE: Lazy<BusQueue> = Lazy::new(|| {
    let (tx, rx) = mpsc::unbounded_channel();
    BusQueue {
        tx,
        rx: Mutex::new(Some(rx)),
    }
});

/// Posting side of the bus, bound to one pipeline
#[derive(Clone)]
pub(crate) struct BusPort {
    id: PipelineId,
    tx: UnboundedSender<Dispatch>,
}

impl BusPort {
    pub(crate) fn post(&self, message: BusMessage) {
        if self
            .tx
            .send(Dispatch::Message {
                id: self.id,
                message,
            })
            .is_err()
        {
            warn!("bus queue closed, dropping message for pipeline {}", self.id);
        }
    }
}

/// Obtain a posting port for the given pipeline
pub(crate) fn port(id: PipelineId) -> BusPort {
    BusPort {
        id,
        tx: QUEUE.tx.clone(),
    }
}

/// Request the driving loop to return
pub(crate) fn post_quit() {
    let _ = QUEUE.tx.send(Dispatch::Quit);
}

/// Claim the receiving end; `None` while another loop holds it
pub(crate) fn take_receiver() -> Option<UnboundedReceiver<Dispatch>> {
    QUEUE.rx.lock().unwrap().take()
}

/// Hand the receiving end back after the loop returns
pub(crate) fn restore_receiver(rx: UnboundedReceiver<Dispatch>) {
    *QUEUE.rx.lock().unwrap() = Some(rx);
}
