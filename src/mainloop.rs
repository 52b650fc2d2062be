//! Driving loop: the single global bus pump
//!
//! Blocks the thread it runs on, dequeuing bus messages and routing each
//! to its pipeline's watcher. Only one loop may run per process; a
//! second `run` fails instead of silently competing for messages.

use crate::engine::bus::{self, Dispatch};
use crate::error::{CastError, CastResult};
use crate::handler;
use crate::pipeline::watch;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(false);

/// The process-wide bus driving loop
///
/// All instances share one pump; `quit` from any instance (or thread)
/// unblocks the running `run`.
#[derive(Debug, Clone, Default)]
pub struct MainLoop {
    _private: (),
}

impl MainLoop {
    pub fn new() -> MainLoop {
        MainLoop { _private: () }
    }

    /// Pump bus messages until `quit` is called
    ///
    /// Dedicate a thread to this: it blocks indefinitely. Messages for
    /// pipelines that are no longer registered are discarded.
    pub fn run(&self) -> CastResult<()> {
        if RUNNING.swap(true, Ordering::SeqCst) {
            return Err(CastError::MainLoopAlreadyRunning);
        }
        let Some(mut rx) = bus::take_receiver() else {
            RUNNING.store(false, Ordering::SeqCst);
            return Err(CastError::MainLoopAlreadyRunning);
        };

        info!("driving loop started");
        loop {
            match rx.blocking_recv() {
                Some(Dispatch::Message { id, message }) => match handler::lookup(id) {
                    Some(context) => {
                        watch::dispatch(&context, message);
                    }
                    None => {
                        warn!("no pipeline with id {id}, discarding bus message");
                    }
                },
                Some(Dispatch::Quit) | None => break,
            }
        }
        info!("driving loop stopped");

        bus::restore_receiver(rx);
        RUNNING.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Unblock the running loop after it drains already queued messages
    pub fn quit(&self) {
        bus::post_quit();
    }
}
