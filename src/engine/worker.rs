//! Per-pipeline worker thread
//!
//! Owns the data path of one playing pipeline: payloads leave the source,
//! pass through the transforms in link order and land in the sink. Bus
//! messages are posted from here; sample callbacks fire on this thread.

use crate::engine::bus::{BusMessage, BusPort};
use crate::engine::element::{Element, ElementKind, synth_payload};
use crate::engine::graph::Graph;
use crate::error::{CastError, CastResult, PipelineError};
use crate::handler::PipelineId;
use crate::pipeline::health::PipelineHealth;
use crate::sample::{Sample, Timestamp};
use anyhow::anyhow;
use bytes::Bytes;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Items fed into an `appsrc` element
pub(crate) enum Feed {
    Buffer(Bytes),
    Eos,
}

/// Invoked on the worker thread whenever the appsink holds a new sample
pub(crate) type SinkHook = Box<dyn Fn(&Element) -> bool + Send + Sync>;

/// Control surface of a spawned worker
pub(crate) struct WorkerHandle {
    cancel: CancellationToken,
    eos_flag: Arc<AtomicBool>,
    feed_tx: Option<mpsc::Sender<Feed>>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Inject an end-of-stream signal downstream
    ///
    /// Callback processing continues until the signal reaches the sink
    /// and surfaces on the bus. For a fed source the signal queues behind
    /// buffers that were pushed before it.
    pub(crate) fn request_eos(&self) {
        match &self.feed_tx {
            Some(tx) => {
                let _ = tx.blocking_send(Feed::Eos);
            }
            None => self.eos_flag.store(true, Ordering::Release),
        }
    }

    /// Feed one buffer to the `appsrc` element, blocking on backpressure
    pub(crate) fn push(&self, data: Bytes) -> CastResult<()> {
        let Some(tx) = &self.feed_tx else {
            return Err(CastError::NotFeedable);
        };
        if tx.blocking_send(Feed::Buffer(data)).is_err() {
            warn!("source already reached end of stream, buffer dropped");
        }
        Ok(())
    }

    /// Signal the end of the fed stream
    pub(crate) fn push_eos(&self) -> CastResult<()> {
        let Some(tx) = &self.feed_tx else {
            return Err(CastError::NotFeedable);
        };
        let _ = tx.blocking_send(Feed::Eos);
        Ok(())
    }

    /// Hard teardown: cancel the worker and wait until its thread exits
    pub(crate) fn shutdown(&mut self) {
        self.feed_tx = None;
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawn the worker thread for a validated graph
pub(crate) fn spawn(
    id: PipelineId,
    graph: Arc<Graph>,
    port: BusPort,
    health: Arc<PipelineHealth>,
    sink_hook: SinkHook,
) -> WorkerHandle {
    let cancel = CancellationToken::new();
    let eos_flag = Arc::new(AtomicBool::new(false));

    let (feed_tx, feed_rx) = if graph.source().kind() == ElementKind::AppSrc {
        let (tx, rx) = mpsc::channel(64);
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    let worker = Worker {
        graph,
        port,
        health,
        sink_hook,
        cancel: cancel.clone(),
        eos_flag: Arc::clone(&eos_flag),
        feed_rx,
    };

    let join = thread::Builder::new()
        .name(format!("castpipe-{id}"))
        .spawn(move || worker.run())
        .expect("failed to spawn pipeline worker");

    WorkerHandle {
        cancel,
        eos_flag,
        feed_tx,
        join: Some(join),
    }
}

enum Produce {
    Buffer(Bytes),
    Eos,
    Fault(anyhow::Error),
    Shutdown,
}

struct Worker {
    graph: Arc<Graph>,
    port: BusPort,
    health: Arc<PipelineHealth>,
    sink_hook: SinkHook,
    cancel: CancellationToken,
    eos_flag: Arc<AtomicBool>,
    feed_rx: Option<mpsc::Receiver<Feed>>,
}

impl Worker {
    fn run(mut self) {
        let source = self.graph.source();
        let started = Instant::now();
        let mut seq: u64 = 0;
        debug!("worker started for source `{}`", source.name());

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let payload = match self.next_payload(&source, seq) {
                Produce::Buffer(data) => data,
                Produce::Eos => {
                    info!("source `{}` reached end of stream", source.name());
                    self.port.post(BusMessage::Eos);
                    break;
                }
                Produce::Fault(err) => {
                    self.port.post(BusMessage::Error(PipelineError::new(
                        source.name(),
                        format!("{err:#}"),
                    )));
                    break;
                }
                Produce::Shutdown => break,
            };

            let sample = Sample {
                buffer: Some(payload),
                pts: Timestamp::from_duration(started.elapsed()),
                seq,
            };
            seq += 1;

            let Some(sample) = self.transform(sample) else {
                break;
            };
            self.deliver(sample);
        }

        debug!("worker for source `{}` exited", source.name());
    }

    fn next_payload(&mut self, source: &Element, seq: u64) -> Produce {
        match source.kind() {
            ElementKind::TestSrc => {
                if self.eos_flag.load(Ordering::Acquire) {
                    return Produce::Eos;
                }
                let num_buffers = prop_uint(source, "num-buffers");
                if num_buffers > 0 && seq >= num_buffers as u64 {
                    return Produce::Eos;
                }
                if !self.idle_wait(prop_uint(source, "interval-ms")) {
                    return Produce::Shutdown;
                }
                if self.eos_flag.load(Ordering::Acquire) {
                    return Produce::Eos;
                }
                Produce::Buffer(synth_payload(seq, prop_uint(source, "blocksize") as usize))
            }
            ElementKind::FaultSrc => {
                if seq >= prop_uint(source, "error-after") as u64 {
                    let message = source
                        .get_property("message")
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default();
                    return Produce::Fault(anyhow!("{message} (after {seq} buffers)"));
                }
                if !self.idle_wait(prop_uint(source, "interval-ms")) {
                    return Produce::Shutdown;
                }
                Produce::Buffer(synth_payload(seq, prop_uint(source, "blocksize") as usize))
            }
            ElementKind::AppSrc => {
                let Some(rx) = self.feed_rx.as_mut() else {
                    return Produce::Shutdown;
                };
                match rx.blocking_recv() {
                    Some(Feed::Buffer(data)) => Produce::Buffer(data),
                    Some(Feed::Eos) => Produce::Eos,
                    // feeder dropped during teardown
                    None => Produce::Shutdown,
                }
            }
            _ => Produce::Shutdown,
        }
    }

    /// Run a sample through the transforms; `None` halts the pipeline
    /// after posting the failing element's error on the bus
    fn transform(&self, mut sample: Sample) -> Option<Sample> {
        for stage in self.graph.transforms() {
            match process(stage, sample) {
                Ok(next) => sample = next,
                Err(err) => {
                    self.port.post(BusMessage::Error(PipelineError::new(
                        stage.name(),
                        format!("{err:#}"),
                    )));
                    return None;
                }
            }
        }
        Some(sample)
    }

    /// Pace the source; false when teardown interrupted the wait
    fn idle_wait(&self, interval_ms: u32) -> bool {
        let mut remaining = Duration::from_millis(interval_ms as u64);
        let step = Duration::from_millis(10);
        while remaining > Duration::ZERO {
            if self.cancel.is_cancelled() {
                return false;
            }
            let slice = remaining.min(step);
            thread::sleep(slice);
            remaining -= slice;
        }
        !self.cancel.is_cancelled()
    }

    fn deliver(&self, sample: Sample) {
        let sink = self.graph.sink();
        match sink.kind() {
            ElementKind::AppSink => {
                let emit = sink
                    .get_property("emit-signals")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                sink.push_sample(sample);
                if emit {
                    (self.sink_hook)(&sink);
                }
            }
            ElementKind::FakeSink => {
                self.health.record_delivered(sample.size());
            }
            _ => {}
        }
    }
}

fn process(stage: &Element, sample: Sample) -> anyhow::Result<Sample> {
    match stage.kind() {
        ElementKind::Queue => Ok(sample),
        ElementKind::Encoder => {
            // payloads stay opaque; the bitrate is observed live
            let _bitrate = prop_uint(stage, "bitrate");
            Ok(sample)
        }
        ElementKind::Payloader => {
            let _session_id = prop_uint(stage, "session-id");
            Ok(sample)
        }
        other => Err(anyhow!(
            "element `{}` cannot process samples",
            other.factory_name()
        )),
    }
}

fn prop_uint(elem: &Element, key: &str) -> u32 {
    elem.get_property(key).and_then(|v| v.as_uint()).unwrap_or(0)
}
