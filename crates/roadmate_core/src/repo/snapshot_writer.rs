//! Fire-and-forget snapshot writes.
//!
//! # Responsibility
//! - Move snapshot persistence off the mutation path.
//!
//! # Invariants
//! - `submit` never blocks on I/O and never reports failure to the caller.
//! - When several snapshots are queued, only the newest one is written.
//! - Dropping the writer flushes the queue before the worker exits.

use crate::repo::snapshot_repo::{Snapshot, SnapshotRepository};
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

const WRITER_THREAD_NAME: &str = "roadmate-snapshot-writer";

/// Destination for store snapshots after each successful mutation.
pub trait SnapshotSink {
    fn submit(&self, snapshot: Snapshot);
}

/// Background writer thread feeding a snapshot repository.
pub struct SnapshotWriter {
    sender: Option<Sender<Snapshot>>,
    worker: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    /// Starts the writer thread.
    pub fn spawn(repo: Arc<dyn SnapshotRepository>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(repo.as_ref(), receiver))?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

impl SnapshotSink for SnapshotWriter {
    fn submit(&self, snapshot: Snapshot) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        if sender.send(snapshot).is_err() {
            warn!("event=snapshot_submit module=repo status=skip reason=writer_stopped");
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=snapshot_writer_stop module=repo status=error reason=worker_panicked");
            }
        }
    }
}

fn run_writer(repo: &dyn SnapshotRepository, receiver: Receiver<Snapshot>) {
    while let Ok(mut snapshot) = receiver.recv() {
        let mut coalesced = 0usize;
        while let Ok(newer) = receiver.try_recv() {
            snapshot = newer;
            coalesced += 1;
        }

        match repo.save(&snapshot) {
            Ok(()) => debug!(
                "event=snapshot_save module=repo status=ok projects={} coalesced={}",
                snapshot.projects.len(),
                coalesced
            ),
            // The in-memory store stays authoritative; only cold start loses freshness.
            Err(err) => warn!(
                "event=snapshot_save module=repo status=error error={}",
                err
            ),
        }
    }
}
