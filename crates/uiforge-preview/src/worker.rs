//! Dedicated preview thread.
//!
//! Isolates cannot move between threads, so the controller lives on its own
//! thread and is driven through a cloneable [`PreviewHandle`]. State changes
//! are published on a watch channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde_json::Value;
use tokio::sync::watch;
use uiforge_transform::SourceText;

use crate::controller::PreviewController;
use crate::pipeline::Pipeline;
use crate::state::PreviewSnapshot;

/// Reserves a revision for a submission.
///
/// Take the ticket when work on a submission starts, not when it finishes:
/// a result that arrives after a newer ticket was applied is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn revision(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Preview worker has shut down")]
pub struct WorkerClosed;

enum Command {
    Submit { ticket: Ticket, source: SourceText },
    Rerender(Value),
    Clear,
    Shutdown,
}

/// Cloneable, thread-safe handle to a [`PreviewWorker`].
#[derive(Clone)]
pub struct PreviewHandle {
    commands: Sender<Command>,
    tickets: Arc<AtomicU64>,
    snapshots: watch::Receiver<PreviewSnapshot>,
}

impl PreviewHandle {
    pub fn ticket(&self) -> Ticket {
        Ticket(self.tickets.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn submit(&self, ticket: Ticket, source: SourceText) -> Result<(), WorkerClosed> {
        self.send(Command::Submit { ticket, source })
    }

    /// Take a ticket and submit in one step.
    pub fn submit_now(&self, source: SourceText) -> Result<Ticket, WorkerClosed> {
        let ticket = self.ticket();
        self.submit(ticket, source)?;
        Ok(ticket)
    }

    pub fn rerender(&self, props: Value) -> Result<(), WorkerClosed> {
        self.send(Command::Rerender(props))
    }

    pub fn clear(&self) -> Result<(), WorkerClosed> {
        self.send(Command::Clear)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PreviewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until `ticket`, or something newer, has been applied.
    pub async fn settled(&self, ticket: Ticket) -> Result<PreviewSnapshot, WorkerClosed> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|snapshot| snapshot.revision() >= ticket.revision())
            .await
            .map_err(|_| WorkerClosed)?;
        Ok(snapshot.clone())
    }

    fn send(&self, command: Command) -> Result<(), WorkerClosed> {
        self.commands.send(command).map_err(|_| WorkerClosed)
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("tickets", &self.tickets.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Owns the preview thread. Dropping it stops the thread.
pub struct PreviewWorker {
    handle: PreviewHandle,
    thread: Option<JoinHandle<()>>,
}

impl PreviewWorker {
    pub fn spawn(pipeline: Pipeline) -> std::io::Result<Self> {
        let (commands, rx) = mpsc::channel();
        let (publish, snapshots) = watch::channel(PreviewSnapshot::default());

        let thread = thread::Builder::new()
            .name("uiforge-preview".into())
            .spawn(move || run(PreviewController::new(pipeline), rx, publish))?;

        Ok(Self {
            handle: PreviewHandle {
                commands,
                tickets: Arc::new(AtomicU64::new(0)),
                snapshots,
            },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> PreviewHandle {
        self.handle.clone()
    }
}

impl Drop for PreviewWorker {
    fn drop(&mut self) {
        let _ = self.handle.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Preview thread panicked");
            }
        }
    }
}

fn run(
    mut controller: PreviewController,
    commands: Receiver<Command>,
    publish: watch::Sender<PreviewSnapshot>,
) {
    while let Ok(first) = commands.recv() {
        let mut latest: Option<(Ticket, SourceText)> = None;
        let mut props = None;
        let mut clear = false;
        let mut cleared = 0;

        for command in std::iter::once(first).chain(commands.try_iter()) {
            match command {
                Command::Submit { ticket, source } => {
                    if latest.as_ref().map_or(true, |(newest, _)| ticket > *newest) {
                        latest = Some((ticket, source));
                    }
                }
                Command::Rerender(value) => props = Some(value),
                Command::Clear => {
                    clear = true;
                    if let Some((ticket, _)) = latest.take() {
                        cleared = cleared.max(ticket.revision());
                    }
                }
                Command::Shutdown => return,
            }
        }

        if clear {
            controller.retire(cleared);
            controller.clear();
        }

        let applied = match latest {
            Some((ticket, source)) => {
                if let Some(props) = &props {
                    controller.set_props(props.clone());
                }
                controller.apply(ticket.revision(), &source)
            }
            None => false,
        };

        if let (false, Some(props)) = (applied, props) {
            controller.rerender(props);
        }

        publish.send_replace(controller.snapshot());
    }

    tracing::debug!("Preview worker stopped");
}
