use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use deno_core::v8;

/// Terminates an isolate's running script once its budget is spent.
pub(crate) struct Watchdog {
    done: Sender<()>,
    thread: JoinHandle<bool>,
}

impl Watchdog {
    pub(crate) fn arm(isolate: v8::IsolateHandle, limit: Duration) -> Self {
        let (done, rx) = mpsc::channel::<()>();
        let thread = thread::spawn(move || match rx.recv_timeout(limit) {
            Err(RecvTimeoutError::Timeout) => {
                isolate.terminate_execution();
                true
            }
            _ => false,
        });

        Self { done, thread }
    }

    /// Stop watching. Returns whether termination was requested.
    pub(crate) fn disarm(self) -> bool {
        let _ = self.done.send(());
        self.thread.join().unwrap_or(false)
    }
}
