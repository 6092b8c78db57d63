//! Cross-thread work queue into the dispatch thread.
//!
//! Protocol objects are only touched by the thread that dispatches the
//! connection. Other threads post [`Deferred`] work through a
//! [`HandoffSender`]; each post also writes a byte to a socket whose other
//! end sits in the dispatch loop's poll set, so a blocked poll returns.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use smol::channel::{self, Receiver, Sender, TryRecvError};

use crate::handle::Handle;

/// Work executed on the dispatch thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Register a frame callback for a surface.
    RequestFrame(Handle),
    /// Only interrupt the poll.
    Wakeup,
}

/// Sending half, cloneable and `Send`.
#[derive(Debug, Clone)]
pub struct HandoffSender {
    tx: Sender<Deferred>,
    wake: Arc<UnixStream>,
}

impl HandoffSender {
    /// Queue `work` and wake the dispatch thread.
    ///
    /// Returns `false` when the bridge is gone.
    pub fn post(&self, work: Deferred) -> bool {
        if self.tx.try_send(work).is_err() {
            return false;
        }
        match (&*self.wake).write(&[1]) {
            Ok(_) => true,
            // A full socket already guarantees a wakeup.
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => true,
            Err(err) => {
                log::warn!("Failed to wake dispatch thread: {err}");
                true
            },
        }
    }
}

#[derive(Debug)]
pub(crate) struct Handoff {
    tx: Sender<Deferred>,
    rx: Receiver<Deferred>,
    wake_tx: Arc<UnixStream>,
    wake_rx: UnixStream,
}

impl Handoff {
    pub(crate) fn new() -> io::Result<Self> {
        let (tx, rx) = channel::unbounded();
        let (wake_tx, wake_rx) = UnixStream::pair()?;
        wake_tx.set_nonblocking(true)?;
        wake_rx.set_nonblocking(true)?;
        Ok(Self {
            tx,
            rx,
            wake_tx: Arc::new(wake_tx),
            wake_rx,
        })
    }

    pub(crate) fn sender(&self) -> HandoffSender {
        HandoffSender {
            tx: self.tx.clone(),
            wake: Arc::clone(&self.wake_tx),
        }
    }

    /// Readable when work was posted.
    pub(crate) fn wake_fd(&self) -> RawFd {
        self.wake_rx.as_raw_fd()
    }

    /// Clear the wakeup socket and take all queued work.
    pub(crate) fn drain(&self) -> Vec<Deferred> {
        let mut buf = [0u8; 64];
        loop {
            match (&self.wake_rx).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    log::warn!("Failed to drain wakeup socket: {err}");
                    break;
                },
            }
        }
        let mut work = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(item) => work.push(item),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        work
    }
}
