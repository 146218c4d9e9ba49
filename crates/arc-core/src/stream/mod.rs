// ── Resource state subscriptions ──
//
// A `ResourceStream` follows one resource's cached state. Every visible
// change (load, refresh, local write, relayed notification) wakes it.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::ResourceState;

/// A subscription to one resource's cached state.
pub struct ResourceStream {
    current: ResourceState,
    receiver: watch::Receiver<ResourceState>,
}

impl ResourceStream {
    pub(crate) fn new(receiver: watch::Receiver<ResourceState>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// State captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &ResourceState {
        &self.current
    }

    /// The latest state, which may be newer than `current()`.
    pub fn latest(&self) -> ResourceState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change.
    /// Returns `None` once the owning resource has been dropped.
    pub async fn changed(&mut self) -> Option<ResourceState> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().clone();
        self.current = state.clone();
        Some(state)
    }

    /// Convert into a `Stream`. The first item is the state at conversion time.
    pub fn into_stream(self) -> ResourceWatchStream {
        ResourceWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct ResourceWatchStream {
    inner: WatchStream<ResourceState>,
}

impl Stream for ResourceWatchStream {
    type Item = ResourceState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
