//! Extraction progress as an event stream.
//!
//! Each extraction gets its own channel; nothing is shared between
//! invocations. Emitting is best effort: a dropped receiver or an abandoned
//! extraction turns every emit into a no-op.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;

/// One progress snapshot, emitted after each extracted page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub pages_done: u32,
    pub total_pages: u32,
    /// Fraction complete, 0-100.
    pub percent: u8,
    pub elapsed: Duration,
    /// Best-effort remaining time; `None` until a page has completed.
    pub eta: Option<Duration>,
}

impl ProgressEvent {
    /// Build a snapshot. ETA is elapsed / pages done * pages remaining.
    pub fn new(pages_done: u32, total_pages: u32, elapsed: Duration) -> Self {
        let pages_done = pages_done.min(total_pages);
        let percent = if total_pages == 0 {
            100
        } else {
            ((pages_done as u64 * 100) / total_pages as u64) as u8
        };
        let eta = (pages_done > 0).then(|| {
            let remaining = total_pages - pages_done;
            (elapsed / pages_done) * remaining
        });

        Self {
            pages_done,
            total_pages,
            percent,
            elapsed,
            eta,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pages_done >= self.total_pages
    }
}

/// Liveness flag for one in-flight operation. Once abandoned, state
/// updates coming back from suspended work are dropped.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn abandon(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sending half handed to the extractor.
#[derive(Debug)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    liveness: Liveness,
}

impl ProgressSink {
    /// A sink that drops everything, for callers that don't watch progress.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            liveness: Liveness::new(),
        }
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Deliver an event. Returns whether it was delivered; failures are
    /// never propagated.
    pub fn emit(&self, event: ProgressEvent) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        match &self.tx {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

/// Receiving half: a lazy, ordered stream that ends when the extraction
/// finishes. It cannot be restarted.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Create a progress channel bound to `liveness`.
pub fn progress_channel(liveness: Liveness) -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSink {
            tx: Some(tx),
            liveness,
        },
        ProgressStream { rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_progress_percent_and_eta() {
        let event = ProgressEvent::new(1, 4, Duration::from_secs(2));
        assert_eq!(event.percent, 25);
        assert_eq!(event.eta, Some(Duration::from_secs(6)));
        assert!(!event.is_complete());

        let done = ProgressEvent::new(4, 4, Duration::from_secs(8));
        assert_eq!(done.percent, 100);
        assert_eq!(done.eta, Some(Duration::ZERO));
        assert!(done.is_complete());
    }

    #[test]
    fn test_no_eta_before_first_page() {
        let event = ProgressEvent::new(0, 10, Duration::from_millis(5));
        assert_eq!(event.percent, 0);
        assert!(event.eta.is_none());
    }

    #[tokio::test]
    async fn test_stream_preserves_order_and_ends() {
        let (sink, mut stream) = progress_channel(Liveness::new());
        for done in 1..=3 {
            assert!(sink.emit(ProgressEvent::new(done, 3, Duration::from_secs(done as u64))));
        }
        drop(sink);

        let seen: Vec<u32> = stream.by_ref().map(|e| e.pages_done).collect().await;
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_emit_after_abandon_is_noop() {
        let liveness = Liveness::new();
        let (sink, _stream) = progress_channel(liveness.clone());
        liveness.abandon();
        assert!(!sink.emit(ProgressEvent::new(1, 2, Duration::ZERO)));
    }

    #[test]
    fn test_emit_to_dropped_receiver_does_not_fail() {
        let (sink, stream) = progress_channel(Liveness::new());
        drop(stream);
        assert!(!sink.emit(ProgressEvent::new(1, 2, Duration::ZERO)));
        assert!(!ProgressSink::disabled().emit(ProgressEvent::new(1, 2, Duration::ZERO)));
    }
}
