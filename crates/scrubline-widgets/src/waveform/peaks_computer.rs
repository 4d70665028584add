//! Background envelope computation
//!
//! Building an envelope means scanning the whole file (twice for a
//! disk-streaming source: once for the global peak, once per column). That
//! never runs on the display path. The `PeaksComputer` owns a dedicated
//! thread:
//!
//! 1. The scheduler sends a `PeaksComputeRequest` (source, width, padding)
//! 2. The thread computes the global peak, scale factor and envelope
//! 3. The scheduler polls for the `PeaksComputeResult` in its tick
//!
//! ```ignore
//! let computer = PeaksComputer::spawn();
//! computer.compute(PeaksComputeRequest { generation: 1, source, width: 800, padding: 0.3 })?;
//!
//! // later, on tick:
//! if let Some(result) = computer.try_recv() {
//!     // install result.outcome
//! }
//! ```

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use scrubline_core::source::{AudioSource, SourceResult};

use super::error::{OverviewError, OverviewResult};
use super::peaks::{build_envelope, PeakEnvelope};
use super::scale::ScaleFactor;

/// Envelope and scale produced together by one recompute pass
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeSnapshot {
    pub envelope: PeakEnvelope,
    /// `None` for a silent file
    pub scale: Option<ScaleFactor>,
}

/// Compute a snapshot synchronously
///
/// `Ok(None)` means there was nothing to build (zero width or empty file).
pub fn compute_snapshot(
    source: &dyn AudioSource,
    width: usize,
    padding: f64,
) -> SourceResult<Option<EnvelopeSnapshot>> {
    if width == 0 || source.total_frame_count() == 0 {
        return Ok(None);
    }

    let scale = ScaleFactor::from_channel_peaks(&source.global_peak()?, padding);
    if scale.is_none() {
        log::info!("compute_snapshot: {:?} is silent, bars suppressed", source.path());
    }

    Ok(build_envelope(source, width)?.map(|envelope| EnvelopeSnapshot { envelope, scale }))
}

/// Request to rebuild the envelope of one source
pub struct PeaksComputeRequest {
    /// Source generation the request was issued for
    pub generation: u64,
    pub source: Arc<dyn AudioSource>,
    /// Viewport width in pixels
    pub width: usize,
    pub padding: f64,
}

impl std::fmt::Debug for PeaksComputeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeaksComputeRequest")
            .field("generation", &self.generation)
            .field("source", &self.source.path())
            .field("width", &self.width)
            .field("padding", &self.padding)
            .finish()
    }
}

/// Result of one recompute pass
#[derive(Debug)]
pub struct PeaksComputeResult {
    /// Generation copied from the request
    pub generation: u64,
    pub width: usize,
    pub outcome: SourceResult<Option<EnvelopeSnapshot>>,
}

/// Background thread for envelope computation
///
/// Requests are processed strictly one after another; the scheduler makes
/// sure no more than one is outstanding.
pub struct PeaksComputer {
    tx: Sender<PeaksComputeRequest>,
    rx: Receiver<PeaksComputeResult>,
    _handle: JoinHandle<()>,
}

impl PeaksComputer {
    /// Spawn the background computation thread
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<PeaksComputeRequest>();
        let (result_tx, result_rx) = std::sync::mpsc::channel::<PeaksComputeResult>();

        let handle = thread::Builder::new()
            .name("peaks-computer".to_string())
            .spawn(move || {
                peaks_thread(request_rx, result_tx);
            })
            .expect("Failed to spawn peaks computer thread");

        log::info!("PeaksComputer background thread started");

        Self {
            tx: request_tx,
            rx: result_rx,
            _handle: handle,
        }
    }

    /// Submit a request (non-blocking)
    pub fn compute(&self, request: PeaksComputeRequest) -> OverviewResult<()> {
        self.tx
            .send(request)
            .map_err(|_| OverviewError::WorkerDisconnected)
    }

    /// Poll for a finished pass (non-blocking)
    pub fn try_recv(&self) -> OverviewResult<Option<PeaksComputeResult>> {
        match self.rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                log::error!("Peaks computer thread disconnected unexpectedly");
                Err(OverviewError::WorkerDisconnected)
            }
        }
    }
}

fn peaks_thread(rx: Receiver<PeaksComputeRequest>, tx: Sender<PeaksComputeResult>) {
    log::debug!("Peaks computer thread starting");

    while let Ok(request) = rx.recv() {
        let start_time = std::time::Instant::now();
        let outcome = compute_snapshot(request.source.as_ref(), request.width, request.padding);

        match &outcome {
            Ok(Some(snapshot)) => log::debug!(
                "Envelope computed for generation {} in {:?} ({} columns x {} channel(s))",
                request.generation,
                start_time.elapsed(),
                snapshot.envelope.columns(),
                snapshot.envelope.channel_count()
            ),
            Ok(None) => log::debug!(
                "Envelope skipped for generation {} (width {}, {} frames)",
                request.generation,
                request.width,
                request.source.total_frame_count()
            ),
            Err(e) => log::warn!(
                "Envelope computation failed for {:?}: {}",
                request.source.path(),
                e
            ),
        }

        let result = PeaksComputeResult {
            generation: request.generation,
            width: request.width,
            outcome,
        };
        if tx.send(result).is_err() {
            break;
        }
    }

    log::debug!("Peaks computer thread shutting down");
}
