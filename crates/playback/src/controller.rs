//! The playback controller: date-stepping chains with generation-token
//! cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use century_common::HourStamp;

use crate::fetch::OverlayFetcher;
use crate::overlay::OverlayId;
use crate::surface::RenderSurface;

/// Delay between consecutive playback steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1000);

/// State shared between the controller and its running chains.
struct Shared {
    /// Live generation. A chain captures the value current when it starts
    /// and goes permanently inert the moment the two diverge.
    generation: AtomicU64,
    /// Handle of the markers overlay currently attached, if any.
    active: Mutex<Option<OverlayId>>,
}

/// Walks forward through hourly overlays on a fixed cadence.
///
/// `start` supersedes any running chain, even one whose fetch has not yet
/// returned; the stale response is detected by its token on arrival and
/// discarded. `stop` invalidates without touching the surface. At most one
/// markers overlay is attached at any time.
pub struct PlaybackController<F, S> {
    fetcher: Arc<F>,
    surface: Arc<S>,
    shared: Arc<Shared>,
    step_delay: Duration,
}

impl<F: OverlayFetcher, S: RenderSurface> PlaybackController<F, S> {
    pub fn new(fetcher: Arc<F>, surface: Arc<S>) -> Self {
        Self::with_step_delay(fetcher, surface, DEFAULT_STEP_DELAY)
    }

    pub fn with_step_delay(fetcher: Arc<F>, surface: Arc<S>, step_delay: Duration) -> Self {
        Self {
            fetcher,
            surface,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
            }),
            step_delay,
        }
    }

    /// Begin a new chain at the given hour, superseding any prior one.
    /// Returns the chain's captured token.
    pub fn start(&self, stamp: HourStamp) -> u64 {
        let token = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(token, start = %stamp, "starting playback chain");

        let fetcher = Arc::clone(&self.fetcher);
        let surface = Arc::clone(&self.surface);
        let shared = Arc::clone(&self.shared);
        let delay = self.step_delay;
        tokio::spawn(run_chain(fetcher, surface, shared, delay, token, stamp));

        token
    }

    /// Invalidate every outstanding chain. Nothing else happens here: any
    /// scheduled step or in-flight response sees the bumped generation and
    /// no-ops, leaving the surface exactly as it was.
    pub fn stop(&self) {
        let gen = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation = gen, "playback stopped");
    }

    /// The live generation value.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Handle of the currently attached markers overlay, if any.
    pub async fn active_overlay(&self) -> Option<OverlayId> {
        *self.shared.active.lock().await
    }
}

async fn run_chain<F: OverlayFetcher, S: RenderSurface>(
    fetcher: Arc<F>,
    surface: Arc<S>,
    shared: Arc<Shared>,
    delay: Duration,
    token: u64,
    mut stamp: HourStamp,
) {
    loop {
        // Superseded before this step ran.
        if shared.generation.load(Ordering::SeqCst) != token {
            return;
        }

        let fetched = fetcher.fetch(&stamp).await;

        match fetched {
            Ok(overlay) => {
                let mut active = shared.active.lock().await;
                // Stale response: a newer chain (or a stop) took over while
                // the request was in flight. Discard without side effects.
                if shared.generation.load(Ordering::SeqCst) != token {
                    return;
                }
                surface.set_date_label(&stamp);
                if let Some(prev) = active.take() {
                    surface.detach(prev);
                }
                *active = Some(surface.attach(overlay));
                drop(active);

                stamp = stamp.next();
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if shared.generation.load(Ordering::SeqCst) != token {
                    return;
                }
                warn!(token, hour = %stamp, error = %err, "overlay fetch failed, chain halts");
                // Halting here is policy: no retry, no skip to the next
                // hour. Only a new start resumes playback. The alert runs
                // as its own task so it never fires inside the response
                // path.
                let surface = Arc::clone(&surface);
                let message = format!("No weather overlay for {}: {}", stamp, err);
                tokio::spawn(async move { surface.alert(&message) });
                return;
            }
        }
    }
}
