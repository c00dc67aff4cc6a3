//! Behavioral tests for the playback controller and the info panel.
//!
//! Time is paused, so step delays elapse deterministically and the
//! interleavings below are reproducible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use century_common::{Coordinate, HourStamp};
use playback::{
    FetchError, InfoFetcher, InfoPanel, Overlay, OverlayFetcher, OverlayId, OverlayKind,
    PlaybackController, RenderSurface,
};

fn hs(s: &str) -> HourStamp {
    s.parse().expect("valid hour token")
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Label(String),
    Attach(u64, OverlayKind, String),
    Detach(u64),
    Alert(String),
    InfoText(String),
}

#[derive(Default)]
struct SurfaceState {
    events: Vec<Event>,
    attached: HashMap<u64, OverlayKind>,
    double_attach: bool,
}

/// Records every surface operation and tracks the at-most-one-per-kind
/// invariant as attachments happen.
#[derive(Default)]
struct TestSurface {
    next_id: AtomicU64,
    state: StdMutex<SurfaceState>,
}

impl TestSurface {
    fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    fn attached_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Attach(_, _, name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Label(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Alert(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    fn invariant_held(&self) -> bool {
        !self.state.lock().unwrap().double_attach
    }

    fn currently_attached(&self) -> usize {
        self.state.lock().unwrap().attached.len()
    }
}

impl RenderSurface for TestSurface {
    fn attach(&self, overlay: Overlay) -> OverlayId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut st = self.state.lock().unwrap();
        if st.attached.values().any(|k| *k == overlay.kind) {
            st.double_attach = true;
        }
        st.attached.insert(id, overlay.kind);
        st.events.push(Event::Attach(id, overlay.kind, overlay.name));
        OverlayId(id)
    }

    fn detach(&self, id: OverlayId) {
        let mut st = self.state.lock().unwrap();
        st.attached.remove(&id.0);
        st.events.push(Event::Detach(id.0));
    }

    fn set_date_label(&self, stamp: &HourStamp) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Label(stamp.to_string()));
    }

    fn set_info_text(&self, text: &str) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::InfoText(text.to_string()));
    }

    fn alert(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::Alert(message.to_string()));
    }

    fn look_at(&self, _coord: Coordinate) {}

    fn place_marker(&self, _coord: Coordinate) {}
}

/// Fetcher with an optional failing hour and an optional gate holding the
/// first request in flight until released.
#[derive(Default)]
struct ScriptedFetcher {
    fail_at: Option<HourStamp>,
    gate_first: Option<Arc<Notify>>,
    calls: AtomicU64,
}

#[async_trait]
impl OverlayFetcher for ScriptedFetcher {
    async fn fetch(&self, stamp: &HourStamp) -> Result<Overlay, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            if let Some(gate) = &self.gate_first {
                gate.notified().await;
            }
        }
        if self.fail_at == Some(*stamp) {
            return Err(FetchError::Empty(stamp.to_string()));
        }
        Ok(Overlay::markers(stamp.to_string(), Vec::new()))
    }
}

fn controller(
    fetcher: ScriptedFetcher,
) -> (
    PlaybackController<ScriptedFetcher, TestSurface>,
    Arc<TestSurface>,
    Arc<ScriptedFetcher>,
) {
    let fetcher = Arc::new(fetcher);
    let surface = Arc::new(TestSurface::default());
    let ctl = PlaybackController::new(Arc::clone(&fetcher), Arc::clone(&surface));
    (ctl, surface, fetcher)
}

// ============================================================================
// Playback chain
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_chain_steps_hours_and_swaps_overlays() {
    let start = hs("1978-10-01 10");
    let fail_at = start.next().next().next();
    let (ctl, surface, _) = controller(ScriptedFetcher {
        fail_at: Some(fail_at),
        ..Default::default()
    });

    ctl.start(start);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(
        surface.labels(),
        vec!["1978-10-01 10", "1978-10-01 11", "1978-10-01 12"]
    );
    assert_eq!(
        surface.attached_names(),
        vec!["1978-10-01 10", "1978-10-01 11", "1978-10-01 12"]
    );
    assert!(surface.invariant_held());
    // Exactly one markers overlay remains attached after the halt.
    assert_eq!(surface.currently_attached(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_each_step_detaches_before_attaching() {
    let start = hs("2013-12-31 23");
    let (ctl, surface, _) = controller(ScriptedFetcher {
        fail_at: Some(hs("2014-01-01 01")),
        ..Default::default()
    });

    ctl.start(start);
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Year boundary crossed by the stepper, previous overlay detached
    // before the replacement attaches.
    let events: Vec<Event> = surface
        .events()
        .into_iter()
        .filter(|e| !matches!(e, Event::Alert(_)))
        .collect();
    assert_eq!(
        events,
        vec![
            Event::Label("2013-12-31 23".to_string()),
            Event::Attach(1, OverlayKind::Markers, "2013-12-31 23".to_string()),
            Event::Label("2014-01-01 00".to_string()),
            Event::Detach(1),
            Event::Attach(2, OverlayKind::Markers, "2014-01-01 00".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_halts_chain_without_scheduling_next_hour() {
    let start = hs("1978-10-01 10");
    let (ctl, surface, fetcher) = controller(ScriptedFetcher {
        fail_at: Some(start),
        ..Default::default()
    });

    ctl.start(start);
    tokio::time::sleep(Duration::from_secs(10)).await;

    // The failing hour was the only request; H+1 was never fetched.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(surface.labels().is_empty());
    assert!(surface.attached_names().is_empty());

    let alerts = surface.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("1978-10-01 10"), "alert names the hour: {}", alerts[0]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_makes_scheduled_steps_inert() {
    let (ctl, surface, _) = controller(ScriptedFetcher::default());

    ctl.start(hs("1978-10-01 10"));
    // Three attaches land at t=0s, 1s and 2s; stop midway to the fourth.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    ctl.stop();

    let before = surface.events();
    let active = ctl.active_overlay().await;

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(surface.events(), before, "no change after stop");
    assert_eq!(ctl.active_overlay().await, active, "active overlay untouched");
    // Stopping again is harmless.
    ctl.stop();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(surface.events(), before);
}

#[tokio::test(start_paused = true)]
async fn test_start_supersedes_in_flight_fetch() {
    let gate = Arc::new(Notify::new());
    let a = hs("1978-10-01 10");
    let b = hs("1999-01-01 00");
    let (ctl, surface, _) = controller(ScriptedFetcher {
        gate_first: Some(Arc::clone(&gate)),
        fail_at: Some(hs("1999-01-01 02")),
        ..Default::default()
    });

    // Chain A's first fetch parks on the gate.
    ctl.start(a);
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Chain B supersedes it and runs to its failing hour.
    ctl.start(b);
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Now A's response arrives, after B's chain has already run.
    gate.notify_one();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(
        surface.attached_names(),
        vec!["1999-01-01 00", "1999-01-01 01"],
        "the superseded response must not attach"
    );
    assert_eq!(surface.labels(), vec!["1999-01-01 00", "1999-01-01 01"]);
    assert!(surface.invariant_held());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_restarts_leave_only_newest_chain() {
    let (ctl, surface, _) = controller(ScriptedFetcher::default());

    // Back-to-back starts; no chain gets to run until the first await.
    ctl.start(hs("1950-01-01 00"));
    ctl.start(hs("1960-01-01 00"));
    let newest = ctl.start(hs("1970-01-01 00"));
    assert_eq!(ctl.generation(), newest);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    ctl.stop();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let names = surface.attached_names();
    assert!(!names.is_empty());
    assert!(
        names.iter().all(|n| n.starts_with("1970-01-01")),
        "only the newest chain attaches: {:?}",
        names
    );
    assert!(surface.invariant_held());
}

// ============================================================================
// Info panel
// ============================================================================

struct ScriptedInfo {
    summary_delay: Duration,
    fail_summary: bool,
    region_name: String,
}

impl Default for ScriptedInfo {
    fn default() -> Self {
        Self {
            summary_delay: Duration::ZERO,
            fail_summary: false,
            region_name: "Nevada".to_string(),
        }
    }
}

#[async_trait]
impl InfoFetcher for ScriptedInfo {
    async fn observation_summary(
        &self,
        _coord: Coordinate,
        stamp: &HourStamp,
    ) -> Result<String, FetchError> {
        tokio::time::sleep(self.summary_delay).await;
        if self.fail_summary {
            return Err(FetchError::Status(500));
        }
        Ok(format!("observation at {}", stamp))
    }

    async fn region_outline(&self, _coord: Coordinate) -> Result<Overlay, FetchError> {
        Ok(Overlay::region(self.region_name.clone(), Vec::new()))
    }
}

fn info_panel(
    fetcher: ScriptedInfo,
) -> (Arc<InfoPanel<ScriptedInfo, TestSurface>>, Arc<TestSurface>) {
    let surface = Arc::new(TestSurface::default());
    let panel = Arc::new(InfoPanel::new(Arc::new(fetcher), Arc::clone(&surface)));
    (panel, surface)
}

#[tokio::test(start_paused = true)]
async fn test_lookup_applies_each_response_on_arrival() {
    let (panel, surface) = info_panel(ScriptedInfo {
        summary_delay: Duration::from_secs(5),
        ..Default::default()
    });
    let coord = Coordinate::new(39.5, -116.9).unwrap();

    let running = {
        let panel = Arc::clone(&panel);
        tokio::spawn(async move { panel.lookup(coord, hs("1978-10-01 10")).await })
    };

    // The region outline lands while the summary is still in flight.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(surface.attached_names(), vec!["Nevada"]);
    assert!(surface.events().iter().all(|e| !matches!(e, Event::InfoText(_))));

    running.await.unwrap();
    let events = surface.events();
    assert!(events.contains(&Event::InfoText("observation at 1978-10-01 10".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_second_lookup_replaces_region_overlay() {
    let (panel, surface) = info_panel(ScriptedInfo::default());
    let coord = Coordinate::new(39.5, -116.9).unwrap();

    panel.lookup(coord, hs("1978-10-01 10")).await;
    let first = panel.region_overlay().await.expect("region attached");

    panel.lookup(coord, hs("1978-10-01 11")).await;
    let second = panel.region_overlay().await.expect("region attached");

    assert_ne!(first, second);
    assert!(surface.events().contains(&Event::Detach(first.0)));
    assert!(surface.invariant_held());
    assert_eq!(surface.currently_attached(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_summary_failure_alerts_and_leaves_text_panel() {
    let (panel, surface) = info_panel(ScriptedInfo {
        fail_summary: true,
        ..Default::default()
    });
    let coord = Coordinate::new(39.5, -116.9).unwrap();

    panel.lookup(coord, hs("1978-10-01 10")).await;

    assert!(surface.events().iter().all(|e| !matches!(e, Event::InfoText(_))));
    assert_eq!(surface.alerts().len(), 1);
    // The region side is unaffected by the summary failure.
    assert_eq!(surface.attached_names(), vec!["Nevada"]);
}

// ============================================================================
// Marker and region overlays coexist
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_markers_and_region_are_separate_slots() {
    let surface = Arc::new(TestSurface::default());
    let ctl = PlaybackController::new(
        Arc::new(ScriptedFetcher {
            fail_at: Some(hs("1978-10-01 11")),
            ..Default::default()
        }),
        Arc::clone(&surface),
    );
    let panel = InfoPanel::new(Arc::new(ScriptedInfo::default()), Arc::clone(&surface));

    ctl.start(hs("1978-10-01 10"));
    panel
        .lookup(Coordinate::new(39.5, -116.9).unwrap(), hs("1978-10-01 10"))
        .await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    // One markers overlay and one region overlay attached side by side.
    assert_eq!(surface.currently_attached(), 2);
    assert!(surface.invariant_held());
}
