use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{
    error::{FetchError, LocationError},
    fetch::WeatherFetcher,
    location::LocationState,
    model::{Coordinate, WeatherSnapshot},
};

/// Where the pipeline currently stands.
#[derive(Debug, Clone, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    /// No coordinate will arrive: permission denied or no fix.
    NoLocation(LocationError),
    Ready,
    Failed(Arc<FetchError>),
}

/// The single observable value at the presentation boundary.
///
/// `snapshot` keeps the last successfully fetched value: a later failure
/// changes the phase but never clears data already on screen.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub phase: Phase,
    pub snapshot: Option<WeatherSnapshot>,
}

impl DisplayState {
    /// True once the current interaction can no longer change on its own.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Loading)
    }
}

/// Owns the display state and runs at most one fetch per coordinate update.
///
/// A coordinate arriving while a fetch is in flight supersedes it: the old
/// task is aborted and a late result from it is discarded, so responses can
/// never win by completion order.
#[derive(Debug)]
pub struct WeatherApp {
    fetcher: WeatherFetcher,
    state: watch::Sender<DisplayState>,
    generation: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl WeatherApp {
    pub fn new(fetcher: WeatherFetcher) -> Arc<Self> {
        let (state, _) = watch::channel(DisplayState::default());
        Arc::new(Self {
            fetcher,
            state,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    /// Apply one location update. Transitions are the only way the display
    /// state changes.
    pub fn on_location_update(self: &Arc<Self>, update: &LocationState) {
        match update {
            LocationState::Pending => self.set_phase(Phase::Loading),
            LocationState::Denied => self.set_phase(Phase::NoLocation(LocationError::Denied)),
            LocationState::Unavailable => {
                self.set_phase(Phase::NoLocation(LocationError::Unavailable));
            }
            LocationState::Fixed(coordinate) => self.supersede_fetch(*coordinate),
        }
    }

    /// Feed location updates into the app until the provider goes away.
    pub async fn drive(self: Arc<Self>, mut location_rx: watch::Receiver<LocationState>) {
        loop {
            let update = *location_rx.borrow_and_update();
            self.on_location_update(&update);
            if location_rx.changed().await.is_err() {
                break;
            }
        }
    }

    fn set_phase(&self, phase: Phase) {
        self.state.send_modify(|state| state.phase = phase);
    }

    fn supersede_fetch(self: &Arc<Self>, coordinate: Coordinate) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_phase(Phase::Loading);

        let app = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = app.fetcher.fetch_weather(coordinate).await;

            if app.generation.load(Ordering::SeqCst) != generation {
                debug!("discarding result of superseded weather fetch");
                return;
            }

            app.state.send_modify(|state| match result {
                Ok(snapshot) => {
                    state.phase = Phase::Ready;
                    state.snapshot = Some(snapshot);
                }
                Err(err) => state.phase = Phase::Failed(Arc::new(err)),
            });
        });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = in_flight.replace(task) {
            previous.abort();
        }
    }
}
