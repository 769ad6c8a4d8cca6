use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::{error::LocationError, model::Coordinate};

/// Terminal answer from the permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// The platform location service, seen as an external collaborator.
///
/// Implementations wrap whatever the host platform offers (a geolocation
/// API, a console prompt, a test script). Authorization must be resolved
/// before a fix is requested; `LocationProvider` enforces the ordering.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    /// Resolve the permission state, prompting the user while undetermined.
    async fn request_authorization(&self) -> Authorization;

    /// Request a single position fix. Only called after a grant.
    async fn request_fix(&self) -> Result<Coordinate, LocationError>;
}

/// Published location state: the tri-state absence plus the fix itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationState {
    /// Nothing resolved yet.
    Pending,
    /// Permission denied; terminal until the user changes their answer.
    Denied,
    /// Authorized, but no fix could be obtained.
    Unavailable,
    Fixed(Coordinate),
}

impl LocationState {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            LocationState::Fixed(coordinate) => Some(*coordinate),
            _ => None,
        }
    }
}

/// Obtains one device position with user consent and publishes the outcome.
///
/// Only the most recent state is retained; subscribers are notified on every
/// update, including the transition from absent to present.
#[derive(Debug)]
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    authorization: Mutex<Option<Authorization>>,
    state: watch::Sender<LocationState>,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        let (state, _) = watch::channel(LocationState::Pending);
        Self { source, authorization: Mutex::new(None), state }
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> LocationState {
        *self.state.borrow()
    }

    /// Resolve authorization and request a single fix. No return value: the
    /// outcome arrives through the subscription channel.
    ///
    /// The authorization answer is cached, so a known denial is republished
    /// without prompting again and a prior grant skips straight to the fix.
    pub async fn request_location(&self) {
        let authorization = {
            let mut cached = self.authorization.lock().await;
            match *cached {
                Some(answer) => answer,
                None => {
                    let answer = self.source.request_authorization().await;
                    *cached = Some(answer);
                    answer
                }
            }
        };

        if authorization == Authorization::Denied {
            self.publish(LocationState::Denied);
            return;
        }

        match self.source.request_fix().await {
            Ok(coordinate) => self.publish(LocationState::Fixed(coordinate)),
            Err(err) => {
                debug!("position fix failed: {err}");
                self.publish(match err {
                    LocationError::Denied => LocationState::Denied,
                    LocationError::Unavailable => LocationState::Unavailable,
                });
            }
        }
    }

    fn publish(&self, next: LocationState) {
        // send_replace delivers even while no receiver is attached
        self.state.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct ScriptedSource {
        authorization: Authorization,
        fix: Result<Coordinate, LocationError>,
        prompts: AtomicUsize,
        fixes: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(authorization: Authorization, fix: Result<Coordinate, LocationError>) -> Arc<Self> {
            Arc::new(Self {
                authorization,
                fix,
                prompts: AtomicUsize::new(0),
                fixes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LocationSource for ScriptedSource {
        async fn request_authorization(&self) -> Authorization {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.authorization
        }

        async fn request_fix(&self) -> Result<Coordinate, LocationError> {
            self.fixes.fetch_add(1, Ordering::SeqCst);
            self.fix
        }
    }

    #[tokio::test]
    async fn granted_fix_is_published_to_subscribers() {
        let source = ScriptedSource::new(Authorization::Granted, Ok(Coordinate::new(-6.2, 106.8)));
        let provider = LocationProvider::new(source);
        let mut rx = provider.subscribe();

        assert_eq!(*rx.borrow(), LocationState::Pending);

        provider.request_location().await;

        rx.changed().await.expect("provider still alive");
        assert_eq!(rx.borrow().coordinate(), Some(Coordinate::new(-6.2, 106.8)));
    }

    #[tokio::test]
    async fn denial_is_terminal_and_never_reprompts() {
        let source = ScriptedSource::new(Authorization::Denied, Ok(Coordinate::new(0.0, 0.0)));
        let provider = LocationProvider::new(Arc::clone(&source) as Arc<dyn LocationSource>);

        provider.request_location().await;
        provider.request_location().await;

        assert_eq!(provider.current(), LocationState::Denied);
        assert_eq!(source.prompts.load(Ordering::SeqCst), 1);
        assert_eq!(source.fixes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn grant_is_cached_across_requests() {
        let source = ScriptedSource::new(Authorization::Granted, Ok(Coordinate::new(1.0, 2.0)));
        let provider = LocationProvider::new(Arc::clone(&source) as Arc<dyn LocationSource>);

        provider.request_location().await;
        provider.request_location().await;

        assert_eq!(source.prompts.load(Ordering::SeqCst), 1);
        assert_eq!(source.fixes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fix_publishes_unavailable() {
        let source = ScriptedSource::new(Authorization::Granted, Err(LocationError::Unavailable));
        let provider = LocationProvider::new(source);

        provider.request_location().await;

        assert_eq!(provider.current(), LocationState::Unavailable);
        assert_eq!(provider.current().coordinate(), None);
    }
}
