//! Geolocation service and a controllable fake.
//!
//! Components look the provider up as a [`SharedGeolocation`] service.
//! Tests register a [`FakeGeolocation`] when mounting and decide, request
//! by request, whether to resolve or reject.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp_ms: u64,
}

impl Position {
    /// Position at the given coordinates with a zero timestamp.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coords: Coordinates {
                latitude,
                longitude,
            },
            timestamp_ms: 0,
        }
    }
}

/// Why a position request failed, with the codes browsers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    /// Error with a code and human readable message.
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type PositionCallback = Box<dyn FnOnce(Position)>;
pub type PositionErrorCallback = Box<dyn FnOnce(PositionError)>;

/// Callback-style position source.
pub trait GeolocationProvider {
    fn get_current_position(&self, on_success: PositionCallback, on_error: PositionErrorCallback);
}

/// How components find the provider in [`crate::platform::Services`].
pub type SharedGeolocation = Rc<dyn GeolocationProvider>;

struct PendingRequest {
    on_success: PositionCallback,
    on_error: PositionErrorCallback,
}

#[derive(Default)]
struct FakeState {
    pending: VecDeque<PendingRequest>,
    total: usize,
}

/// A geolocation provider whose requests stay pending until the test
/// settles them.
///
/// Settle requests inside `Container::act` so the resulting state updates
/// are flushed.
#[derive(Clone, Default)]
pub struct FakeGeolocation {
    state: Rc<RefCell<FakeState>>,
}

impl FakeGeolocation {
    /// Create a fake with no pending requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fake as the service type components request.
    pub fn shared(&self) -> SharedGeolocation {
        Rc::new(self.clone())
    }

    /// Resolve the oldest pending request. Returns false if none was
    /// pending.
    pub fn resolve(&self, position: Position) -> bool {
        let request = self.state.borrow_mut().pending.pop_front();
        match request {
            Some(request) => {
                debug!(?position, "resolving geolocation request");
                (request.on_success)(position);
                true
            }
            None => false,
        }
    }

    /// Reject the oldest pending request. Returns false if none was
    /// pending.
    pub fn reject(&self, error: PositionError) -> bool {
        let request = self.state.borrow_mut().pending.pop_front();
        match request {
            Some(request) => {
                debug!(%error, "rejecting geolocation request");
                (request.on_error)(error);
                true
            }
            None => false,
        }
    }

    /// Requests not yet resolved or rejected.
    pub fn pending_requests(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Requests made since creation.
    pub fn total_requests(&self) -> usize {
        self.state.borrow().total
    }
}

impl GeolocationProvider for FakeGeolocation {
    fn get_current_position(&self, on_success: PositionCallback, on_error: PositionErrorCallback) {
        let mut state = self.state.borrow_mut();
        state.total += 1;
        state.pending.push_back(PendingRequest {
            on_success,
            on_error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_requests_wait_for_resolution() {
        let fake = FakeGeolocation::new();
        let seen = Rc::new(Cell::new(None));

        let sink = seen.clone();
        fake.get_current_position(
            Box::new(move |position| sink.set(Some(position.coords.latitude))),
            Box::new(|_| {}),
        );
        assert_eq!(fake.pending_requests(), 1);
        assert_eq!(seen.get(), None);

        assert!(fake.resolve(Position::new(10.0, 20.0)));
        assert_eq!(seen.get(), Some(10.0));
        assert_eq!(fake.pending_requests(), 0);
        assert_eq!(fake.total_requests(), 1);
        assert!(!fake.resolve(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_reject_calls_error_callback() {
        let fake = FakeGeolocation::new();
        let message = Rc::new(RefCell::new(String::new()));

        let sink = message.clone();
        fake.shared().get_current_position(
            Box::new(|_| {}),
            Box::new(move |err| *sink.borrow_mut() = err.to_string()),
        );
        fake.reject(PositionError::new(
            PositionErrorCode::PermissionDenied,
            "User denied Geolocation",
        ));
        assert_eq!(*message.borrow(), "User denied Geolocation");
    }

    #[test]
    fn test_position_serializes_camel_case() {
        let json = serde_json::to_value(Position::new(1.5, -2.0)).unwrap();
        assert_eq!(json["coords"]["latitude"], 1.5);
        assert_eq!(json["timestampMs"], 0);
    }
}
