//! Geolocation capability
//!
//! Positions are consumed through the `Geolocator` trait. A watch is a
//! subscription that must be released; `PositionWatch` cancels its producer
//! when cleared or dropped.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Position, TOKYO_CENTER};
use crate::error::{Result, TripError};

/// Source of device positions
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// One-shot position fix
    async fn current_position(&self) -> Result<Position>;

    /// Continuing stream of positions. Must be called inside a tokio runtime.
    fn watch_position(&self) -> Result<PositionWatch>;
}

/// Handle to an active position subscription
pub struct PositionWatch {
    rx: mpsc::Receiver<Result<Position>>,
    cancel_token: CancellationToken,
}

impl PositionWatch {
    /// Create a watch and the sender half its producer writes to
    pub fn channel(buffer: usize) -> (mpsc::Sender<Result<Position>>, CancellationToken, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        let cancel_token = CancellationToken::new();
        let watch = Self {
            rx,
            cancel_token: cancel_token.clone(),
        };
        (tx, cancel_token, watch)
    }

    /// Next position update; `None` once the watch is cleared or the producer stops
    pub async fn next(&mut self) -> Option<Result<Position>> {
        if self.cancel_token.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel_token.cancelled() => None,
            update = self.rx.recv() => update,
        }
    }

    /// Release the subscription
    pub fn clear(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Reports one fixed position, repeating it on every watch tick
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    position: Position,
    interval: Duration,
}

impl FixedGeolocator {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            interval: Duration::from_secs(30),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Position> {
        Ok(self.position)
    }

    fn watch_position(&self) -> Result<PositionWatch> {
        let (tx, cancel_token, watch) = PositionWatch::channel(4);
        let position = self.position;
        let interval = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(Ok(position)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            log::debug!("Position watch released");
        });

        Ok(watch)
    }
}

/// A device without usable geolocation
#[derive(Debug, Clone)]
pub enum UnavailableGeolocator {
    Unsupported,
    Denied(String),
}

impl UnavailableGeolocator {
    fn error(&self) -> TripError {
        match self {
            UnavailableGeolocator::Unsupported => TripError::GeolocationUnsupported,
            UnavailableGeolocator::Denied(reason) => TripError::GeolocationDenied(reason.clone()),
        }
    }
}

#[async_trait]
impl Geolocator for UnavailableGeolocator {
    async fn current_position(&self) -> Result<Position> {
        Err(self.error())
    }

    fn watch_position(&self) -> Result<PositionWatch> {
        Err(self.error())
    }
}

/// A position to center on, and whether it is the fixed fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub position: Position,
    pub is_fallback: bool,
}

/// Current position, degrading to Tokyo Station when geolocation fails
pub async fn position_or_fallback(geolocator: &dyn Geolocator) -> PositionFix {
    match geolocator.current_position().await {
        Ok(position) => PositionFix {
            position,
            is_fallback: false,
        },
        Err(e) => {
            log::warn!("Location unavailable, showing Tokyo center: {}", e);
            PositionFix {
                position: TOKYO_CENTER.into(),
                is_fallback: true,
            }
        }
    }
}
