//! Process-wide latest rider position.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Rider GPS coordinate pair, the wire shape shared with web clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Position reported before any rider has sent an update (central Manila).
pub const DEFAULT_POSITION: GeoPoint = GeoPoint {
    lat: 14.6091,
    lon: 121.0223,
};

impl Default for GeoPoint {
    fn default() -> Self {
        DEFAULT_POSITION
    }
}

/// Latest-value store for the delivery rider's position.
///
/// No history: every update overwrites the previous value, readers always
/// see the single most recent report. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct RiderFeed {
    inner: Arc<RwLock<GeoPoint>>,
}

impl Default for RiderFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RiderFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DEFAULT_POSITION)),
        }
    }

    /// Latest known position.
    pub fn current(&self) -> GeoPoint {
        *self.inner.read()
    }

    /// Overwrite the position. Never blocks on subscribers.
    pub fn publish(&self, point: GeoPoint) {
        *self.inner.write() = point;
    }
}
