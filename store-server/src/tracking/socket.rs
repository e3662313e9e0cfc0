//! Socket.IO wiring for the live rider location feed.
//!
//! Wire protocol, shared with the web clients:
//! - on connect the server pushes the latest `location` so a fresh
//!   subscriber renders a marker immediately
//! - riders send `update-location` with `{lat, lon}`; the value is stored
//!   in the [`RiderFeed`] and re-broadcast as `location` to every connected
//!   client, the sender included

use socketioxide::SocketIo;
use socketioxide::extract::{Data, SocketRef, State};
use socketioxide::layer::SocketIoLayer;

use super::feed::{GeoPoint, RiderFeed};
use crate::utils::validation::{validate_latitude, validate_longitude};

/// Build the Socket.IO layer and register the root namespace.
pub fn build_layer(feed: RiderFeed) -> (SocketIoLayer, SocketIo) {
    let (layer, io) = SocketIo::builder().with_state(feed).build_layer();
    io.ns("/", on_connect);
    (layer, io)
}

async fn on_connect(socket: SocketRef, State(feed): State<RiderFeed>) {
    tracing::debug!(socket_id = %socket.id, "Location subscriber connected");

    let current = feed.current();
    socket.emit("location", &current).ok();

    socket.on("update-location", on_update_location);

    socket.on_disconnect(|socket: SocketRef| {
        tracing::debug!(socket_id = %socket.id, "Location subscriber disconnected");
    });
}

async fn on_update_location(
    socket: SocketRef,
    State(feed): State<RiderFeed>,
    Data(point): Data<GeoPoint>,
) {
    if validate_latitude(point.lat).is_err() || validate_longitude(point.lon).is_err() {
        tracing::warn!(
            socket_id = %socket.id,
            lat = point.lat,
            lon = point.lon,
            "Dropping out-of-range location update"
        );
        return;
    }

    feed.publish(point);

    // fan out to every subscriber, the reporting rider included
    socket.emit("location", &point).ok();
    socket.broadcast().emit("location", &point).await.ok();
}
