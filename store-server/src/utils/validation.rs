//! Geo coordinate validation
//!
//! Rider positions arrive from untrusted clients (Socket.IO frames and
//! checkout payloads); out-of-range values would corrupt the tracking map.

use crate::utils::AppError;

/// Validate a latitude value is within [-90, 90].
pub fn validate_latitude(lat: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::validation(format!(
            "latitude {lat} out of range [-90, 90]"
        )));
    }
    Ok(())
}

/// Validate a longitude value is within [-180, 180].
pub fn validate_longitude(lon: f64) -> Result<(), AppError> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::validation(format!(
            "longitude {lon} out of range [-180, 180]"
        )));
    }
    Ok(())
}
