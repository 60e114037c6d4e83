use crate::errors::{AirfareError, AirfareResult};
use crate::normalize::normalize_required;

/// Input checks shared by the registries
pub struct ValidationService;

impl ValidationService {
    /// Trim, reject blank, and normalize a city name.
    ///
    /// `blank_message` is returned as the validation error when nothing is
    /// left after trimming.
    pub fn city_name(raw: &str, blank_message: &str) -> AirfareResult<String> {
        normalize_required(raw).ok_or_else(|| AirfareError::validation(blank_message))
    }

    /// Airfare must be a positive number with at most 2 decimal places.
    pub fn validate_airfare(airfare: f64) -> AirfareResult<f64> {
        Self::positive_with_places("airfare", airfare, 2)
    }

    /// Duration must be a positive number with at most 1 decimal place.
    pub fn validate_duration(duration: f64) -> AirfareResult<f64> {
        Self::positive_with_places("duration", duration, 1)
    }

    fn positive_with_places(field: &str, value: f64, places: i32) -> AirfareResult<f64> {
        if !value.is_finite() {
            return Err(AirfareError::validation(format!("{field} must be a number")));
        }
        if value <= 0.0 {
            return Err(AirfareError::validation(format!(
                "{field} must be a positive number"
            )));
        }

        let scaled = value * 10f64.powi(places);
        if (scaled - scaled.round()).abs() > 1e-6 * scaled.abs().max(1.0) {
            return Err(AirfareError::validation(format!(
                "{field} must not have more than {places} decimal place(s)"
            )));
        }

        Ok(value)
    }
}
