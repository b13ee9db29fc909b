//! Unit conversion
//!
//! This module converts raw measurements into meters and kilograms.
//! - Conversion is exact floating-point arithmetic; nothing is rounded here
//! - Any non-positive or non-finite input is rejected
//! - Reverse helpers exist for imperial display

use crate::error::EngineError;
use crate::types::{Height, Measurement, NormalizedMeasurement, UnitSystem, Weight};

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

/// Inches per foot
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Kilograms per pound
pub const KG_PER_POUND: f64 = 0.453592;

/// Centimeters per meter
pub const CM_PER_METER: f64 = 100.0;

/// Meters per inch, derived from [`CM_PER_INCH`]
pub const METERS_PER_INCH: f64 = CM_PER_INCH / CM_PER_METER;

/// Convert a measurement to meters and kilograms
pub fn to_metric(measurement: &Measurement) -> Result<NormalizedMeasurement, EngineError> {
    let height_meters = height_to_meters(&measurement.height)?;
    let weight_kg = weight_to_kg(&measurement.weight)?;

    Ok(NormalizedMeasurement {
        height_meters,
        weight_kg,
    })
}

/// Convert a height to meters
pub fn height_to_meters(height: &Height) -> Result<f64, EngineError> {
    match *height {
        Height::Centimeters(cm) => {
            ensure_positive("height", cm)?;
            Ok(cm / CM_PER_METER)
        }
        Height::Meters(m) => {
            ensure_positive("height", m)?;
            Ok(m)
        }
        Height::FeetInches { feet, inches } => {
            if !feet.is_finite() || !inches.is_finite() || feet < 0.0 || inches < 0.0 {
                return Err(EngineError::InvalidMeasurement(format!(
                    "height must not be negative (got {} ft {} in)",
                    feet, inches
                )));
            }
            let total_inches = feet * INCHES_PER_FOOT + inches;
            ensure_positive("height", total_inches)?;
            Ok(inches_to_meters(total_inches))
        }
        Height::Inches(inches) => {
            ensure_positive("height", inches)?;
            Ok(inches_to_meters(inches))
        }
    }
}

/// Convert a weight to kilograms
pub fn weight_to_kg(weight: &Weight) -> Result<f64, EngineError> {
    match *weight {
        Weight::Kilograms(kg) => {
            ensure_positive("weight", kg)?;
            Ok(kg)
        }
        Weight::Pounds(lbs) => {
            ensure_positive("weight", lbs)?;
            Ok(pounds_to_kg(lbs))
        }
    }
}

pub fn pounds_to_kg(lbs: f64) -> f64 {
    lbs * KG_PER_POUND
}

pub fn kg_to_pounds(kg: f64) -> f64 {
    kg / KG_PER_POUND
}

pub fn inches_to_meters(inches: f64) -> f64 {
    inches * METERS_PER_INCH
}

pub fn meters_to_inches(meters: f64) -> f64 {
    meters / METERS_PER_INCH
}

pub fn meters_to_centimeters(meters: f64) -> f64 {
    meters * CM_PER_METER
}

/// Express a weight in kilograms in the given unit system
pub fn weight_in(kg: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => kg,
        UnitSystem::Imperial => kg_to_pounds(kg),
    }
}

/// Parse a numeric field as typed into a form
///
/// Surrounding whitespace is ignored. Text that is not a number, or a number
/// that is not strictly positive, yields `InvalidMeasurement` naming the field.
pub fn parse_positive(field: &str, text: &str) -> Result<f64, EngineError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidMeasurement(format!("{} is empty", field)));
    }
    let value: f64 = trimmed.parse().map_err(|_| {
        EngineError::InvalidMeasurement(format!("{} must be a number (got '{}')", field, trimmed))
    })?;
    ensure_positive(field, value)?;
    Ok(value)
}

/// Reject values that cannot describe a real body
///
/// The bounds are the ones the desktop forms applied before calculating.
/// Conversion itself never calls this.
pub fn check_plausible(measurement: &Measurement) -> Result<(), EngineError> {
    match measurement.height {
        Height::Centimeters(cm) if cm < 50.0 => {
            return Err(EngineError::InvalidMeasurement(
                "Height must be at least 50cm".to_string(),
            ))
        }
        Height::Meters(m) if m < 0.5 => {
            return Err(EngineError::InvalidMeasurement(
                "Height must be at least 50cm".to_string(),
            ))
        }
        Height::FeetInches { feet, inches } if feet * INCHES_PER_FOOT + inches < 20.0 => {
            return Err(EngineError::InvalidMeasurement("Height too low".to_string()))
        }
        Height::Inches(inches) if inches < 20.0 => {
            return Err(EngineError::InvalidMeasurement("Height too low".to_string()))
        }
        _ => {}
    }

    match measurement.weight {
        Weight::Kilograms(kg) if kg < 10.0 => Err(EngineError::InvalidMeasurement(
            "Weight must be at least 10kg".to_string(),
        )),
        Weight::Pounds(lbs) if lbs < 20.0 => Err(EngineError::InvalidMeasurement(
            "Weight must be at least 20lbs".to_string(),
        )),
        _ => Ok(()),
    }
}

fn ensure_positive(field: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        tracing::debug!(field, value, "rejected non-positive measurement");
        Err(EngineError::InvalidMeasurement(format!(
            "{} must be a positive number (got {})",
            field, value
        )))
    }
}
