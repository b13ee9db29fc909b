//! BMI formula and ideal weight range

use crate::error::EngineError;
use crate::types::{IdealWeightRange, UnitSystem};
use crate::units::weight_in;

/// Lower BMI bound of the ideal weight range
pub const IDEAL_BMI_MIN: f64 = 18.5;

/// Upper BMI bound of the ideal weight range
pub const IDEAL_BMI_MAX: f64 = 24.9;

/// Compute BMI as `weight_kg / height_meters²`
///
/// Both inputs must be finite and strictly positive.
pub fn compute_bmi(height_meters: f64, weight_kg: f64) -> Result<f64, EngineError> {
    if !(height_meters.is_finite() && height_meters > 0.0) {
        return Err(EngineError::InvalidMeasurement(format!(
            "height must be a positive number of meters (got {})",
            height_meters
        )));
    }
    if !(weight_kg.is_finite() && weight_kg > 0.0) {
        return Err(EngineError::InvalidMeasurement(format!(
            "weight must be a positive number of kilograms (got {})",
            weight_kg
        )));
    }

    Ok(weight_kg / (height_meters * height_meters))
}

/// Round to one decimal place, halves away from zero
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Weight range in kilograms that keeps BMI between 18.5 and 24.9
pub fn ideal_weight_range_kg(height_meters: f64) -> Result<IdealWeightRange, EngineError> {
    if !(height_meters.is_finite() && height_meters > 0.0) {
        return Err(EngineError::InvalidMeasurement(format!(
            "height must be a positive number of meters (got {})",
            height_meters
        )));
    }

    let squared = height_meters * height_meters;
    Ok(IdealWeightRange {
        min: IDEAL_BMI_MIN * squared,
        max: IDEAL_BMI_MAX * squared,
    })
}

impl IdealWeightRange {
    /// Range expressed in the given unit system (the stored range is kilograms)
    pub fn in_units(&self, units: UnitSystem) -> IdealWeightRange {
        IdealWeightRange {
            min: weight_in(self.min, units),
            max: weight_in(self.max, units),
        }
    }

    /// Display string such as `56.7 - 76.3 kg`
    pub fn display(&self, units: UnitSystem) -> String {
        let converted = self.in_units(units);
        format!(
            "{:.1} - {:.1} {}",
            converted.min,
            converted.max,
            units.weight_unit()
        )
    }

    pub fn contains(&self, weight_kg: f64) -> bool {
        weight_kg >= self.min && weight_kg <= self.max
    }
}
