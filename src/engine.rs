//! Calculation orchestration
//!
//! This module provides the main entry points of the engine. A calculation runs
//! through fixed stages and produces a fresh, immutable [`BmiResult`].

use serde::{Deserialize, Serialize};

use crate::bmi::{compute_bmi, ideal_weight_range_kg, round_to_tenth};
use crate::classify::{classify, policy_for_age, AdultDetail};
use crate::error::EngineError;
use crate::presentation::lookup_presentation;
use crate::types::{BmiResult, ClassificationPolicy, Measurement, UnitSystem};
use crate::units::to_metric;

/// Which BMI value is compared against the category thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingOrder {
    /// Classify the unrounded value; round only for display
    #[default]
    ClassifyExact,
    /// Round to one decimal (halves away from zero), then classify the rounded value
    ClassifyRounded,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Adult table used when no explicit policy is given
    pub detail: AdultDetail,
    pub rounding: RoundingOrder,
    /// Unit system for display strings
    pub display_units: UnitSystem,
}

impl EngineConfig {
    /// Load config from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Run a calculation with the default configuration.
///
/// # Example
/// ```
/// use bmi_engine::{calculate, Measurement};
///
/// let result = calculate(&Measurement::metric(180.0, 75.0), None).unwrap();
/// assert_eq!(result.bmi, 23.1);
/// assert_eq!(result.category_label, "Normal weight");
/// ```
pub fn calculate(measurement: &Measurement, age: Option<u32>) -> Result<BmiResult, EngineError> {
    BmiEngine::default().calculate(measurement, age)
}

/// Stateless calculator carrying a fixed configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct BmiEngine {
    config: EngineConfig,
}

impl BmiEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calculate BMI, choosing the policy from age and the configured detail
    pub fn calculate(
        &self,
        measurement: &Measurement,
        age: Option<u32>,
    ) -> Result<BmiResult, EngineError> {
        let policy = policy_for_age(age, self.config.detail);
        self.calculate_with_policy(measurement, age, policy)
    }

    /// Calculate BMI under an explicit policy.
    ///
    /// Stages:
    /// 1. Convert to meters and kilograms
    /// 2. Compute BMI
    /// 3. Classify (on the exact or rounded value, per config)
    /// 4. Ideal weight range
    /// 5. Presentation lookup
    pub fn calculate_with_policy(
        &self,
        measurement: &Measurement,
        age: Option<u32>,
        policy: ClassificationPolicy,
    ) -> Result<BmiResult, EngineError> {
        let normalized = to_metric(measurement)?;
        let bmi_exact = compute_bmi(normalized.height_meters, normalized.weight_kg)?;
        let bmi = round_to_tenth(bmi_exact);

        let classified_value = match self.config.rounding {
            RoundingOrder::ClassifyExact => bmi_exact,
            RoundingOrder::ClassifyRounded => bmi,
        };
        let category = classify(classified_value, age, policy);

        let ideal_weight_range_kg = ideal_weight_range_kg(normalized.height_meters)?;
        let presentation = lookup_presentation(category);

        tracing::debug!(
            bmi,
            policy = policy.as_str(),
            category = category.label(),
            "calculated bmi"
        );

        Ok(BmiResult {
            bmi,
            bmi_exact,
            category,
            category_label: category.label(),
            normalized,
            ideal_weight_range_kg,
            presentation,
        })
    }

    /// Ideal weight range of a result, formatted in the configured display units
    pub fn ideal_range_display(&self, result: &BmiResult) -> String {
        result
            .ideal_weight_range_kg
            .display(self.config.display_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorTag, Height, Weight};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metric_scenario() {
        let result = calculate(&Measurement::metric(180.0, 75.0), None).unwrap();
        assert_eq!(result.bmi, 23.1);
        assert!((result.normalized.height_meters - 1.8).abs() < 1e-12);
        assert_eq!(result.category_label, "Normal weight");
        assert_eq!(result.presentation.color, ColorTag::Green);
    }

    #[test]
    fn test_imperial_scenario() {
        let result = calculate(&Measurement::imperial(70.0, 200.0), Some(40)).unwrap();
        assert_eq!(result.bmi, 28.7);
        assert_eq!(result.category_label, "Overweight");
    }

    #[test]
    fn test_underweight_scenario_both_adult_policies() {
        let m = Measurement::metric(165.0, 45.0);
        let engine = BmiEngine::default();

        let simple = engine
            .calculate_with_policy(&m, None, ClassificationPolicy::SimpleAdult)
            .unwrap();
        let extended = engine
            .calculate_with_policy(&m, None, ClassificationPolicy::ExtendedAdult)
            .unwrap();

        assert_eq!(simple.category_label, "Underweight");
        assert_eq!(extended.category_label, "Underweight");
        assert_eq!(simple.bmi, 16.5);
    }

    #[test]
    fn test_age_selects_child_policy() {
        let engine = BmiEngine::new(EngineConfig {
            detail: AdultDetail::Extended,
            ..Default::default()
        });
        let m = Measurement::metric(150.0, 40.0);

        let child = engine.calculate(&m, Some(12)).unwrap();
        assert_eq!(child.category.policy(), ClassificationPolicy::Child);
        assert_eq!(child.category_label, "Healthy Weight (Child)");

        let adult = engine.calculate(&m, Some(35)).unwrap();
        assert_eq!(adult.category.policy(), ClassificationPolicy::ExtendedAdult);
    }

    #[test]
    fn test_rounding_order_changes_boundary_category() {
        // 1.70 m, 53.35 kg -> 18.46..., rounds to 18.5
        let m = Measurement::new(Height::Meters(1.70), Weight::Kilograms(53.35));

        let exact = BmiEngine::default().calculate(&m, None).unwrap();
        assert_eq!(exact.bmi, 18.5);
        assert_eq!(exact.category_label, "Underweight");

        let rounded = BmiEngine::new(EngineConfig {
            rounding: RoundingOrder::ClassifyRounded,
            ..Default::default()
        })
        .calculate(&m, None)
        .unwrap();
        assert_eq!(rounded.category_label, "Normal weight");
    }

    #[test]
    fn test_classify_rounded_rounds_halves_up() {
        // 18.45 sits exactly on a half; it rounds to 18.5, not to the even 18.4
        let m = Measurement::new(Height::Meters(1.0), Weight::Kilograms(18.45));
        let rounded = BmiEngine::new(EngineConfig {
            rounding: RoundingOrder::ClassifyRounded,
            ..Default::default()
        })
        .calculate(&m, None)
        .unwrap();

        assert_eq!(rounded.bmi_exact, 18.45);
        assert_eq!(rounded.bmi, 18.5);
        assert_eq!(rounded.category_label, "Normal weight");

        let exact = BmiEngine::default().calculate(&m, None).unwrap();
        assert_eq!(exact.category_label, "Underweight");
    }

    #[test]
    fn test_invalid_measurement_fails() {
        let err = calculate(&Measurement::metric(0.0, 70.0), None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMeasurement(_)));
        assert!(err.is_validation());

        assert!(calculate(&Measurement::metric(170.0, -70.0), None).is_err());
    }

    #[test]
    fn test_ideal_range_display_units() {
        let m = Measurement::new(Height::Meters(1.75), Weight::Kilograms(70.0));
        let imperial = BmiEngine::new(EngineConfig {
            display_units: UnitSystem::Imperial,
            ..Default::default()
        });
        let result = imperial.calculate(&m, None).unwrap();
        assert_eq!(imperial.ideal_range_display(&result), "124.9 - 168.1 lbs");
        assert!((result.ideal_weight_range_kg.min - 56.65625).abs() < 1e-9);
    }

    #[test]
    fn test_config_json() {
        let config = EngineConfig::from_json(r#"{"detail": "extended"}"#).unwrap();
        assert_eq!(config.detail, AdultDetail::Extended);
        assert_eq!(config.rounding, RoundingOrder::ClassifyExact);
        assert_eq!(config.display_units, UnitSystem::Metric);

        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);

        assert!(EngineConfig::from_json(r#"{"rounding": "sometimes"}"#).is_err());
    }
}
