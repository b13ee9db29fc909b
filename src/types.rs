//! Core types for the BMI engine
//!
//! This module defines the values that flow through each stage of a calculation:
//! raw measurements, normalized measurements, category tags and the final result.
//! Every type here is an immutable value; the engine keeps no state of its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Height as entered by the user, in one of the supported units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value")]
pub enum Height {
    #[serde(rename = "cm")]
    Centimeters(f64),
    #[serde(rename = "m")]
    Meters(f64),
    #[serde(rename = "ft_in")]
    FeetInches { feet: f64, inches: f64 },
    #[serde(rename = "in")]
    Inches(f64),
}

impl Height {
    /// Unit system the height was entered in
    pub fn unit_system(&self) -> UnitSystem {
        match self {
            Height::Centimeters(_) | Height::Meters(_) => UnitSystem::Metric,
            Height::FeetInches { .. } | Height::Inches(_) => UnitSystem::Imperial,
        }
    }
}

/// Weight as entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value")]
pub enum Weight {
    #[serde(rename = "kg")]
    Kilograms(f64),
    #[serde(rename = "lbs")]
    Pounds(f64),
}

impl Weight {
    pub fn unit_system(&self) -> UnitSystem {
        match self {
            Weight::Kilograms(_) => UnitSystem::Metric,
            Weight::Pounds(_) => UnitSystem::Imperial,
        }
    }
}

/// A single height/weight reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub height: Height,
    pub weight: Weight,
}

impl Measurement {
    pub fn new(height: Height, weight: Weight) -> Self {
        Self { height, weight }
    }

    /// Metric reading from centimeters and kilograms
    pub fn metric(height_cm: f64, weight_kg: f64) -> Self {
        Self::new(Height::Centimeters(height_cm), Weight::Kilograms(weight_kg))
    }

    /// Imperial reading from total inches and pounds
    pub fn imperial(height_in: f64, weight_lbs: f64) -> Self {
        Self::new(Height::Inches(height_in), Weight::Pounds(weight_lbs))
    }
}

/// Measurement converted to meters and kilograms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMeasurement {
    pub height_meters: f64,
    pub weight_kg: f64,
}

/// Unit system used for input and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "Metric",
            UnitSystem::Imperial => "Imperial",
        }
    }

    /// Unit label for weights displayed in this system
    pub fn weight_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lbs",
        }
    }
}

/// Classification scheme applied to a BMI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPolicy {
    /// Four adult bands, unit-agnostic
    SimpleAdult,
    /// Seven adult bands including obesity classes
    ExtendedAdult,
    /// Four bands for people under 18
    Child,
}

impl ClassificationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationPolicy::SimpleAdult => "simple_adult",
            ClassificationPolicy::ExtendedAdult => "extended_adult",
            ClassificationPolicy::Child => "child",
        }
    }
}

impl FromStr for ClassificationPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "simple_adult" => Ok(ClassificationPolicy::SimpleAdult),
            "extended" | "extended_adult" => Ok(ClassificationPolicy::ExtendedAdult),
            "child" => Ok(ClassificationPolicy::Child),
            other => Err(EngineError::ParseError(format!(
                "unknown classification policy '{}'",
                other
            ))),
        }
    }
}

/// Four-band adult category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obese,
}

impl SimpleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            SimpleCategory::Underweight => "Underweight",
            SimpleCategory::NormalWeight => "Normal weight",
            SimpleCategory::Overweight => "Overweight",
            SimpleCategory::Obese => "Obese",
        }
    }
}

/// Seven-band adult category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedCategory {
    SeverelyUnderweight,
    Underweight,
    NormalWeight,
    Overweight,
    ObesityClassI,
    ObesityClassII,
    ObesityClassIII,
}

impl ExtendedCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExtendedCategory::SeverelyUnderweight => "Severely Underweight",
            ExtendedCategory::Underweight => "Underweight",
            ExtendedCategory::NormalWeight => "Normal Weight",
            ExtendedCategory::Overweight => "Overweight",
            ExtendedCategory::ObesityClassI => "Obesity Class I",
            ExtendedCategory::ObesityClassII => "Obesity Class II",
            ExtendedCategory::ObesityClassIII => "Obesity Class III",
        }
    }
}

/// Child category (thresholds are on a percentile-like scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildCategory {
    Underweight,
    HealthyWeight,
    Overweight,
    Obese,
}

impl ChildCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ChildCategory::Underweight => "Underweight (Child)",
            ChildCategory::HealthyWeight => "Healthy Weight (Child)",
            ChildCategory::Overweight => "Overweight (Child)",
            ChildCategory::Obese => "Obese (Child)",
        }
    }
}

/// Category produced by one of the classification policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTag {
    Simple(SimpleCategory),
    Extended(ExtendedCategory),
    Child(ChildCategory),
}

impl CategoryTag {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CategoryTag::Simple(c) => c.label(),
            CategoryTag::Extended(c) => c.label(),
            CategoryTag::Child(c) => c.label(),
        }
    }

    /// Policy that produced this tag
    pub fn policy(&self) -> ClassificationPolicy {
        match self {
            CategoryTag::Simple(_) => ClassificationPolicy::SimpleAdult,
            CategoryTag::Extended(_) => ClassificationPolicy::ExtendedAdult,
            CategoryTag::Child(_) => ClassificationPolicy::Child,
        }
    }

    /// Collapse any tag onto the four simple bands
    pub fn simple_band(&self) -> SimpleCategory {
        match *self {
            CategoryTag::Simple(c) => c,
            CategoryTag::Extended(c) => match c {
                ExtendedCategory::SeverelyUnderweight | ExtendedCategory::Underweight => {
                    SimpleCategory::Underweight
                }
                ExtendedCategory::NormalWeight => SimpleCategory::NormalWeight,
                ExtendedCategory::Overweight => SimpleCategory::Overweight,
                ExtendedCategory::ObesityClassI
                | ExtendedCategory::ObesityClassII
                | ExtendedCategory::ObesityClassIII => SimpleCategory::Obese,
            },
            CategoryTag::Child(c) => match c {
                ChildCategory::Underweight => SimpleCategory::Underweight,
                ChildCategory::HealthyWeight => SimpleCategory::NormalWeight,
                ChildCategory::Overweight => SimpleCategory::Overweight,
                ChildCategory::Obese => SimpleCategory::Obese,
            },
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display color associated with a category band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Blue,
    Green,
    Orange,
    Red,
}

impl ColorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTag::Blue => "blue",
            ColorTag::Green => "green",
            ColorTag::Orange => "orange",
            ColorTag::Red => "red",
        }
    }

    /// RGB triple of the result label in the profile-tracking desktop app
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorTag::Blue => (0, 0, 255),
            ColorTag::Green => (0, 128, 0),
            ColorTag::Orange => (255, 165, 0),
            ColorTag::Red => (255, 0, 0),
        }
    }
}

/// Color and tip text for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub color: ColorTag,
    pub tip: &'static str,
}

/// Weight interval keeping BMI within [18.5, 24.9]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealWeightRange {
    pub min: f64,
    pub max: f64,
}

/// Result of a single BMI calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BmiResult {
    /// BMI rounded to one decimal place
    pub bmi: f64,
    /// Unrounded BMI
    pub bmi_exact: f64,
    pub category: CategoryTag,
    pub category_label: &'static str,
    pub normalized: NormalizedMeasurement,
    pub ideal_weight_range_kg: IdealWeightRange,
    pub presentation: Presentation,
}

/// Gender as recorded alongside a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(EngineError::ParseError(format!("unknown gender '{}'", other))),
        }
    }
}

/// Self-reported activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtraActive,
    ];

    /// Full label as shown in the selection list
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary (little or no exercise)",
            ActivityLevel::LightlyActive => "Lightly Active (light exercise 1-3 days/week)",
            ActivityLevel::ModeratelyActive => {
                "Moderately Active (moderate exercise 3-5 days/week)"
            }
            ActivityLevel::VeryActive => "Very Active (hard exercise 6-7 days/week)",
            ActivityLevel::ExtraActive => "Extra Active (very hard exercise & physical job)",
        }
    }

    /// Label without the parenthesized description
    pub fn short_label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::LightlyActive => "Lightly Active",
            ActivityLevel::ModeratelyActive => "Moderately Active",
            ActivityLevel::VeryActive => "Very Active",
            ActivityLevel::ExtraActive => "Extra Active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        ActivityLevel::ALL
            .iter()
            .copied()
            .find(|level| {
                level.short_label().to_ascii_lowercase() == wanted
                    || level.label().to_ascii_lowercase() == wanted
            })
            .ok_or_else(|| EngineError::ParseError(format!("unknown activity level '{}'", s)))
    }
}

/// Person details recorded with each history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub activity: ActivityLevel,
}

/// Partially filled profile as collected from a form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub activity: Option<ActivityLevel>,
}

impl ProfileDraft {
    /// Validate the draft, reporting the first missing field in form order
    pub fn finish(self) -> Result<Profile, EngineError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| EngineError::MissingField("name".to_string()))?;
        let age = self
            .age
            .ok_or_else(|| EngineError::MissingField("age".to_string()))?;
        let gender = self
            .gender
            .ok_or_else(|| EngineError::MissingField("gender".to_string()))?;
        let activity = self
            .activity
            .ok_or_else(|| EngineError::MissingField("activity".to_string()))?;

        Ok(Profile {
            name,
            age,
            gender,
            activity,
        })
    }
}
