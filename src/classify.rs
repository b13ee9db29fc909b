//! Category classification
//!
//! Three band tables are supported, selected explicitly by [`ClassificationPolicy`]:
//! - Simple adult: four bands
//! - Extended adult: seven bands including obesity classes
//! - Child: four bands on a percentile-like scale (`< 5`, `< 85`, `< 95`)
//!
//! Every band is half-open `[lower, upper)`: a value exactly on a boundary
//! belongs to the upper band.

use serde::{Deserialize, Serialize};

use crate::types::{
    CategoryTag, ChildCategory, ClassificationPolicy, ExtendedCategory, SimpleCategory,
};

/// Age from which adult tables apply
pub const ADULT_AGE: u32 = 18;

const SIMPLE_BANDS: [(f64, SimpleCategory); 3] = [
    (18.5, SimpleCategory::Underweight),
    (25.0, SimpleCategory::NormalWeight),
    (30.0, SimpleCategory::Overweight),
];

const EXTENDED_BANDS: [(f64, ExtendedCategory); 6] = [
    (16.0, ExtendedCategory::SeverelyUnderweight),
    (18.5, ExtendedCategory::Underweight),
    (25.0, ExtendedCategory::NormalWeight),
    (30.0, ExtendedCategory::Overweight),
    (35.0, ExtendedCategory::ObesityClassI),
    (40.0, ExtendedCategory::ObesityClassII),
];

// Percentile-style cut-offs, kept as the desktop variant applied them to raw BMI.
const CHILD_BANDS: [(f64, ChildCategory); 3] = [
    (5.0, ChildCategory::Underweight),
    (85.0, ChildCategory::HealthyWeight),
    (95.0, ChildCategory::Overweight),
];

/// How much detail the adult classification should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdultDetail {
    #[default]
    Simple,
    Extended,
}

impl AdultDetail {
    pub fn policy(&self) -> ClassificationPolicy {
        match self {
            AdultDetail::Simple => ClassificationPolicy::SimpleAdult,
            AdultDetail::Extended => ClassificationPolicy::ExtendedAdult,
        }
    }
}

/// Classify a BMI value under the given policy
///
/// `age` is accepted for callers that track it but the caller's policy is
/// trusted; use [`policy_for_age`] to derive a policy from an age.
pub fn classify(bmi: f64, age: Option<u32>, policy: ClassificationPolicy) -> CategoryTag {
    if let Some(age) = age {
        if age < ADULT_AGE && policy != ClassificationPolicy::Child {
            tracing::debug!(age, policy = policy.as_str(), "adult policy applied to a minor");
        }
    }

    match policy {
        ClassificationPolicy::SimpleAdult => {
            CategoryTag::Simple(lookup(bmi, &SIMPLE_BANDS, SimpleCategory::Obese))
        }
        ClassificationPolicy::ExtendedAdult => CategoryTag::Extended(lookup(
            bmi,
            &EXTENDED_BANDS,
            ExtendedCategory::ObesityClassIII,
        )),
        ClassificationPolicy::Child => {
            CategoryTag::Child(lookup(bmi, &CHILD_BANDS, ChildCategory::Obese))
        }
    }
}

/// Pick a policy from age: children below [`ADULT_AGE`], adults by `detail`
///
/// An unknown age is treated as adult.
pub fn policy_for_age(age: Option<u32>, detail: AdultDetail) -> ClassificationPolicy {
    match age {
        Some(age) if age < ADULT_AGE => ClassificationPolicy::Child,
        _ => detail.policy(),
    }
}

/// Lower bound of every band of a policy paired with its label, lowest first
pub fn band_table(policy: ClassificationPolicy) -> Vec<(Option<f64>, &'static str)> {
    fn rows<T: Copy>(
        bands: &[(f64, T)],
        top: T,
        label: fn(&T) -> &'static str,
    ) -> Vec<(Option<f64>, &'static str)> {
        let mut lower = None;
        let mut out = Vec::with_capacity(bands.len() + 1);
        for (upper, category) in bands {
            out.push((lower, label(category)));
            lower = Some(*upper);
        }
        out.push((lower, label(&top)));
        out
    }

    match policy {
        ClassificationPolicy::SimpleAdult => {
            rows(&SIMPLE_BANDS, SimpleCategory::Obese, SimpleCategory::label)
        }
        ClassificationPolicy::ExtendedAdult => rows(
            &EXTENDED_BANDS,
            ExtendedCategory::ObesityClassIII,
            ExtendedCategory::label,
        ),
        ClassificationPolicy::Child => rows(&CHILD_BANDS, ChildCategory::Obese, ChildCategory::label),
    }
}

fn lookup<T: Copy>(bmi: f64, bands: &[(f64, T)], top: T) -> T {
    bands
        .iter()
        .find(|(upper, _)| bmi < *upper)
        .map(|(_, category)| *category)
        .unwrap_or(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simple(bmi: f64) -> &'static str {
        classify(bmi, None, ClassificationPolicy::SimpleAdult).label()
    }

    fn extended(bmi: f64) -> &'static str {
        classify(bmi, Some(30), ClassificationPolicy::ExtendedAdult).label()
    }

    #[test]
    fn test_simple_boundaries() {
        assert_eq!(simple(18.49), "Underweight");
        assert_eq!(simple(18.5), "Normal weight");
        assert_eq!(simple(24.999), "Normal weight");
        assert_eq!(simple(25.0), "Overweight");
        assert_eq!(simple(29.99), "Overweight");
        assert_eq!(simple(30.0), "Obese");
        assert_eq!(simple(55.0), "Obese");
        assert_eq!(simple(0.1), "Underweight");
    }

    #[test]
    fn test_extended_boundaries() {
        assert_eq!(extended(15.9), "Severely Underweight");
        assert_eq!(extended(16.0), "Underweight");
        assert_eq!(extended(16.53), "Underweight");
        assert_eq!(extended(18.5), "Normal Weight");
        assert_eq!(extended(25.0), "Overweight");
        assert_eq!(extended(30.0), "Obesity Class I");
        assert_eq!(extended(35.0), "Obesity Class II");
        assert_eq!(extended(40.0), "Obesity Class III");
    }

    #[test]
    fn test_child_bands_are_literal() {
        let child = |bmi| classify(bmi, Some(12), ClassificationPolicy::Child);
        assert_eq!(child(4.9), CategoryTag::Child(ChildCategory::Underweight));
        assert_eq!(child(5.0), CategoryTag::Child(ChildCategory::HealthyWeight));
        // A typical child BMI lands in the healthy band under these cut-offs
        assert_eq!(child(31.0), CategoryTag::Child(ChildCategory::HealthyWeight));
        assert_eq!(child(85.0), CategoryTag::Child(ChildCategory::Overweight));
        assert_eq!(child(95.0), CategoryTag::Child(ChildCategory::Obese));
    }

    #[test]
    fn test_policy_for_age() {
        assert_eq!(
            policy_for_age(Some(17), AdultDetail::Extended),
            ClassificationPolicy::Child
        );
        assert_eq!(
            policy_for_age(Some(18), AdultDetail::Extended),
            ClassificationPolicy::ExtendedAdult
        );
        assert_eq!(
            policy_for_age(None, AdultDetail::Simple),
            ClassificationPolicy::SimpleAdult
        );
    }

    #[test]
    fn test_band_table() {
        let table = band_table(ClassificationPolicy::SimpleAdult);
        assert_eq!(
            table,
            vec![
                (None, "Underweight"),
                (Some(18.5), "Normal weight"),
                (Some(25.0), "Overweight"),
                (Some(30.0), "Obese"),
            ]
        );
        assert_eq!(band_table(ClassificationPolicy::ExtendedAdult).len(), 7);
        assert_eq!(
            band_table(ClassificationPolicy::Child).last(),
            Some(&(Some(95.0), "Obese (Child)"))
        );
    }
}
