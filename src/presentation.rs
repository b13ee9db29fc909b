//! Color and tip lookup
//!
//! Static tables keyed by the simple band of a category. Extended and child
//! tags reach these tables through [`CategoryTag::simple_band`].

use crate::types::{CategoryTag, ColorTag, Presentation, SimpleCategory};

const GENERAL_ADVICE: &str =
    "General:\n- Drink water\n- Sleep 7-9 hours\n- Manage stress";

/// Color and one-line tip for a category
pub fn lookup_presentation(category: CategoryTag) -> Presentation {
    match category.simple_band() {
        SimpleCategory::Underweight => Presentation {
            color: ColorTag::Blue,
            tip: "You are below the usual range. Consider increasing healthy calories and building strength.",
        },
        SimpleCategory::NormalWeight => Presentation {
            color: ColorTag::Green,
            tip: "You are in the recommended range. Maintain it with a balanced diet and regular activity.",
        },
        SimpleCategory::Overweight => Presentation {
            color: ColorTag::Orange,
            tip: "You are above the usual range. Small, steady changes in food and movement can help.",
        },
        SimpleCategory::Obese => Presentation {
            color: ColorTag::Red,
            tip: "You are well above the usual range. Talk to a doctor for a safe, personal health plan.",
        },
    }
}

/// Longer advice blocks: one for the band, then general advice
pub fn personalized_tips(category: CategoryTag) -> Vec<&'static str> {
    let band_advice = match category.simple_band() {
        SimpleCategory::Underweight => {
            "Weight Gain Tips:\n- Eat 5-6 small meals\n- Add healthy fats & protein\n- Strength train"
        }
        SimpleCategory::NormalWeight => {
            "Maintenance:\n- Maintain balanced diet\n- Regular exercise\n- Hydration"
        }
        SimpleCategory::Overweight | SimpleCategory::Obese => {
            "Weight Loss Tips:\n- Caloric deficit\n- Increase veggies & fiber\n- Cardio & weights"
        }
    };

    vec![band_advice, GENERAL_ADVICE]
}

/// Legend of the simple bands
pub fn band_reference() -> &'static str {
    "Underweight: < 18.5\nNormal weight: 18.5 - 24.9\nOverweight: 25 - 29.9\nObesity: >= 30"
}
