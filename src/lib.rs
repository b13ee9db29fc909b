//! BMI Engine - pure Body Mass Index computation and classification
//!
//! The engine turns a height/weight reading into a BMI result through a
//! deterministic sequence of stages: unit conversion → BMI formula →
//! classification → ideal weight range → presentation lookup.
//!
//! ## Modules
//!
//! - **Engine**: unit conversion, BMI, classification policies, tips and colors
//! - **History**: person-keyed calculation history with CSV and text export
//! - **FFI**: C ABI for desktop front ends written in other languages

pub mod bmi;
pub mod classify;
pub mod engine;
pub mod error;
pub mod export;
pub mod history;
pub mod presentation;
pub mod types;
pub mod units;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use bmi::{compute_bmi, ideal_weight_range_kg, round_to_tenth};
pub use classify::{classify, policy_for_age, AdultDetail};
pub use engine::{calculate, BmiEngine, EngineConfig, RoundingOrder};
pub use error::EngineError;
pub use history::{History, HistoryEntry};
pub use presentation::{lookup_presentation, personalized_tips};
pub use types::{
    ActivityLevel, BmiResult, CategoryTag, ClassificationPolicy, Gender, Height, Measurement,
    NormalizedMeasurement, Profile, ProfileDraft, UnitSystem, Weight,
};
pub use units::to_metric;

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
