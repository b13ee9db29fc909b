//! Calculation history
//!
//! This module keeps an append-only record of calculations, keyed by person.
//! Insertion order is chronological order. Entries are never edited; the only
//! removal is [`History::clear`].

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bmi::round_to_tenth;
use crate::error::EngineError;
use crate::types::{ActivityLevel, BmiResult, CategoryTag, Gender, Profile};
use crate::units::meters_to_centimeters;

/// Timestamp format used for history dates
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Number of entries shown by the recent-history view
pub const RECENT_LIMIT: usize = 50;

/// A single recorded calculation (stored in metric)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local time, minute precision
    pub recorded_at: NaiveDateTime,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub activity: ActivityLevel,
    /// Height in centimeters, one decimal
    pub height_cm: f64,
    /// Weight in kilograms, one decimal
    pub weight_kg: f64,
    /// BMI, one decimal
    pub bmi: f64,
    pub category: CategoryTag,
}

impl HistoryEntry {
    /// Build an entry from a profile and a fresh result
    pub fn new<Tz: TimeZone>(profile: &Profile, result: &BmiResult, at: DateTime<Tz>) -> Self {
        let local = at.naive_local();
        Self {
            recorded_at: truncate_to_minute(local),
            name: profile.name.clone(),
            age: profile.age,
            gender: profile.gender,
            activity: profile.activity,
            height_cm: round_to_tenth(meters_to_centimeters(result.normalized.height_meters)),
            weight_kg: round_to_tenth(result.normalized.weight_kg),
            bmi: result.bmi,
            category: result.category,
        }
    }

    pub fn date_string(&self) -> String {
        self.recorded_at.format(DATE_FORMAT).to_string()
    }
}

/// Point of a per-person BMI trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub recorded_at: NaiveDateTime,
    pub bmi: f64,
}

/// Append-only history of calculations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Positions into `entries`, per person
    #[serde(skip)]
    by_person: BTreeMap<String, Vec<usize>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a calculation now
    pub fn record(&mut self, profile: &Profile, result: &BmiResult) -> &HistoryEntry {
        self.record_at(profile, result, Local::now())
    }

    /// Record a calculation with an explicit timestamp
    pub fn record_at<Tz: TimeZone>(
        &mut self,
        profile: &Profile,
        result: &BmiResult,
        at: DateTime<Tz>,
    ) -> &HistoryEntry {
        self.push(HistoryEntry::new(profile, result, at))
    }

    /// Append an already-built entry
    pub fn push(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        let index = self.entries.len();
        self.by_person
            .entry(entry.name.clone())
            .or_default()
            .push(index);
        tracing::info!(
            name = %entry.name,
            bmi = entry.bmi,
            category = entry.category.label(),
            "recorded history entry"
        );
        self.entries.push(entry);
        &self.entries[index]
    }

    /// Remove every entry and every person
    pub fn clear(&mut self) {
        tracing::info!(removed = self.entries.len(), "cleared history");
        self.entries.clear();
        self.by_person.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in chronological order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The last [`RECENT_LIMIT`] entries
    pub fn recent(&self) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(RECENT_LIMIT);
        &self.entries[start..]
    }

    /// Entries for one person in chronological order
    pub fn entries_for(&self, name: &str) -> Vec<&HistoryEntry> {
        self.by_person
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Person names, sorted
    pub fn persons(&self) -> Vec<&str> {
        self.by_person.keys().map(String::as_str).collect()
    }

    /// BMI series for one person, or for everyone when `name` is `None`
    ///
    /// An unknown name falls back to the full series.
    pub fn trend(&self, name: Option<&str>) -> Vec<TrendPoint> {
        let to_point = |e: &HistoryEntry| TrendPoint {
            recorded_at: e.recorded_at,
            bmi: e.bmi,
        };

        match name.and_then(|n| self.by_person.get(n)) {
            Some(indices) => indices.iter().map(|&i| to_point(&self.entries[i])).collect(),
            None => self.entries.iter().map(to_point).collect(),
        }
    }

    /// Load history from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let mut history: History = serde_json::from_str(json)?;
        history.reindex();
        Ok(history)
    }

    /// Serialize history to JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    fn reindex(&mut self) {
        self.by_person.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            self.by_person
                .entry(entry.name.clone())
                .or_default()
                .push(index);
        }
    }
}

fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::calculate;
    use crate::types::Measurement;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    pub(crate) fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            age: 34,
            gender: Gender::Female,
            activity: ActivityLevel::ModeratelyActive,
        }
    }

    pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 15, 42)
            .unwrap();
        Utc.from_utc_datetime(&naive)
    }

    pub(crate) fn sample_history() -> History {
        let mut history = History::new();
        let r1 = calculate(&Measurement::metric(180.0, 75.0), None).unwrap();
        let r2 = calculate(&Measurement::metric(165.0, 45.0), None).unwrap();
        let r3 = calculate(&Measurement::metric(180.0, 80.0), None).unwrap();
        history.record_at(&profile("Ada"), &r1, at(1, 9));
        history.record_at(&profile("Ben"), &r2, at(2, 10));
        history.record_at(&profile("Ada"), &r3, at(3, 11));
        history
    }

    #[test]
    fn test_entry_fields_are_rounded_metric() {
        let history = sample_history();
        let first = &history.entries()[0];
        assert_eq!(first.date_string(), "2025-03-01 09:15");
        assert_eq!(first.height_cm, 180.0);
        assert_eq!(first.weight_kg, 75.0);
        assert_eq!(first.bmi, 23.1);
        assert_eq!(first.category.label(), "Normal weight");
    }

    #[test]
    fn test_imperial_entry_stored_in_metric() {
        let mut history = History::new();
        let result = calculate(&Measurement::imperial(70.0, 200.0), None).unwrap();
        let entry = history.record_at(&profile("Cy"), &result, at(4, 8));
        assert_eq!(entry.height_cm, 177.8);
        assert_eq!(entry.weight_kg, 90.7);
    }

    #[test]
    fn test_person_index_and_order() {
        let history = sample_history();
        assert_eq!(history.persons(), vec!["Ada", "Ben"]);

        let ada = history.entries_for("Ada");
        assert_eq!(ada.len(), 2);
        assert!(ada[0].recorded_at < ada[1].recorded_at);
        assert!(history.entries_for("Nobody").is_empty());
    }

    #[test]
    fn test_trend() {
        let history = sample_history();
        let ada: Vec<f64> = history.trend(Some("Ada")).iter().map(|p| p.bmi).collect();
        assert_eq!(ada, vec![23.1, 24.7]);

        assert_eq!(history.trend(None).len(), 3);
        assert_eq!(history.trend(Some("Nobody")).len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut history = sample_history();
        history.clear();
        assert!(history.is_empty());
        assert!(history.persons().is_empty());
        assert!(history.trend(None).is_empty());
    }

    #[test]
    fn test_recent_limit() {
        let mut history = History::new();
        let result = calculate(&Measurement::metric(170.0, 65.0), None).unwrap();
        for i in 0..(RECENT_LIMIT + 5) {
            history.record_at(&profile(&format!("p{}", i)), &result, at(1, 9));
        }
        assert_eq!(history.recent().len(), RECENT_LIMIT);
        assert_eq!(history.recent()[0].name, "p5");
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let history = sample_history();
        let json = history.to_json().unwrap();
        let loaded = History::from_json(&json).unwrap();

        assert_eq!(loaded.entries(), history.entries());
        assert_eq!(loaded.persons(), vec!["Ada", "Ben"]);
        assert_eq!(loaded.entries_for("Ada").len(), 2);
    }
}
