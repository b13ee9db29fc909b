//! History export
//!
//! Writers take the history by shared reference, so a failed export can never
//! touch the in-memory entries.
//! - CSV: one record per calculation, canonical column set
//! - Text report: the same fields as an aligned plain-text dump
//! - History log: one comma-separated line appended per calculation

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::bmi::round_to_tenth;
use crate::error::EngineError;
use crate::history::{History, HistoryEntry};
use crate::types::{Height, Measurement, Weight};
use crate::units::meters_to_centimeters;

/// Column order of the CSV export
pub const CSV_COLUMNS: [&str; 9] = [
    "date",
    "name",
    "age",
    "gender",
    "activity",
    "height_cm",
    "weight_kg",
    "bmi",
    "category",
];

#[derive(Serialize)]
struct CsvRecord<'a> {
    date: String,
    name: &'a str,
    age: u32,
    gender: &'static str,
    activity: &'static str,
    height_cm: f64,
    weight_kg: f64,
    bmi: f64,
    category: &'static str,
}

impl<'a> From<&'a HistoryEntry> for CsvRecord<'a> {
    fn from(entry: &'a HistoryEntry) -> Self {
        Self {
            date: entry.date_string(),
            name: &entry.name,
            age: entry.age,
            gender: entry.gender.as_str(),
            activity: entry.activity.short_label(),
            height_cm: entry.height_cm,
            weight_kg: entry.weight_kg,
            bmi: entry.bmi,
            category: entry.category.label(),
        }
    }
}

/// Write the history as CSV, header first
pub fn write_csv<W: Write>(history: &History, writer: W) -> Result<(), EngineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if history.is_empty() {
        csv_writer.write_record(CSV_COLUMNS)?;
    }
    for entry in history.entries() {
        csv_writer.serialize(CsvRecord::from(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render the history as a CSV string
pub fn to_csv_string(history: &History) -> Result<String, EngineError> {
    let mut buffer = Vec::new();
    write_csv(history, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| EngineError::ParseError(e.to_string()))
}

/// Export the history to a CSV file, replacing any existing file
pub fn export_csv_file(history: &History, path: &Path) -> Result<(), EngineError> {
    let csv = to_csv_string(history)?;
    fs::write(path, csv)?;
    tracing::info!(path = %path.display(), entries = history.len(), "exported csv");
    Ok(())
}

/// Render the history as a plain-text report
pub fn text_report(history: &History) -> String {
    let mut out = String::new();
    out.push_str("BMI History Report\n");
    out.push_str("==================\n");
    out.push_str(&format!("Entries: {}\n", history.len()));

    for entry in history.entries() {
        out.push('\n');
        out.push_str(&format!("Date:     {}\n", entry.date_string()));
        out.push_str(&format!("Name:     {}\n", entry.name));
        out.push_str(&format!("Age:      {}\n", entry.age));
        out.push_str(&format!("Gender:   {}\n", entry.gender.as_str()));
        out.push_str(&format!("Activity: {}\n", entry.activity.short_label()));
        out.push_str(&format!("Height:   {:.1} cm\n", entry.height_cm));
        out.push_str(&format!("Weight:   {:.1} kg\n", entry.weight_kg));
        out.push_str(&format!("BMI:      {:.1}\n", entry.bmi));
        out.push_str(&format!("Category: {}\n", entry.category.label()));
    }

    out
}

/// Export the text report to a file, replacing any existing file
pub fn export_text_file(history: &History, path: &Path) -> Result<(), EngineError> {
    fs::write(path, text_report(history))?;
    tracing::info!(path = %path.display(), entries = history.len(), "exported text report");
    Ok(())
}

/// One history-log line: height text, weight text, unit mode, BMI, category
pub fn history_log_line(
    height_text: &str,
    weight_text: &str,
    unit_mode: &str,
    bmi: f64,
    category: &str,
) -> String {
    format!(
        "{},{},{},{:.1},{}\n",
        height_text.trim(),
        weight_text.trim(),
        unit_mode,
        bmi,
        category
    )
}

/// History-log line for a parsed measurement
///
/// Meters are logged as centimeters and feet/inches as `5'10`, so every height
/// reads back unambiguously under its unit mode.
pub fn measurement_log_line(measurement: &Measurement, bmi: f64, category: &str) -> String {
    history_log_line(
        &height_text(&measurement.height),
        &weight_text(&measurement.weight),
        &unit_mode(measurement),
        bmi,
        category,
    )
}

/// `Metric` or `Imperial`, or `height/weight` systems when they differ
pub fn unit_mode(measurement: &Measurement) -> String {
    let height_units = measurement.height.unit_system();
    let weight_units = measurement.weight.unit_system();
    if height_units == weight_units {
        height_units.as_str().to_string()
    } else {
        format!("{}/{}", height_units.as_str(), weight_units.as_str())
    }
}

fn height_text(height: &Height) -> String {
    match *height {
        Height::Centimeters(cm) => cm.to_string(),
        Height::Meters(m) => round_to_tenth(meters_to_centimeters(m)).to_string(),
        Height::FeetInches { feet, inches } => format!("{}'{}", feet, inches),
        Height::Inches(inches) => inches.to_string(),
    }
}

fn weight_text(weight: &Weight) -> String {
    match *weight {
        Weight::Kilograms(value) | Weight::Pounds(value) => value.to_string(),
    }
}

/// Append one line to a history log, creating the file if needed
pub fn append_history_log(path: &Path, line: &str) -> Result<(), EngineError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    tracing::debug!(path = %path.display(), "appended history log line");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::sample_history;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bmi-engine-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv_string(&sample_history()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "date,name,age,gender,activity,height_cm,weight_kg,bmi,category"
        );
        assert_eq!(
            lines[1],
            "2025-03-01 09:15,Ada,34,Female,Moderately Active,180.0,75.0,23.1,Normal weight"
        );
        assert!(lines[2].starts_with("2025-03-02 10:15,Ben,"));
        assert!(lines[2].ends_with(",16.5,Underweight"));
    }

    #[test]
    fn test_csv_empty_history_has_header() {
        let csv = to_csv_string(&History::new()).unwrap();
        assert_eq!(csv.trim_end(), CSV_COLUMNS.join(","));
    }

    #[test]
    fn test_text_report() {
        let report = text_report(&sample_history());
        assert!(report.starts_with("BMI History Report\n"));
        assert!(report.contains("Entries: 3\n"));
        assert!(report.contains("Name:     Ben\n"));
        assert!(report.contains("Category: Underweight\n"));
    }

    #[test]
    fn test_history_log_line() {
        let line = history_log_line(" 70 ", "200", "Imperial", 28.6967, "Overweight");
        assert_eq!(line, "70,200,Imperial,28.7,Overweight\n");
    }

    #[test]
    fn test_measurement_log_line_keeps_inches() {
        let m = Measurement::new(
            Height::FeetInches {
                feet: 5.0,
                inches: 10.0,
            },
            Weight::Pounds(200.0),
        );
        assert_eq!(
            measurement_log_line(&m, 28.7, "Overweight"),
            "5'10,200,Imperial,28.7,Overweight\n"
        );
    }

    #[test]
    fn test_measurement_log_line_mixed_units() {
        let m = Measurement::new(Height::Centimeters(180.0), Weight::Pounds(165.0));
        assert_eq!(unit_mode(&m), "Metric/Imperial");
        assert_eq!(
            measurement_log_line(&m, 23.1, "Normal weight"),
            "180,165,Metric/Imperial,23.1,Normal weight\n"
        );

        let meters = Measurement::new(Height::Meters(1.8), Weight::Kilograms(75.0));
        assert_eq!(
            measurement_log_line(&meters, 23.1, "Normal weight"),
            "180,75,Metric,23.1,Normal weight\n"
        );
    }

    #[test]
    fn test_append_history_log() {
        let path = temp_path("log.txt");
        let _ = fs::remove_file(&path);

        append_history_log(&path, "180,75,Metric,23.1,Normal weight\n").unwrap();
        append_history_log(&path, "165,45,Metric,16.5,Underweight\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_failed_export_keeps_history() {
        let history = sample_history();
        let missing_dir = temp_path("missing-dir").join("out.csv");

        let result = export_csv_file(&history, &missing_dir);
        assert!(matches!(result, Err(EngineError::IoError(_))));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_export_files() {
        let history = sample_history();
        let csv_path = temp_path("export.csv");
        let txt_path = temp_path("export.txt");

        export_csv_file(&history, &csv_path).unwrap();
        export_text_file(&history, &txt_path).unwrap();

        assert!(fs::read_to_string(&csv_path).unwrap().starts_with("date,"));
        assert!(fs::read_to_string(&txt_path)
            .unwrap()
            .contains("Entries: 3"));

        let _ = fs::remove_file(&csv_path);
        let _ = fs::remove_file(&txt_path);
    }
}
