//! FFI bindings for the BMI engine
//!
//! This module provides C-compatible functions for calling the engine from GUI
//! hosts written in other languages. All functions use C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `bmi_free_string`. History handles are not thread-safe.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::classify::classify;
use crate::engine::{BmiEngine, EngineConfig};
use crate::error::EngineError;
use crate::export::to_csv_string;
use crate::history::History;
use crate::types::{ClassificationPolicy, Measurement, Profile};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Map a C age argument to an optional age (negative means unknown)
fn age_from_c(age: i32) -> Option<u32> {
    u32::try_from(age).ok()
}

/// Return a string result or record the error and return NULL
fn finish(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Calculate BMI for a measurement and return the result as JSON.
///
/// # Safety
/// - `measurement_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL for the default configuration.
/// - `age` < 0 means the age is unknown.
/// - Returns a newly allocated string that must be freed with `bmi_free_string`.
/// - Returns NULL on error; call `bmi_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bmi_calculate(
    measurement_json: *const c_char,
    age: i32,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let measurement_str = match cstr_to_string(measurement_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid measurement string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let config_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match EngineConfig::from_json(&config_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    finish(calculate_json(&measurement_str, age_from_c(age), config))
}

fn calculate_json(
    measurement_json: &str,
    age: Option<u32>,
    config: EngineConfig,
) -> Result<String, EngineError> {
    let measurement: Measurement = serde_json::from_str(measurement_json)?;
    let result = BmiEngine::new(config).calculate(&measurement, age)?;
    Ok(serde_json::to_string(&result)?)
}

/// Classify a BMI value and return the category label.
///
/// `policy`: 0 = simple adult, 1 = extended adult, 2 = child.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `bmi_free_string`.
/// - Returns NULL for an unknown policy; call `bmi_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn bmi_classify(bmi: f64, age: i32, policy: i32) -> *mut c_char {
    clear_last_error();

    let policy = match policy {
        0 => ClassificationPolicy::SimpleAdult,
        1 => ClassificationPolicy::ExtendedAdult,
        2 => ClassificationPolicy::Child,
        other => {
            set_last_error(&format!("Unknown classification policy {}", other));
            return ptr::null_mut();
        }
    };

    string_to_cstr(classify(bmi, age_from_c(age), policy).label())
}

// ============================================================================
// History API
// ============================================================================

/// Opaque handle to a History
pub struct BmiHistoryHandle {
    history: History,
}

/// Create an empty history.
///
/// # Safety
/// - Returns a pointer to a newly allocated history.
/// - Must be freed with `bmi_history_free`.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_new() -> *mut BmiHistoryHandle {
    clear_last_error();
    Box::into_raw(Box::new(BmiHistoryHandle {
        history: History::new(),
    }))
}

/// Free a history.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_free(history: *mut BmiHistoryHandle) {
    if !history.is_null() {
        drop(Box::from_raw(history));
    }
}

/// Calculate BMI for a person and append the result to the history.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`.
/// - `profile_json` and `measurement_json` must be valid null-terminated C strings.
/// - Returns the `BmiResult` JSON, which must be freed with `bmi_free_string`.
/// - Returns NULL on error; nothing is appended in that case.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_record(
    history: *mut BmiHistoryHandle,
    profile_json: *const c_char,
    measurement_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if history.is_null() {
        set_last_error("Null history pointer");
        return ptr::null_mut();
    }

    let handle = &mut *history;

    let profile_str = match cstr_to_string(profile_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid profile string pointer");
            return ptr::null_mut();
        }
    };

    let measurement_str = match cstr_to_string(measurement_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid measurement string pointer");
            return ptr::null_mut();
        }
    };

    finish(record_json(&mut handle.history, &profile_str, &measurement_str))
}

fn record_json(
    history: &mut History,
    profile_json: &str,
    measurement_json: &str,
) -> Result<String, EngineError> {
    let profile: Profile = serde_json::from_str(profile_json)?;
    let measurement: Measurement = serde_json::from_str(measurement_json)?;
    let result = BmiEngine::default().calculate(&measurement, Some(profile.age))?;
    history.record(&profile, &result);
    Ok(serde_json::to_string(&result)?)
}

/// Remove every entry from the history.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_clear(history: *mut BmiHistoryHandle) {
    if !history.is_null() {
        (*history).history.clear();
    }
}

/// Export the history as CSV.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`.
/// - Returns a newly allocated string that must be freed with `bmi_free_string`.
/// - Returns NULL on error; call `bmi_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_export_csv(history: *const BmiHistoryHandle) -> *mut c_char {
    clear_last_error();

    if history.is_null() {
        set_last_error("Null history pointer");
        return ptr::null_mut();
    }

    finish(to_csv_string(&(*history).history))
}

/// Save the history to JSON.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`.
/// - Returns a newly allocated string that must be freed with `bmi_free_string`.
/// - Returns NULL on error; call `bmi_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_to_json(history: *const BmiHistoryHandle) -> *mut c_char {
    clear_last_error();

    if history.is_null() {
        set_last_error("Null history pointer");
        return ptr::null_mut();
    }

    finish((*history).history.to_json())
}

/// Replace the history with entries loaded from JSON.
///
/// # Safety
/// - `history` must be a valid pointer returned by `bmi_history_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error. On error the history is unchanged.
#[no_mangle]
pub unsafe extern "C" fn bmi_history_load_json(
    history: *mut BmiHistoryHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if history.is_null() {
        set_last_error("Null history pointer");
        return -1;
    }

    let handle = &mut *history;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match History::from_json(&json_str) {
        Ok(loaded) => {
            handle.history = loaded;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn bmi_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn bmi_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn bmi_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn metric_json() -> CString {
        CString::new(r#"{"height":{"unit":"cm","value":180},"weight":{"unit":"kg","value":75}}"#)
            .unwrap()
    }

    fn profile_json() -> CString {
        CString::new(r#"{"name":"Ada","age":34,"gender":"Female","activity":"very_active"}"#)
            .unwrap()
    }

    #[test]
    fn test_ffi_calculate() {
        let measurement = metric_json();

        unsafe {
            let result = bmi_calculate(measurement.as_ptr(), 30, ptr::null());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["bmi"], 23.1);
            assert_eq!(value["category_label"], "Normal weight");
            assert_eq!(value["presentation"]["color"], "green");

            bmi_free_string(result);
        }
    }

    #[test]
    fn test_ffi_calculate_with_config() {
        let measurement = metric_json();
        let config = CString::new(r#"{"detail":"extended"}"#).unwrap();

        unsafe {
            let result = bmi_calculate(measurement.as_ptr(), -1, config.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("Normal Weight"));
            bmi_free_string(result);
        }
    }

    #[test]
    fn test_ffi_classify() {
        unsafe {
            let label = bmi_classify(30.0, 40, 1);
            assert_eq!(CStr::from_ptr(label).to_str().unwrap(), "Obesity Class I");
            bmi_free_string(label);

            assert!(bmi_classify(30.0, 40, 9).is_null());
            assert!(!bmi_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_history_lifecycle() {
        unsafe {
            let history = bmi_history_new();
            assert!(!history.is_null());

            let profile = profile_json();
            let measurement = metric_json();
            let result = bmi_history_record(history, profile.as_ptr(), measurement.as_ptr());
            assert!(!result.is_null());
            bmi_free_string(result);

            let csv = bmi_history_export_csv(history);
            let csv_str = CStr::from_ptr(csv).to_str().unwrap();
            assert_eq!(csv_str.lines().count(), 2);
            assert!(csv_str.contains(",Ada,34,Female,Very Active,180.0,75.0,23.1,Normal weight"));
            bmi_free_string(csv);

            let json = bmi_history_to_json(history);
            assert!(!json.is_null());

            let restored = bmi_history_new();
            assert_eq!(bmi_history_load_json(restored, json), 0);
            assert_eq!((*restored).history.len(), 1);
            bmi_free_string(json);

            bmi_history_clear(history);
            assert!((*history).history.is_empty());

            bmi_history_free(history);
            bmi_history_free(restored);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let zero_height =
                CString::new(r#"{"height":{"unit":"cm","value":0},"weight":{"unit":"kg","value":75}}"#)
                    .unwrap();
            let result = bmi_calculate(zero_height.as_ptr(), 30, ptr::null());
            assert!(result.is_null());

            let error = bmi_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Invalid measurement"));

            let history = bmi_history_new();
            let profile = profile_json();
            let failed = bmi_history_record(history, profile.as_ptr(), zero_height.as_ptr());
            assert!(failed.is_null());
            assert!((*history).history.is_empty());
            bmi_history_free(history);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = bmi_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
