//! FFI interface for host applications
//!
//! C-compatible entry points over the scheme engine. Schemes, instructions
//! and content are exchanged as JSON strings.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use scraper::Html;
use serde::Serialize;
use serde_json::Value;

use crate::extractor::execute_instructions;
use crate::locator::locate_first;
use crate::scheme::{Instructions, Scheme};
use crate::transforms::{interlace_with_mode, relativize, InterlaceMode};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_scheme_result
#[repr(C)]
pub struct SchemeResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Run instructions against an HTML document.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `instructions_json` - JSON-serialized Instructions (null-terminated)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `instructions_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_scheme_result`
#[no_mangle]
pub unsafe extern "C" fn scrape_with_instructions(
    html_ptr: *const c_char,
    html_len: usize,
    instructions_json: *const c_char,
) -> SchemeResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let instructions_str = match read_cstr(instructions_json, "Instructions JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let instructions = match Instructions::from_json(instructions_str) {
        Ok(i) => i,
        Err(e) => return make_error_result(&format!("Failed to parse instructions: {}", e)),
    };

    match execute_instructions(&instructions, &html) {
        Ok(value) => make_json_result(&value),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Merge scraped content into a scheme.
///
/// `per_element` non-zero also interlaces one element scheme per list entry.
///
/// # Safety
/// - `scheme_json` and `content_json` must be valid null-terminated C strings
/// - Caller must free the result via `free_scheme_result`
#[no_mangle]
pub unsafe extern "C" fn interlace_scheme_ffi(
    scheme_json: *const c_char,
    content_json: *const c_char,
    per_element: u8,
) -> SchemeResultFFI {
    let scheme = match read_scheme(scheme_json) {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    // Unparseable content is treated like missing content
    let content = match read_cstr(content_json, "Content JSON") {
        Ok(s) => serde_json::from_str(s).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    };

    let mode = if per_element != 0 {
        InterlaceMode::PerElement
    } else {
        InterlaceMode::Representative
    };

    make_json_result(&interlace_with_mode(&scheme, &content, mode))
}

/// Rewrite element-scheme paths relative to their enclosing lists.
///
/// # Safety
/// - `scheme_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_scheme_result`
#[no_mangle]
pub unsafe extern "C" fn relativize_scheme_ffi(scheme_json: *const c_char) -> SchemeResultFFI {
    match read_scheme(scheme_json) {
        Ok(scheme) => make_json_result(&relativize(&scheme)),
        Err(msg) => make_error_result(&msg),
    }
}

/// Structural path of the first element matching `selector`, as a JSON
/// string, or JSON null when nothing matches.
///
/// # Safety
/// Same as scrape_with_instructions, with `selector` a null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn locate_path_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    selector: *const c_char,
) -> SchemeResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let selector_str = match read_cstr(selector, "Selector") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let document = Html::parse_document(&html);
    match locate_first(&document, selector_str) {
        Ok(path) => make_json_result(&path),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a SchemeResultFFI returned by any function in this module
///
/// # Safety
/// - `result` must have been returned by this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_scheme_result(result: SchemeResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }

    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_cstr<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }

    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

unsafe fn read_scheme(scheme_json: *const c_char) -> Result<Scheme, String> {
    let scheme_str = read_cstr(scheme_json, "Scheme JSON")?;
    Scheme::from_json(scheme_str).map_err(|e| format!("Failed to parse scheme: {}", e))
}

fn make_json_result<T: Serialize>(value: &T) -> SchemeResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => SchemeResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> SchemeResultFFI {
    let error_cstr = CString::new(msg).unwrap_or_else(|_| c"Unknown error".to_owned());
    SchemeResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
