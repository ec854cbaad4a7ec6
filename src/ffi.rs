//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Input
//! Every entry point takes a proposal fields record as UTF-8 JSON bytes (not
//! necessarily null-terminated), e.g. `{"clientName": "Acme", "pricing": "$10,000"}`.
//!
//! ## Memory management
//! - Strings returned through `out_*` pointers are allocated on the Rust heap.
//! - Callers **must** free them with `pforge_free_string`.
//! - Passing a null pointer to the free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error):
//!   `1` null pointer, `2` invalid UTF-8, `3` invalid fields/config or
//!   generation failure.
//! - Error details can be retrieved via `pforge_last_error`.
//!
//! ## Thread safety
//! - The `pforge_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads. Generation itself holds no shared state.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -lproposal_forge
//! // #include <stdint.h>
//! // extern int pforge_render_html(const uint8_t* json, uint32_t json_len,
//! //                               char** out_html);
//! // extern const char* pforge_last_error();
//! // extern void pforge_free_string(char* s);
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use chrono::DateTime;

use crate::fields::ProposalFields;
use crate::model::PageOrientation;
use crate::pipeline::{compute_page_layout, generate_html, PipelineConfig};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

// ---------------------------------------------------------------------------
// C-compatible configuration types
// ---------------------------------------------------------------------------

/// Page orientation for use in [`PforgePipelineConfig`].
#[repr(C)]
pub enum PforgePageOrientation {
    /// Portrait mode: height > width (default).
    Portrait = 0,
    /// Landscape mode: width > height.
    Landscape = 1,
}

/// Optional configuration passed to the `*_ex` functions.
///
/// Fields set to `0` (or `NULL` for `title`) fall back to their defaults:
/// - `page_width`   → 794 px (A4 @ 96 DPI)
/// - `page_height`  → 1123 px
/// - `title`        → the project title
/// - `timestamp_ms` → the current time
#[repr(C)]
pub struct PforgePipelineConfig {
    /// Null-terminated UTF-8 override for the HTML `<title>`.
    pub title: *const c_char,
    /// Page width in logical pixels. Pass `0.0` to use the default.
    pub page_width: f32,
    /// Page height in logical pixels. Pass `0.0` to use the default.
    pub page_height: f32,
    /// Page orientation (portrait = 0, landscape = 1).
    pub orientation: PforgePageOrientation,
    /// Generation instant as Unix milliseconds. Pass `0` for "now".
    pub timestamp_ms: i64,
}

/// Convert a `PforgePipelineConfig` (FFI) to a `PipelineConfig` (Rust).
///
/// # Safety
/// `cfg.title`, if non-null, must point to a valid null-terminated UTF-8 string.
unsafe fn pipeline_config_from_c(cfg: &PforgePipelineConfig) -> PipelineConfig {
    let defaults = PipelineConfig::default();

    let title = if cfg.title.is_null() {
        None
    } else {
        CStr::from_ptr(cfg.title).to_str().ok().map(str::to_string)
    };

    let page_width = if cfg.page_width == 0.0 { defaults.page_width } else { cfg.page_width };
    let page_height = if cfg.page_height == 0.0 { defaults.page_height } else { cfg.page_height };

    let orientation = match cfg.orientation {
        PforgePageOrientation::Portrait => PageOrientation::Portrait,
        PforgePageOrientation::Landscape => PageOrientation::Landscape,
    };

    let timestamp = if cfg.timestamp_ms == 0 {
        None
    } else {
        DateTime::from_timestamp_millis(cfg.timestamp_ms)
    };

    PipelineConfig { title, page_width, page_height, orientation, timestamp }
}

/// Decode the fields JSON buffer, recording the failure on error.
///
/// # Safety
/// `json_ptr` must point to `json_len` valid bytes.
unsafe fn fields_from_raw(json_ptr: *const u8, json_len: u32) -> Result<ProposalFields, c_int> {
    let bytes = slice::from_raw_parts(json_ptr, json_len as usize);
    let json = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8: {e}"));
            return Err(2);
        }
    };
    ProposalFields::from_json(json).map_err(|e| {
        set_last_error(&format!("Invalid fields JSON: {e}"));
        3
    })
}

/// Hand a string to the caller through `out`.
///
/// # Safety
/// `out` must be a valid pointer.
unsafe fn write_string(out: *mut *mut c_char, s: String) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(_) => {
            *out = ptr::null_mut();
            set_last_error("Output contained null byte");
            3
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Render a proposal fields record to a self-contained HTML document.
///
/// # Parameters
/// - `json_ptr`: pointer to UTF-8 fields JSON bytes
/// - `json_len`: length of the JSON data in bytes
/// - `out_html`: on success, receives a pointer to a null-terminated HTML string
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `pforge_last_error`.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `out_html` must be a valid pointer.
/// - The caller must free `*out_html` by calling `pforge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn pforge_render_html(
    json_ptr: *const u8,
    json_len: u32,
    out_html: *mut *mut c_char,
) -> c_int {
    pforge_render_html_ex(json_ptr, json_len, ptr::null(), out_html)
}

/// Compute only the paginated layout (no markup). Returns JSON.
///
/// # Parameters
/// - `json_ptr`, `json_len`: the fields JSON input
/// - `out_json`: receives a pointer to a null-terminated JSON string
///
/// # Returns
/// `0` on success.
///
/// # Safety
/// Same as `pforge_render_html`.
#[no_mangle]
pub unsafe extern "C" fn pforge_compute_layout(
    json_ptr: *const u8,
    json_len: u32,
    out_json: *mut *mut c_char,
) -> c_int {
    pforge_compute_layout_ex(json_ptr, json_len, ptr::null(), out_json)
}

// ---------------------------------------------------------------------------
// Config-aware variants (*_ex)
// ---------------------------------------------------------------------------

/// Render HTML with a custom [`PforgePipelineConfig`].
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 fields JSON input
/// - `cfg`: optional pointer to a [`PforgePipelineConfig`]; pass `NULL` for defaults
/// - `out_html`: HTML output (free with `pforge_free_string`)
///
/// # Returns
/// `0` on success.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `cfg`, if non-null, must be a valid pointer to a fully-initialised
///   [`PforgePipelineConfig`] whose `title` field (if non-null) is a valid
///   null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn pforge_render_html_ex(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const PforgePipelineConfig,
    out_html: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_html.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let fields = match fields_from_raw(json_ptr, json_len) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let config = if cfg.is_null() {
        PipelineConfig::default()
    } else {
        pipeline_config_from_c(&*cfg)
    };

    match generate_html(&fields, &config) {
        Ok((html, _)) => write_string(out_html, html),
        Err(e) => {
            set_last_error(&e.to_string());
            3
        }
    }
}

/// Compute the paginated layout JSON with a custom [`PforgePipelineConfig`].
///
/// # Safety
/// Same as `pforge_render_html_ex`.
#[no_mangle]
pub unsafe extern "C" fn pforge_compute_layout_ex(
    json_ptr: *const u8,
    json_len: u32,
    cfg: *const PforgePipelineConfig,
    out_json: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let fields = match fields_from_raw(json_ptr, json_len) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let config = if cfg.is_null() {
        PipelineConfig::default()
    } else {
        pipeline_config_from_c(&*cfg)
    };
    if let Err(e) = config.validate() {
        set_last_error(&e.to_string());
        return 3;
    }

    let layout = compute_page_layout(&fields, &config);
    write_string(out_json, layout.to_json())
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a string returned through an `out_*` pointer.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn pforge_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `pforge_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn pforge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn pforge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn take_string(p: *mut c_char) -> String {
        let s = unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string();
        unsafe { pforge_free_string(p) };
        s
    }

    #[test]
    fn ffi_render_html() {
        let json = br#"{"clientName": "Acme", "pricing": "$10,000"}"#;
        let mut out: *mut c_char = ptr::null_mut();

        let rc = unsafe { pforge_render_html(json.as_ptr(), json.len() as u32, &mut out) };

        assert_eq!(rc, 0, "Expected success");
        assert!(!out.is_null());
        let html = take_string(out);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("$10,000"));
    }

    #[test]
    fn ffi_compute_layout() {
        let json = b"{}";
        let mut out: *mut c_char = ptr::null_mut();

        let rc = unsafe { pforge_compute_layout(json.as_ptr(), json.len() as u32, &mut out) };

        assert_eq!(rc, 0);
        let layout = take_string(out);
        assert!(layout.contains("\"pageCount\": 1"));
        assert!(layout.contains("\"pages\""));
    }

    #[test]
    fn ffi_null_input() {
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { pforge_render_html(ptr::null(), 0, &mut out) };
        assert_eq!(rc, 1, "Should fail on null input");
        assert!(!pforge_last_error().is_null());
    }

    #[test]
    fn ffi_invalid_utf8_and_json() {
        let mut out: *mut c_char = ptr::null_mut();
        let bad = [0xff_u8, 0xfe];
        let rc = unsafe { pforge_render_html(bad.as_ptr(), bad.len() as u32, &mut out) };
        assert_eq!(rc, 2);

        let not_object = b"[1, 2]";
        let rc = unsafe {
            pforge_render_html(not_object.as_ptr(), not_object.len() as u32, &mut out)
        };
        assert_eq!(rc, 3);
        let msg = unsafe { CStr::from_ptr(pforge_last_error()) }.to_str().unwrap();
        assert!(msg.contains("Invalid fields JSON"), "{msg}");
    }

    #[test]
    fn ffi_version() {
        let v = pforge_version();
        let version = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn ffi_render_html_ex_custom_config() {
        let json = br#"{"projectTitle": "Ignored"}"#;
        let title = CString::new("My Custom Title").unwrap();
        let cfg = PforgePipelineConfig {
            title: title.as_ptr(),
            page_width: 0.0,
            page_height: 0.0,
            orientation: PforgePageOrientation::Landscape,
            timestamp_ms: 1_767_614_400_000,
        };
        let mut out: *mut c_char = ptr::null_mut();

        let rc = unsafe { pforge_render_html_ex(json.as_ptr(), json.len() as u32, &cfg, &mut out) };

        assert_eq!(rc, 0, "Expected success");
        let html = take_string(out);
        assert!(html.contains("<title>My Custom Title</title>"));
        assert!(html.contains("width: 1123px"));
        assert!(html.contains("January 5, 2026"));
    }

    #[test]
    fn ffi_compute_layout_ex_rejects_bad_geometry() {
        let json = b"{}";
        let cfg = PforgePipelineConfig {
            title: ptr::null(),
            page_width: -5.0,
            page_height: 0.0,
            orientation: PforgePageOrientation::Portrait,
            timestamp_ms: 0,
        };
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { pforge_compute_layout_ex(json.as_ptr(), json.len() as u32, &cfg, &mut out) };
        assert_eq!(rc, 3);
        let msg = unsafe { CStr::from_ptr(pforge_last_error()) }.to_str().unwrap();
        assert!(msg.contains("pageWidth"), "{msg}");
    }
}
