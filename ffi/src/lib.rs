//! C-ABI wrapper around `tinyreq-core`.
//!
//! # Overview
//! Exposes request construction, header access, dispatch and the download
//! helper through `extern "C"` functions so C and C++ programs can issue
//! simple GET/POST calls without an HTTP stack of their own.
//!
//! # Design
//! - Panics are caught at each exported function and reported as
//!   `FfiErrorCode::Panic` (or a null pointer) instead of unwinding into C.
//! - Fallible operations return an `FfiResult` envelope with an error code,
//!   an optional message and a tagged payload. Setters return a bare
//!   `FfiErrorCode`.
//! - The C caller owns every returned pointer and releases it with the
//!   matching `tinyreq_free_*` function.
//! - `tinyreq_send` blocks until the exchange finishes; there is no timeout.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tinyreq_core::{ClientConfig, HttpClient, HttpResponse, TlsVerification};

use types::*;

/// Borrow a C string argument as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn arg_str<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiResult> {
    if ptr.is_null() {
        return Err(FfiResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiResult::invalid_utf8(name))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client configured from `TINYREQ_*` environment variables.
///
/// The caller must free the returned pointer with `tinyreq_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_client_new() -> *mut FfiClient {
    catch_unwind(|| {
        let client = HttpClient::new(ClientConfig::from_env());
        Box::into_raw(Box::new(FfiClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `tinyreq_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Request construction
// ---------------------------------------------------------------------------

/// Build a GET request. Adds `Accept: application/json` when `accept_json`.
///
/// On success `data_tag` is `Request` and `data` points to an `FfiRequest`.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_build_get(
    client: *const FfiClient,
    url: *const c_char,
    accept_json: bool,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let url = match unsafe { arg_str(url, "url") } {
            Ok(url) => url,
            Err(result) => return result,
        };
        match client.inner.build_get(url, accept_json) {
            Ok(request) => FfiResult::ok_request(request),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in tinyreq_build_get"))
}

/// Build a POST carrying `json` with JSON content headers.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_build_json_post(
    client: *const FfiClient,
    url: *const c_char,
    json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let url = match unsafe { arg_str(url, "url") } {
            Ok(url) => url,
            Err(result) => return result,
        };
        let json = match unsafe { arg_str(json, "json") } {
            Ok(json) => json,
            Err(result) => return result,
        };
        match client.inner.build_json_post(url, json) {
            Ok(request) => FfiResult::ok_request(request),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in tinyreq_build_json_post"))
}

/// Build a multipart POST uploading `data_len` bytes at `data` as `filename`.
///
/// `data` may be null only when `data_len` is zero.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_build_multipart_post(
    client: *const FfiClient,
    url: *const c_char,
    filename: *const c_char,
    data: *const u8,
    data_len: usize,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if data.is_null() && data_len > 0 {
            return FfiResult::null_arg("data");
        }
        let client = unsafe { &*client };
        let url = match unsafe { arg_str(url, "url") } {
            Ok(url) => url,
            Err(result) => return result,
        };
        let filename = match unsafe { arg_str(filename, "filename") } {
            Ok(filename) => filename,
            Err(result) => return result,
        };
        let data = if data_len == 0 {
            &[][..]
        } else {
            unsafe { std::slice::from_raw_parts(data, data_len) }
        };
        match client.inner.build_multipart_post(url, filename, data) {
            Ok(request) => FfiResult::ok_request(request),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in tinyreq_build_multipart_post"))
}

// ---------------------------------------------------------------------------
// Request accessors
// ---------------------------------------------------------------------------

/// Add or overwrite a header on `request`.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_request_set_header(
    request: *mut FfiRequest,
    key: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() || key.is_null() || value.is_null() {
            return FfiErrorCode::NullArg;
        }
        let request = unsafe { &mut *request };
        let key = unsafe { CStr::from_ptr(key) }.to_str();
        let value = unsafe { CStr::from_ptr(value) }.to_str();
        match (key, value) {
            (Ok(key), Ok(value)) => {
                request.inner.set_header(key, value);
                FfiErrorCode::Ok
            }
            _ => FfiErrorCode::InvalidUtf8,
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Copy the value of header `key`, or return null when it is not set.
///
/// The caller must free a non-null result with `tinyreq_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_request_get_header(
    request: *const FfiRequest,
    key: *const c_char,
) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() || key.is_null() {
            return std::ptr::null_mut();
        }
        let request = unsafe { &*request };
        let Ok(key) = unsafe { CStr::from_ptr(key) }.to_str() else {
            return std::ptr::null_mut();
        };
        request
            .inner
            .header(key)
            .map(to_c_string)
            .unwrap_or(std::ptr::null_mut())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Turn server certificate verification off (`insecure = true`) or back on.
/// Only meaningful for `https` requests.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_request_set_insecure_skip_verify(
    request: *mut FfiRequest,
    insecure: bool,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() {
            return FfiErrorCode::NullArg;
        }
        let request = unsafe { &mut *request };
        let policy = if insecure {
            TlsVerification::InsecureSkipVerify
        } else {
            TlsVerification::Verify
        };
        request.inner.set_tls_verification(policy);
        FfiErrorCode::Ok
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Send `request` and decode the reply. Blocks until the exchange ends.
///
/// On success `data_tag` is `Response` and `data` points to an `FfiResponse`.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_send(client: *const FfiClient, request: *const FfiRequest) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        let client = unsafe { &*client };
        let request = unsafe { &*request };
        match client.inner.send(&request.inner) {
            Ok(response) => FfiResult::ok_response(response),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in tinyreq_send"))
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Look up header `key` in `response`.
///
/// Returns a pointer into `response` (valid until its result is freed), or
/// null when the header is absent.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_response_get_header(
    response: *const FfiResponse,
    key: *const c_char,
) -> *const c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() || key.is_null() {
            return std::ptr::null();
        }
        let response = unsafe { &*response };
        let key = unsafe { CStr::from_ptr(key) };
        response
            .header_slice()
            .iter()
            .find(|header| unsafe { CStr::from_ptr(header.key) } == key)
            .map(|header| header.value as *const c_char)
            .unwrap_or(std::ptr::null())
    }))
    .unwrap_or(std::ptr::null())
}

/// Write the body of `response` to `path`, refusing to overwrite an
/// existing file (`FileExists`).
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_download_file(
    response: *const FfiResponse,
    path: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let response = unsafe { &*response };
        let path = match unsafe { arg_str(path, "path") } {
            Ok(path) => path,
            Err(result) => return result,
        };
        let core_response = HttpResponse {
            status: response.status,
            body: response.body_slice().to_vec(),
            ..Default::default()
        };
        match tinyreq_core::download_file(&core_response, path) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in tinyreq_download_file"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` and the payload it owns. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Request => {
                    drop(unsafe { Box::from_raw(result.data as *mut FfiRequest) });
                }
                FfiDataTag::Response => {
                    let mut response = unsafe { Box::from_raw(result.data as *mut FfiResponse) };
                    unsafe { response.free_fields() };
                }
                FfiDataTag::None => {}
            }
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tinyreq_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
