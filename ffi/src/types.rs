//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests stay opaque: C holds a pointer and edits it through accessor
//! functions, so request invariants never leak across the boundary.
//! Responses are exposed as plain C data: header pairs as C strings and the
//! body as a pointer/length pair, since bodies may hold NUL bytes.
//! Conversion functions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use tinyreq_core::{HttpError, HttpRequest, HttpResponse};

/// Opaque handle to an `HttpClient`.
pub struct FfiClient {
    pub(crate) inner: tinyreq_core::HttpClient,
}

/// Opaque handle to a built request. Owned by the `FfiResult` it came in.
pub struct FfiRequest {
    pub(crate) inner: HttpRequest,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A decoded response. Headers are in name order.
#[repr(C)]
pub struct FfiResponse {
    pub status: u16,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiResponse {
    pub(crate) fn from_core(response: HttpResponse) -> Self {
        let headers: Box<[FfiHeader]> = response
            .headers
            .into_iter()
            .map(|(key, value)| FfiHeader {
                key: to_c_string(&key),
                value: to_c_string(&value),
            })
            .collect();
        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(headers) as *mut FfiHeader
        };

        let body = response.body.into_boxed_slice();
        let body_len = body.len();
        let body = if body.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(body) as *mut u8
        };

        Self {
            status: response.status,
            headers,
            headers_len,
            body,
            body_len,
        }
    }

    pub(crate) fn header_slice(&self) -> &[FfiHeader] {
        if self.headers.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) }
        }
    }

    pub(crate) fn body_slice(&self) -> &[u8] {
        if self.body.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.body, self.body_len) }
        }
    }

    /// Release everything this response points to.
    ///
    /// # Safety
    /// `self` must have been produced by `from_core` and not freed before.
    pub(crate) unsafe fn free_fields(&mut self) {
        if !self.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.headers,
                    self.headers_len as usize,
                ))
            };
            for header in headers.iter() {
                free_c_string(header.key);
                free_c_string(header.value);
            }
            self.headers = std::ptr::null_mut();
        }
        if !self.body.is_null() {
            drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(self.body, self.body_len)) });
            self.body = std::ptr::null_mut();
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult` and by setter functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MalformedUrl = 1,
    Resolution = 2,
    Connection = 3,
    Tls = 4,
    MalformedResponse = 5,
    Serialization = 6,
    FileExists = 7,
    Io = 8,
    Panic = 9,
    NullArg = 10,
    InvalidUtf8 = 11,
}

impl From<&HttpError> for FfiErrorCode {
    fn from(err: &HttpError) -> Self {
        match err {
            HttpError::MalformedUrl(_) => FfiErrorCode::MalformedUrl,
            HttpError::Resolution(_) => FfiErrorCode::Resolution,
            HttpError::Connection { .. } => FfiErrorCode::Connection,
            HttpError::Tls(_) => FfiErrorCode::Tls,
            HttpError::MalformedResponse(_) => FfiErrorCode::MalformedResponse,
            HttpError::Serialization(_) => FfiErrorCode::Serialization,
            HttpError::FileExists(_) => FfiErrorCode::FileExists,
            HttpError::Io(_) => FfiErrorCode::Io,
        }
    }
}

/// Tag that tells `tinyreq_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Request = 1,
    Response = 2,
}

/// Result envelope for building, sending and downloading.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag` (`FfiRequest` or
/// `FfiResponse`). The envelope owns the payload: it stays valid until the
/// envelope is passed to `tinyreq_free_result`.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            data_tag,
            data,
        }))
    }

    /// Success result carrying an opaque request.
    pub(crate) fn ok_request(request: HttpRequest) -> *mut Self {
        let request = Box::into_raw(Box::new(FfiRequest { inner: request }));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Request, request as *mut c_void)
    }

    /// Success result carrying a decoded response.
    pub(crate) fn ok_response(response: HttpResponse) -> *mut Self {
        let response = Box::into_raw(Box::new(FfiResponse::from_core(response)));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Response, response as *mut c_void)
    }

    /// Success result with no payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn from_error(err: HttpError) -> *mut Self {
        tracing::debug!(error = %err, "returning error across FFI");
        Self::error(FfiErrorCode::from(&err), &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn invalid_utf8(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::InvalidUtf8, &format!("argument is not UTF-8: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        tracing::error!("{msg}");
        Self::error(FfiErrorCode::Panic, msg)
    }

    fn error(code: FfiErrorCode, msg: &str) -> *mut Self {
        Self::boxed(code, to_c_string(msg), FfiDataTag::None, std::ptr::null_mut())
    }
}

/// Heap-allocate `s` as a C string. Interior NUL bytes are dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    let cleaned: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
    CString::new(cleaned).unwrap_or_default().into_raw()
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
