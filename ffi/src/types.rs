//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, boxed slices handed out as raw
//! pointers, and tagged enums with explicit discriminants. Conversion and
//! release helpers live here to keep `lib.rs` focused on the `extern "C"`
//! surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use waitlist_core::{
    ApiError, ErrorCause, HttpMethod, HttpRequest, ProjectInfoResponse, RetryPolicy,
    SignupResponse, StatusMessage, WaitlistClient,
};

/// Opaque handle to a `WaitlistClient` and its retry policy. C callers
/// receive a pointer to this and pass it back into every FFI function.
pub struct FfiWaitlistClient {
    pub(crate) inner: WaitlistClient,
    pub(crate) policy: RetryPolicy,
}

// ---------------------------------------------------------------------------
// C string helpers
// ---------------------------------------------------------------------------

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

pub(crate) fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(ptr::null_mut(), c_string)
}

/// Borrow a C string; `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// # Safety
/// `ptr` must be null or come from `c_string` and not be freed yet.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `waitlist_build_*` functions. The C caller executes the request
/// (honoring `timeout_ms`) and passes the response back through
/// `waitlist_parse_*`. `url` already carries the API key.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            ptr::null_mut()
        } else {
            let headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string_opt(req.body),
            timeout_ms: u64::try_from(req.timeout.as_millis()).unwrap_or(u64::MAX),
        }))
    }

    /// # Safety
    /// `req` must come from `from_core` and not be freed yet.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            free_c_string(req.body);
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                unsafe {
                    free_c_string(h.key);
                    free_c_string(h.value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `waitlist_parse_*` function. The FFI layer reads
/// but does not free these fields. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error categories reported in `FfiWaitlistResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The service answered with a non-2xx status.
    Api = 1,
    /// No response arrived (reported by the host).
    Transport = 2,
    /// A 2xx body did not have the expected shape.
    Decode = 3,
    Encode = 4,
    Panic = 5,
    NullArg = 6,
}

/// Tag that tells `waitlist_free_result` what `FfiWaitlistResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Signup = 1,
    ProjectInfo = 2,
    StatusMessage = 3,
}

/// A waitlist entry exposed to C. `name` and `phone` may be null.
#[repr(C)]
pub struct FfiSignupEntry {
    pub id: *mut c_char,
    pub email: *mut c_char,
    pub name: *mut c_char,
    pub phone: *mut c_char,
    pub position: u64,
    pub is_verified: bool,
    pub created_at: *mut c_char,
}

#[repr(C)]
pub struct FfiSignupResponse {
    pub success: bool,
    pub entry: FfiSignupEntry,
    pub message: *mut c_char,
}

#[repr(C)]
pub struct FfiProjectInfo {
    pub success: bool,
    pub project_id: *mut c_char,
    pub timestamp: *mut c_char,
}

/// Verification and unsubscribe acknowledgements.
#[repr(C)]
pub struct FfiStatusMessage {
    pub success: bool,
    pub message: *mut c_char,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, the error fields are null and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error` holds the normalized error text, `error_message` the
/// service's message if it sent one, `http_status` the status (0 when no
/// response arrived) and `data` is null.
/// `json` always holds the value as JSON: the decoded payload on success,
/// the error envelope (with `details`) on failure.
#[repr(C)]
pub struct FfiWaitlistResult {
    pub error_code: FfiErrorCode,
    pub error: *mut c_char,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub json: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiWaitlistResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void, json: String) -> *mut Self {
        Box::into_raw(Box::new(FfiWaitlistResult {
            error_code: FfiErrorCode::Ok,
            error: ptr::null_mut(),
            error_message: ptr::null_mut(),
            http_status: 0,
            json: c_string(json),
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_signup(response: SignupResponse) -> *mut Self {
        let json = serde_json::to_string(&response).unwrap_or_default();
        let entry = response.data;
        let data = Box::new(FfiSignupResponse {
            success: response.success,
            entry: FfiSignupEntry {
                id: c_string(entry.id),
                email: c_string(entry.email),
                name: c_string_opt(entry.name),
                phone: c_string_opt(entry.phone),
                position: entry.position,
                is_verified: entry.is_verified,
                created_at: c_string(entry.created_at),
            },
            message: c_string(response.message),
        });
        Self::ok(FfiDataTag::Signup, Box::into_raw(data) as *mut c_void, json)
    }

    pub(crate) fn ok_project_info(response: ProjectInfoResponse) -> *mut Self {
        let json = serde_json::to_string(&response).unwrap_or_default();
        let data = Box::new(FfiProjectInfo {
            success: response.success,
            project_id: c_string(response.data.project_id),
            timestamp: c_string(response.data.timestamp),
        });
        Self::ok(FfiDataTag::ProjectInfo, Box::into_raw(data) as *mut c_void, json)
    }

    pub(crate) fn ok_status(response: StatusMessage) -> *mut Self {
        let json = serde_json::to_string(&response).unwrap_or_default();
        let data = Box::new(FfiStatusMessage {
            success: response.success,
            message: c_string(response.message),
        });
        Self::ok(FfiDataTag::StatusMessage, Box::into_raw(data) as *mut c_void, json)
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err.cause {
            None => FfiErrorCode::Api,
            Some(ErrorCause::Transport(_)) => FfiErrorCode::Transport,
            Some(ErrorCause::Decode(_)) => FfiErrorCode::Decode,
            Some(ErrorCause::Encode(_)) => FfiErrorCode::Encode,
        };
        let json = serde_json::to_string(&err).unwrap_or_default();
        Box::into_raw(Box::new(FfiWaitlistResult {
            error_code,
            error: c_string(err.error),
            error_message: c_string_opt(err.message),
            http_status: err.status.unwrap_or(0),
            json: c_string(json),
            data_tag: FfiDataTag::None,
            data: ptr::null_mut(),
        }))
    }

    fn failure(error_code: FfiErrorCode, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiWaitlistResult {
            error_code,
            error: c_string(msg),
            error_message: ptr::null_mut(),
            http_status: 0,
            json: ptr::null_mut(),
            data_tag: FfiDataTag::None,
            data: ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string())
    }

    /// The status-level view of this result the retry policy needs.
    /// `None` for outcomes that are never retried.
    pub(crate) fn retry_view(&self) -> Option<ApiError> {
        match self.error_code {
            FfiErrorCode::Api | FfiErrorCode::Transport | FfiErrorCode::Decode => {
                Some(ApiError {
                    error: String::new(),
                    message: None,
                    status: (self.http_status != 0).then_some(self.http_status),
                    details: None,
                    cause: None,
                })
            }
            FfiErrorCode::Ok
            | FfiErrorCode::Encode
            | FfiErrorCode::Panic
            | FfiErrorCode::NullArg => None,
        }
    }

    /// # Safety
    /// `result` must come from one of the constructors above and not be freed yet.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            free_c_string(result.error);
            free_c_string(result.error_message);
            free_c_string(result.json);
        }
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Signup => {
                let data = unsafe { Box::from_raw(result.data as *mut FfiSignupResponse) };
                let e = &data.entry;
                unsafe {
                    free_c_string(e.id);
                    free_c_string(e.email);
                    free_c_string(e.name);
                    free_c_string(e.phone);
                    free_c_string(e.created_at);
                    free_c_string(data.message);
                }
            }
            FfiDataTag::ProjectInfo => {
                let data = unsafe { Box::from_raw(result.data as *mut FfiProjectInfo) };
                unsafe {
                    free_c_string(data.project_id);
                    free_c_string(data.timestamp);
                }
            }
            FfiDataTag::StatusMessage => {
                let data = unsafe { Box::from_raw(result.data as *mut FfiStatusMessage) };
                unsafe { free_c_string(data.message) };
            }
            FfiDataTag::None => {}
        }
    }
}
