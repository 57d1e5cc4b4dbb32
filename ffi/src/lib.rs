//! C-ABI wrapper around `waitlist-core`.
//!
//! # Overview
//! Exposes the waitlist API through `extern "C"` functions so any language
//! with a C FFI can build requests, parse responses and make retry decisions
//! while doing the HTTP round-trip with its own stack. No async runtime or
//! HTTP client is linked in.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - A single `FfiWaitlistResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - A host-side retry loop calls `waitlist_retry_delay_ms` after each failed
//!   attempt and reports network failures through `waitlist_transport_failure`,
//!   so it backs off exactly like the async Rust client.
//! - The C caller owns all returned pointers and must call the matching
//!   `waitlist_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use waitlist_core::{
    phone, ApiError, ClientConfig, ClientMetadata, HttpResponse, RetryPolicy, SignupRequest,
    TransportError, WaitlistClient,
};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for `api_key`. `base_url` may be null for the production
/// endpoint.
///
/// Returns null if `api_key` is null or empty, if `base_url` is not a usable
/// URL, or if an internal panic occurs. The caller must free the returned
/// pointer with `waitlist_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_client_new(
    api_key: *const c_char,
    base_url: *const c_char,
) -> *mut FfiWaitlistClient {
    catch_unwind(|| {
        let Some(key) = (unsafe { borrow_str(api_key) }) else {
            return ptr::null_mut();
        };
        let mut config = ClientConfig::new(key);
        if !base_url.is_null() {
            let Some(url) = (unsafe { borrow_str(base_url) }) else {
                return ptr::null_mut();
            };
            config = config.with_base_url(url);
        }
        let policy = RetryPolicy::from_config(&config);
        match WaitlistClient::new(config) {
            Ok(inner) => Box::into_raw(Box::new(FfiWaitlistClient { inner, policy })),
            Err(_) => ptr::null_mut(),
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a client created by `waitlist_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_client_free(client: *mut FfiWaitlistClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Read `len` optional C strings; null entries and invalid UTF-8 are skipped.
///
/// # Safety
/// `items` must be null or point to `len` readable pointers.
unsafe fn collect_strings(items: *const *const c_char, len: u32) -> Vec<String> {
    if items.is_null() || len == 0 {
        return Vec::new();
    }
    let items = unsafe { std::slice::from_raw_parts(items, len as usize) };
    items
        .iter()
        .filter_map(|&p| unsafe { borrow_str(p) })
        .map(str::to_string)
        .collect()
}

/// Build the signup request.
///
/// `name`, `phone`, `user_agent` and `referrer` may be null; empty strings
/// are treated the same way. `tags` may be null when `tags_len` is 0.
/// Returns null if `client` or `email` is null, or if encoding fails.
/// The caller must free the returned pointer with `waitlist_free_request`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn waitlist_build_signup(
    client: *const FfiWaitlistClient,
    email: *const c_char,
    name: *const c_char,
    phone: *const c_char,
    tags: *const *const c_char,
    tags_len: u32,
    user_agent: *const c_char,
    referrer: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(email) = (unsafe { borrow_str(email) }) else {
            return ptr::null_mut();
        };
        let owned = |p| unsafe { borrow_str(p) }.map(str::to_string);
        let request = SignupRequest {
            email: email.to_string(),
            name: owned(name),
            phone: owned(phone),
            tags: unsafe { collect_strings(tags, tags_len) },
        };
        let metadata = ClientMetadata {
            user_agent: owned(user_agent),
            referrer: owned(referrer),
        };
        match client.inner.build_signup(&request, Some(&metadata)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => ptr::null_mut(),
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Build the project-info request. Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_build_project_info(
    client: *const FfiWaitlistClient,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_project_info())
    })
    .unwrap_or(ptr::null_mut())
}

fn build_with_token(
    client: *const FfiWaitlistClient,
    token: *const c_char,
    build: fn(&WaitlistClient, &str) -> Result<waitlist_core::HttpRequest, ApiError>,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(token) = (unsafe { borrow_str(token) }) else {
            return ptr::null_mut();
        };
        match build(&client.inner, token) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => ptr::null_mut(),
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Build the email verification request.
/// Returns null if `client` or `token` is null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_build_verify_email(
    client: *const FfiWaitlistClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with_token(client, token, WaitlistClient::build_verify_email)
}

/// Build the unsubscribe request.
/// Returns null if `client` or `token` is null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_build_unsubscribe(
    client: *const FfiWaitlistClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build_with_token(client, token, WaitlistClient::build_unsubscribe)
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
///
/// A null body is read as empty; invalid UTF-8 is replaced, not dropped.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

fn parse_with<R>(
    client: *const FfiWaitlistClient,
    response: *const FfiHttpResponse,
    fn_name: &str,
    parse: fn(&WaitlistClient, HttpResponse) -> Result<R, ApiError>,
    wrap: fn(R) -> *mut FfiWaitlistResult,
) -> *mut FfiWaitlistResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiWaitlistResult::null_arg("client");
        }
        if response.is_null() {
            return FfiWaitlistResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match parse(&client.inner, ffi_response_to_core(resp)) {
            Ok(value) => wrap(value),
            Err(e) => FfiWaitlistResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiWaitlistResult::panic(&format!("panic in {fn_name}")))
}

/// Parse the response to a signup request.
///
/// Returns a result with `data_tag = Signup` on success.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_parse_signup(
    client: *const FfiWaitlistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWaitlistResult {
    parse_with(
        client,
        response,
        "waitlist_parse_signup",
        WaitlistClient::parse_signup,
        FfiWaitlistResult::ok_signup,
    )
}

/// Parse the response to a project-info request.
///
/// Returns a result with `data_tag = ProjectInfo` on success.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_parse_project_info(
    client: *const FfiWaitlistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWaitlistResult {
    parse_with(
        client,
        response,
        "waitlist_parse_project_info",
        WaitlistClient::parse_project_info,
        FfiWaitlistResult::ok_project_info,
    )
}

/// Parse the response to a verification request.
///
/// Returns a result with `data_tag = StatusMessage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_parse_verify_email(
    client: *const FfiWaitlistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWaitlistResult {
    parse_with(
        client,
        response,
        "waitlist_parse_verify_email",
        WaitlistClient::parse_verify_email,
        FfiWaitlistResult::ok_status,
    )
}

/// Parse the response to an unsubscribe request.
///
/// Returns a result with `data_tag = StatusMessage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_parse_unsubscribe(
    client: *const FfiWaitlistClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWaitlistResult {
    parse_with(
        client,
        response,
        "waitlist_parse_unsubscribe",
        WaitlistClient::parse_unsubscribe,
        FfiWaitlistResult::ok_status,
    )
}

// ---------------------------------------------------------------------------
// Retry support
// ---------------------------------------------------------------------------

/// Normalize a failure that produced no HTTP response (timeout, refused
/// connection, DNS). `message` may be null.
///
/// The result has `error_code = Transport` and `http_status = 0`.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_transport_failure(message: *const c_char) -> *mut FfiWaitlistResult {
    catch_unwind(|| {
        let message = unsafe { borrow_str(message) }.unwrap_or("no response");
        FfiWaitlistResult::from_error(ApiError::from_transport(TransportError::Io(
            message.to_string(),
        )))
    })
    .unwrap_or_else(|_| FfiWaitlistResult::panic("panic in waitlist_transport_failure"))
}

/// Milliseconds to wait before retrying after `attempt` (1-based) ended
/// with `result`, or -1 to stop and surface `result`.
///
/// Successful results, client errors (4xx), argument errors and an
/// exhausted attempt budget all return -1.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_retry_delay_ms(
    client: *const FfiWaitlistClient,
    attempt: u32,
    result: *const FfiWaitlistResult,
) -> i64 {
    catch_unwind(|| {
        if client.is_null() || result.is_null() {
            return -1;
        }
        let client = unsafe { &*client };
        let result = unsafe { &*result };
        result
            .retry_view()
            .and_then(|err| client.policy.next_delay(attempt, &err))
            .map_or(-1, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    })
    .unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// Phone helpers
// ---------------------------------------------------------------------------

/// Prefix the dial code of `country_code` when `number` lacks it. A null or
/// unknown country leaves `number` unchanged.
///
/// Returns null if `number` is null. Free with `waitlist_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_format_phone(
    number: *const c_char,
    country_code: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        let Some(number) = (unsafe { borrow_str(number) }) else {
            return ptr::null_mut();
        };
        let code = unsafe { borrow_str(country_code) };
        c_string(phone::format_phone_number(number, code))
    })
    .unwrap_or(ptr::null_mut())
}

/// Lay the digits of `input` into the mask of `country_code`, or of the
/// country detected from `input` when `country_code` is null or unknown.
///
/// Returns null if `input` is null. Free with `waitlist_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_mask_phone(
    input: *const c_char,
    country_code: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        let Some(input) = (unsafe { borrow_str(input) }) else {
            return ptr::null_mut();
        };
        let country = unsafe { borrow_str(country_code) }
            .and_then(phone::country)
            .unwrap_or_else(|| phone::detect_country(input));
        c_string(phone::apply_mask(input, country))
    })
    .unwrap_or(ptr::null_mut())
}

/// ISO code of the country whose dial code `number` starts with, falling
/// back to the default country. Returns null if `number` is null.
/// Free with `waitlist_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_detect_country(number: *const c_char) -> *mut c_char {
    catch_unwind(|| match unsafe { borrow_str(number) } {
        Some(number) => c_string(phone::detect_country(number).code),
        None => ptr::null_mut(),
    })
    .unwrap_or(ptr::null_mut())
}

/// Whether `number` matches the dial code and digit count of `country_code`.
/// A null or unknown country only checks for 10 to 15 digits.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_validate_phone(
    number: *const c_char,
    country_code: *const c_char,
) -> bool {
    catch_unwind(|| {
        let Some(number) = (unsafe { borrow_str(number) }) else {
            return false;
        };
        phone::validate_phone_number(number, unsafe { borrow_str(country_code) })
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `waitlist_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| unsafe { FfiHttpRequest::free(req) }));
}

/// Free an `FfiWaitlistResult` returned by any `waitlist_parse_*` function or
/// `waitlist_transport_failure`. Safe to call with null. Uses `data_tag` to
/// determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_free_result(result: *mut FfiWaitlistResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| unsafe { FfiWaitlistResult::free(result) }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn waitlist_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
