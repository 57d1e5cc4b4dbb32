//! Drive the C ABI the way a foreign host would: build a request, execute it
//! with the host's own HTTP stack (ureq here), parse the response and ask
//! the library whether to retry.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::time::Duration;

use mock_server::{app_with_handle, serve, MockHandle};
use waitlist_ffi::types::{
    FfiDataTag, FfiErrorCode, FfiHttpMethod, FfiHttpRequest, FfiHttpResponse, FfiSignupResponse,
    FfiWaitlistClient, FfiWaitlistResult,
};
use waitlist_ffi::*;

const KEY: &str = "wl_host";

fn spawn_mock() -> (String, MockHandle) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let (router, handle) = app_with_handle(KEY);

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            serve(listener, router).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), handle)
}

fn read(p: *const c_char) -> String {
    unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
}

/// What the host's HTTP stack returns: a status and body, or a failure text.
fn execute(req: &FfiHttpRequest) -> Result<(u16, CString), String> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_millis(req.timeout_ms)))
        .build()
        .new_agent();
    let url = read(req.url);

    let headers: Vec<(String, String)> = (0..req.headers_len as usize)
        .map(|i| {
            let h = unsafe { &*req.headers.add(i) };
            (read(h.key), read(h.value))
        })
        .collect();

    let result = match req.method {
        FfiHttpMethod::Get => {
            let mut b = agent.get(&url);
            for (k, v) in &headers {
                b = b.header(k, v);
            }
            b.call()
        }
        FfiHttpMethod::Post => {
            let mut b = agent.post(&url);
            for (k, v) in &headers {
                b = b.header(k, v);
            }
            if req.body.is_null() {
                b.send_empty()
            } else {
                b.send(read(req.body).as_bytes())
            }
        }
    };
    let mut response = result.map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok((status, CString::new(body).unwrap()))
}

type ParseFn = extern "C" fn(*const FfiWaitlistClient, *const FfiHttpResponse) -> *mut FfiWaitlistResult;

/// The loop a host writes around the library. Returns the final result
/// and the number of attempts made; delays are recorded instead of slept.
fn run(
    client: *const FfiWaitlistClient,
    req: *mut FfiHttpRequest,
    parse: ParseFn,
) -> (*mut FfiWaitlistResult, u32, Vec<i64>) {
    let mut attempt = 1;
    let mut delays = Vec::new();
    loop {
        let result = match execute(unsafe { &*req }) {
            Ok((status, body)) => {
                let response = FfiHttpResponse {
                    status,
                    body: body.as_ptr(),
                };
                parse(client, &response)
            }
            Err(message) => {
                let message = CString::new(message).unwrap();
                waitlist_transport_failure(message.as_ptr())
            }
        };
        let delay = waitlist_retry_delay_ms(client, attempt, result);
        if delay < 0 {
            waitlist_free_request(req);
            return (result, attempt, delays);
        }
        delays.push(delay);
        waitlist_free_result(result);
        attempt += 1;
    }
}

fn new_client(base_url: &str) -> *mut FfiWaitlistClient {
    let key = CString::new(KEY).unwrap();
    let url = CString::new(base_url).unwrap();
    let client = waitlist_client_new(key.as_ptr(), url.as_ptr());
    assert!(!client.is_null());
    client
}

#[test]
fn host_signs_up_after_server_errors() {
    let (base_url, handle) = spawn_mock();
    let client = new_client(&base_url);
    handle.fail_next(503);
    handle.fail_next(500);

    let email = CString::new("ada@example.com").unwrap();
    let name = CString::new("Ada").unwrap();
    let req = waitlist_build_signup(
        client,
        email.as_ptr(),
        name.as_ptr(),
        ptr::null(),
        ptr::null(),
        0,
        ptr::null(),
        ptr::null(),
    );
    assert!(!req.is_null());

    let (result, attempts, delays) = run(client, req, waitlist_parse_signup);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::Signup);
    let data = unsafe { &*(r.data as *const FfiSignupResponse) };
    assert_eq!(read(data.entry.email), "ada@example.com");
    assert_eq!(data.entry.position, 1);

    assert_eq!(attempts, 3);
    assert_eq!(delays, vec![2000, 4000]);
    assert_eq!(handle.hits("/api/v1/signup"), 3);

    waitlist_free_result(result);
    waitlist_client_free(client);
}

#[test]
fn host_stops_on_client_error() {
    let (base_url, handle) = spawn_mock();
    let client = new_client(&base_url);

    let token = CString::new("missing").unwrap();
    let req = waitlist_build_verify_email(client, token.as_ptr());
    let (result, attempts, delays) = run(client, req, waitlist_parse_verify_email);

    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Api);
    assert_eq!(r.http_status, 404);
    assert_eq!(read(r.error), "invalid_token");
    assert_eq!(attempts, 1);
    assert!(delays.is_empty());
    assert_eq!(handle.hits("/api/v1/verify"), 1);

    waitlist_free_result(result);
    waitlist_client_free(client);
}

#[test]
fn host_reports_unreachable_server_as_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = new_client(&format!("http://{addr}"));

    let req = waitlist_build_project_info(client);
    let (result, attempts, delays) = run(client, req, waitlist_parse_project_info);

    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Transport);
    assert_eq!(r.http_status, 0);
    assert_eq!(read(r.error), "Request failed");
    assert_eq!(attempts, 3);
    assert_eq!(delays, vec![2000, 4000]);

    waitlist_free_result(result);
    waitlist_client_free(client);
}
