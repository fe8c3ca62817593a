use crate::config::parse_bool_env;
use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::{env, sync::OnceLock};

// JSON API plus the Swagger UI, which needs inline script and style.
const DEFAULT_CSP: &str = "default-src 'none'; frame-ancestors 'none'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'";
const HSTS: &str = "max-age=31536000; includeSubDomains";

type HeaderSet = Vec<(HeaderName, HeaderValue)>;

/// Headers stamped on every response, resolved once from the environment.
fn header_set() -> &'static HeaderSet {
    static HEADERS: OnceLock<HeaderSet> = OnceLock::new();
    HEADERS.get_or_init(|| {
        build_header_set(
            env::var("CSP_POLICY").ok().as_deref(),
            parse_bool_env("ENABLE_HSTS", true),
        )
    })
}

fn build_header_set(csp: Option<&str>, hsts: bool) -> HeaderSet {
    let csp = match csp.map(HeaderValue::from_str) {
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            tracing::warn!("Ignoring invalid CSP_POLICY: {}", err);
            HeaderValue::from_static(DEFAULT_CSP)
        }
        None => HeaderValue::from_static(DEFAULT_CSP),
    };

    let mut set = vec![
        (header::CONTENT_SECURITY_POLICY, csp),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
    ];
    if hsts {
        set.push((
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        ));
    }
    set
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in header_set() {
        headers.insert(name.clone(), value.clone());
    }
    response
}
