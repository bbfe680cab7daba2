use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

/// Baseline headers for every response. Framing is refused through the CSP
/// `frame-ancestors 'none'` directive, which supersedes `X-Frame-Options`, so
/// the legacy header is not sent. API answers are additionally marked
/// `no-store`: they carry user questions and model output.
pub async fn apply(req: Request, next: Next) -> Response {
    let is_api = req.uri().path().starts_with("/api/");
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("frame-ancestors 'none'"),
    );
    if is_api {
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }
    response
}
