use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>, code: i32) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{err:#}");
    std::process::exit(code);
}

/// Exit code for an HTTP status.
///
/// 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
/// 3=connection error, 4=usage error
pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Send a request to the relay, print the JSON response and return the exit
/// code. Success goes to stdout, anything else to stderr.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> i32 {
    let url = match reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/'))) {
        Ok(u) => u,
        Err(e) => {
            eprintln!(
                "{:#}",
                json!({
                    "error": "cli_error",
                    "message": format!("Invalid URL: {api_url}{path}: {e}")
                })
            );
            return 4;
        }
    };

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!(
                "{:#}",
                json!({
                    "error": "connection_error",
                    "message": format!("{e}"),
                    "docs_hint": "Is the relay running? Check WIPOWISE_API_URL."
                })
            );
            return 3;
        }
    };

    let exit_code = exit_code_for_status(resp.status().as_u16());
    let resp_body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };

    if exit_code == 0 {
        println!("{resp_body:#}");
    } else {
        eprintln!("{resp_body:#}");
    }
    exit_code
}
