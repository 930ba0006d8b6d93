use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::Instrument;

use super::{AppState, ClientIp};
use crate::core::AccessDecision;
use crate::utils::create_request_span;

/// Public gate: success page, denied, or a pending page with a fresh attempt id
pub async fn gate(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .filter(|ua| !ua.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let span = create_request_span(&ip);
    async move {
        match state.service.evaluate(&ip).await {
            AccessDecision::Denied => (StatusCode::FORBIDDEN, "Access denied.").into_response(),
            AccessDecision::Allowed => Html(success_page(&ip)).into_response(),
            AccessDecision::NotAllowed => match state.service.record_attempt(&ip, &user_agent).await {
                Ok(attempt) => {
                    (StatusCode::FORBIDDEN, Html(pending_page(&attempt.id, &ip))).into_response()
                }
                Err(e) => {
                    tracing::error!(error = %e, "gate request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
                }
            },
        }
    }
    .instrument(span)
    .await
}

fn success_page(ip: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Admin Gate</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }}
    .success {{ color: #059669; background: #d1fae5; padding: 20px; border-radius: 8px; }}
  </style>
</head>
<body>
  <div class="success">
    <h1>Gate Passed</h1>
    <p>Your IP {ip} is approved for admin access.</p>
  </div>
</body>
</html>
"#,
        ip = escape_html(ip)
    )
}

fn pending_page(attempt_id: &str, ip: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Pending Approval</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; background: #fefce8; }}
    .pending {{ background: #fef3c7; border: 1px solid #f59e0b; padding: 20px; border-radius: 8px; }}
    .code {{ font-family: monospace; background: white; padding: 8px; border-radius: 4px; margin: 10px 0; }}
  </style>
</head>
<body>
  <div class="pending">
    <h1>Pending Approval</h1>
    <p>Your access request has been logged.</p>
    <p><strong>Attempt ID:</strong> <span class="code">{id}</span></p>
    <p><strong>Your IP:</strong> <span class="code">{ip}</span></p>
    <p>Ask the admin to approve this attempt and refresh the page.</p>
  </div>
</body>
</html>
"#,
        id = escape_html(attempt_id),
        ip = escape_html(ip)
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_values_are_escaped_in_pages() {
        let page = pending_page("abc", "<script>alert(1)</script>");
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("abc"));
    }
}
