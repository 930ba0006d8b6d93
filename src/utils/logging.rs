use std::env;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::core::AccessDecision;

/// Initialize the logging system with the level taken from `RUST_LOG`
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_logging() {
    // Get the log level from environment variable or default to INFO
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Create a new span for tracking request context
pub fn create_request_span(ip: &str) -> tracing::Span {
    tracing::info_span!(
        "gate_request",
        ip = %ip,
        timestamp = %chrono::Utc::now()
    )
}

/// Log the outcome of a gate evaluation
pub fn log_access_decision(ip: &str, decision: AccessDecision) {
    match decision {
        AccessDecision::Denied => tracing::warn!(
            ip = %ip,
            event = "access_denied",
            timestamp = %chrono::Utc::now()
        ),
        AccessDecision::Allowed => tracing::info!(
            ip = %ip,
            event = "access_allowed",
            timestamp = %chrono::Utc::now()
        ),
        AccessDecision::NotAllowed => tracing::info!(
            ip = %ip,
            event = "access_pending",
            timestamp = %chrono::Utc::now()
        ),
    }
}

/// Log an admin action against the lists
pub fn log_admin_event(action: &str, success: bool, details: Option<&str>) {
    if success {
        tracing::info!(
            event = "admin_action",
            action = %action,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    } else {
        tracing::error!(
            event = "admin_action",
            action = %action,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    }
    metrics::increment_counter!("gate_admin_actions_total", "action" => action.to_string());
}

/// Log a list store event (backups, fail-soft loads, saves)
pub fn log_store_event(event_type: &str, success: bool, details: Option<&str>) {
    if success {
        tracing::debug!(
            event_type = %event_type,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    } else {
        tracing::warn!(
            event_type = %event_type,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    }
}
