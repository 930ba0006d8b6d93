//! `gatectl`: remote control for a running gate over its admin API.

use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::client::{format_remaining, parse_optional_ttl, AdminClient, DEFAULT_SERVER_URL};
use crate::storage::{AccessAttempt, AllowEntry, DenyEntry};
use crate::utils::GateResult;

/// Attempts shown by the `attempts` command
const ATTEMPTS_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "gatectl")]
#[command(version, about = "Admin gate CLI")]
#[command(after_help = "TTL formats: 30m (minutes), 2h (hours), 1d (days)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Gate server URL
    #[arg(long, env = "SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    pub server: String,

    /// Admin token for API authentication
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show recent access attempts
    Attempts,

    /// Approve an attempt, optionally with a TTL
    Approve {
        attempt_id: String,
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Add an IP or CIDR block to the allowlist
    Allow {
        ip_or_cidr: String,
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Remove an IP or CIDR block from the allowlist
    Revoke { ip_or_cidr: String },

    /// Add an IP or CIDR block to the denylist
    Deny { ip_or_cidr: String },

    /// Show the current allowlist
    Allowlist,

    /// Show the current denylist
    Denylist,
}

/// Runs one CLI command against the admin API
///
/// TTL strings are validated before the client is built, so a malformed
/// TTL never reaches the network.
pub async fn run(cli: Cli) -> GateResult<()> {
    let ttl_ms = match &cli.command {
        Commands::Approve { ttl, .. } | Commands::Allow { ttl, .. } => {
            parse_optional_ttl(ttl.as_deref())?
        }
        _ => None,
    };

    let client = AdminClient::new(&cli.server, cli.token.as_deref())?;

    match cli.command {
        Commands::Attempts => {
            let attempts = client.attempts().await?;
            print!("{}", render_attempts(&attempts));
        }
        Commands::Approve { attempt_id, .. } => {
            let result = client.approve(&attempt_id, ttl_ms).await?;
            println!("Approved attempt {}", attempt_id);
            println!("IP: {}", result.entry.ip_or_cidr);
            println!("Expires: {}", format_expiry(result.entry.expires_at));
        }
        Commands::Allow { ip_or_cidr, .. } => {
            let result = client.allow(&ip_or_cidr, ttl_ms).await?;
            println!("Added to allowlist: {}", ip_or_cidr);
            println!("Expires: {}", format_expiry(result.entry.expires_at));
        }
        Commands::Revoke { ip_or_cidr } => {
            let result = client.revoke(&ip_or_cidr).await?;
            if result.removed > 0 {
                println!("Revoked: {}", ip_or_cidr);
            } else {
                println!("IP not found in allowlist: {}", ip_or_cidr);
            }
        }
        Commands::Deny { ip_or_cidr } => {
            client.deny(&ip_or_cidr).await?;
            println!("Added to denylist: {}", ip_or_cidr);
        }
        Commands::Allowlist => {
            let entries = client.allowlist().await?;
            print!("{}", render_allowlist(&entries, Utc::now().timestamp_millis()));
        }
        Commands::Denylist => {
            let entries = client.denylist().await?;
            print!("{}", render_denylist(&entries));
        }
    }

    Ok(())
}

pub fn render_attempts(attempts: &[AccessAttempt]) -> String {
    let mut out = String::from("Recent access attempts:\n\n");
    if attempts.is_empty() {
        out.push_str("No attempts logged yet.\n");
        return out;
    }

    out.push_str(&format!("{:<14}{:<16}{:<22}{}\n", "ID", "IP", "Time", "User Agent"));
    out.push_str(&format!("{}\n", "-".repeat(80)));
    let skip = attempts.len().saturating_sub(ATTEMPTS_SHOWN);
    for attempt in &attempts[skip..] {
        let time = DateTime::parse_from_rfc3339(&attempt.timestamp)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| attempt.timestamp.clone());
        let ua: String = attempt.user_agent.chars().take(30).collect();
        out.push_str(&format!(
            "{:<14}{:<16}{:<22}{}\n",
            attempt.id, attempt.ip, time, ua
        ));
    }
    out
}

pub fn render_allowlist(entries: &[AllowEntry], now: i64) -> String {
    let mut out = String::from("IP Allowlist:\n\n");
    if entries.is_empty() {
        out.push_str("No IPs in allowlist.\n");
        return out;
    }

    out.push_str(&format!("{:<20}{:<22}{:<12}{}\n", "IP/CIDR", "Added", "Expires", "Status"));
    out.push_str(&format!("{}\n", "-".repeat(70)));
    for entry in entries {
        let status = if entry.is_active(now) { "Active" } else { "Expired" };
        out.push_str(&format!(
            "{:<20}{:<22}{:<12}{}\n",
            entry.ip_or_cidr,
            format_millis(entry.added_at),
            format_remaining(entry.expires_at, now),
            status
        ));
    }
    out
}

pub fn render_denylist(entries: &[DenyEntry]) -> String {
    let mut out = String::from("IP Denylist:\n\n");
    if entries.is_empty() {
        out.push_str("No IPs in denylist.\n");
        return out;
    }

    out.push_str(&format!("{:<20}{}\n", "IP/CIDR", "Added"));
    out.push_str(&format!("{}\n", "-".repeat(40)));
    for entry in entries {
        out.push_str(&format!("{:<20}{}\n", entry.ip_or_cidr, format_millis(entry.added_at)));
    }
    out
}

fn format_expiry(expires_at: Option<i64>) -> String {
    expires_at.map(format_millis).unwrap_or_else(|| "Never".to_string())
}

fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
