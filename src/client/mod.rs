//! Admin API client for the IP gate service.
//! Used by the `gatectl` CLI to drive a running gate remotely.

mod admin_client;
mod ttl;

pub use admin_client::{AdminClient, EntryResponse, RevokeResponse, DEFAULT_SERVER_URL};
pub use ttl::{format_remaining, parse_optional_ttl, parse_ttl};
