//! IP allow/deny gate with an operator approval workflow.
//!
//! Visitors reaching the gate are checked against a deny list and an allow
//! list of IPs and IPv4 CIDR blocks. Unknown visitors are logged as access
//! attempts that an operator can approve through the admin API or `gatectl`.

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod service;
pub mod storage;
pub mod utils;
