//! Utility modules for the IP gate service.
//! This module contains logging setup and the domain error type.

mod logging;
mod error;

pub use logging::{
    init_logging,
    create_request_span,
    log_access_decision,
    log_admin_event,
    log_store_event,
};

pub use error::{GateError, GateResult};
