#[path = "../test_utils.rs"]
mod test_utils;

mod cidr_test;
mod rate_limiter_test;
