use std::net::{IpAddr, Ipv4Addr};

/// Returns true when `ip` equals `spec`, or when `spec` is an IPv4 CIDR block containing `ip`
///
/// Specs without a `/` are compared as plain strings. CIDR matching is
/// IPv4-only; IPv6 blocks, malformed addresses and prefixes outside
/// `0..=32` never match.
pub fn matches(ip: &str, spec: &str) -> bool {
    let Some((network, prefix)) = spec.split_once('/') else {
        return ip == spec;
    };

    let (Ok(ip), Ok(network), Ok(prefix)) = (
        ip.parse::<Ipv4Addr>(),
        network.parse::<Ipv4Addr>(),
        prefix.parse::<u32>(),
    ) else {
        return false;
    };

    if prefix > 32 {
        return false;
    }

    let mask = prefix_mask(prefix);
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

/// Whether `spec` is something the allow/deny lists can hold
///
/// Accepts any IPv4 or IPv6 literal, or an IPv4 CIDR block.
pub fn is_valid_spec(spec: &str) -> bool {
    match spec.split_once('/') {
        None => spec.parse::<IpAddr>().is_ok(),
        Some((network, prefix)) => {
            network.parse::<Ipv4Addr>().is_ok()
                && prefix.parse::<u32>().map(|p| p <= 32).unwrap_or(false)
        }
    }
}

fn prefix_mask(prefix: u32) -> u32 {
    u32::MAX.checked_shl(32 - prefix).unwrap_or(0)
}
