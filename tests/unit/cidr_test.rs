use ipgate::core::cidr::matches;
use ipgate::core::{decide, AccessDecision};
use ipgate::storage::{AllowEntry, DenyEntry};

use crate::test_utils::random_ip;

#[test]
fn plain_specs_are_string_equality_for_random_ips() {
    for _ in 0..200 {
        let ip = random_ip();
        let other = random_ip();
        assert!(matches(&ip, &ip));
        assert_eq!(matches(&ip, &other), ip == other);
    }
}

#[test]
fn zero_prefix_matches_any_random_ip() {
    for _ in 0..200 {
        assert!(matches(&random_ip(), "0.0.0.0/0"));
    }
}

#[test]
fn full_prefix_matches_only_itself() {
    for _ in 0..200 {
        let ip = random_ip();
        let other = random_ip();
        assert!(matches(&ip, &format!("{}/32", ip)));
        assert_eq!(matches(&other, &format!("{}/32", ip)), ip == other);
    }
}

#[test]
fn deny_always_wins_for_random_ips() {
    for _ in 0..100 {
        let ip = random_ip();
        let deny = vec![DenyEntry { ip_or_cidr: ip.clone(), added_at: 0 }];
        let allow = vec![
            AllowEntry::new("0.0.0.0/0", 0, None),
            AllowEntry::new(&ip, 0, None),
        ];
        assert_eq!(decide(&ip, &deny, &allow, 1), AccessDecision::Denied);
    }
}
