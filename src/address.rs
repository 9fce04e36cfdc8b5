//! Syntactic validation of listen addresses.

use crate::error::{ConfigError, ConfigResult};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Kind of a well-formed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Ipv4,
    Ipv6,
}

/// Classify `address` as an IPv4 dotted quad or an IPv6 address.
///
/// Only the textual form is checked: every octet must fit in a byte, every
/// IPv6 group must be hexadecimal, and whitespace anywhere is rejected.
pub fn classify_address(address: &str) -> Option<AddressKind> {
    if Ipv4Addr::from_str(address).is_ok() {
        Some(AddressKind::Ipv4)
    } else if Ipv6Addr::from_str(address).is_ok() {
        Some(AddressKind::Ipv6)
    } else {
        None
    }
}

/// Validate the value configured for `field`.
pub fn validate_listen_address(field: &str, address: &str) -> ConfigResult<AddressKind> {
    classify_address(address).ok_or_else(|| {
        ConfigError::validation(field, format!("'{}' is not a valid IPv4 or IPv6 address", address))
    })
}
