//! Address literal extraction from echo response bodies
//!
//! Echo services answer with anything from a bare `203.0.113.5\n` to an HTML
//! page or a JSON object. The first dotted quad that is a real IPv4 address
//! wins; a bare IPv6 token is accepted when no IPv4 literal is present.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Dotted quad anchored at the start of a digit run. Each octet is one to
/// three ASCII digits; range is checked after matching.
static DOTTED_QUAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})")
        .unwrap_or_else(|e| panic!("invalid dotted-quad pattern: {e}"))
});

const TOKEN_SEPARATORS: &[char] = &['"', '\'', ',', '{', '}', '<', '>', '=', ';', '[', ']'];

/// Extract the first recognizable address literal from `body`
pub fn extract_address(body: &str) -> Option<IpAddr> {
    extract_ipv4(body)
        .map(IpAddr::V4)
        .or_else(|| extract_ipv6(body).map(IpAddr::V6))
}

fn extract_ipv4(body: &str) -> Option<Ipv4Addr> {
    let bytes = body.as_bytes();
    (0..bytes.len())
        .filter(|&i| bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit()))
        .find_map(|start| dotted_quad_at(body, start))
}

/// Match a dotted quad beginning at `start`
///
/// The match must not run into a further digit, and every octet must fit in
/// a byte. Leading zeros are tolerated (`203.000.113.005`).
fn dotted_quad_at(body: &str, start: usize) -> Option<Ipv4Addr> {
    let rest = &body[start..];
    let caps = DOTTED_QUAD.captures(rest)?;
    let end = caps.get(0)?.end();
    if rest.as_bytes().get(end).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let mut octets = [0u8; 4];
    for (slot, group) in octets.iter_mut().zip(caps.iter().skip(1)) {
        *slot = group?.as_str().parse().ok()?;
    }
    Some(Ipv4Addr::from(octets))
}

fn extract_ipv6(body: &str) -> Option<Ipv6Addr> {
    body.split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|token| token.contains(':'))
        .find_map(|token| token.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_bare_literal() {
        assert_eq!(extract_address("203.0.113.5\n"), v4("203.0.113.5"));
    }

    #[test]
    fn test_embedded_in_text() {
        let body = "<html><body>Current IP Address: 198.51.100.23</body></html>";
        assert_eq!(extract_address(body), v4("198.51.100.23"));

        let body = "当前 IP：203.0.113.77 来自于：中国";
        assert_eq!(extract_address(body), v4("203.0.113.77"));

        assert_eq!(extract_address("Your IP is 192.0.2.8."), v4("192.0.2.8"));
    }

    #[test]
    fn test_json_body() {
        let body = r#"{"ip":"192.0.2.44","country":"NL"}"#;
        assert_eq!(extract_address(body), v4("192.0.2.44"));
    }

    #[test]
    fn test_out_of_range_octets_are_skipped() {
        assert_eq!(extract_address("999.1.1.1 then 192.0.2.1"), v4("192.0.2.1"));
        assert_eq!(extract_address("999.1.1.1"), None);
    }

    #[test]
    fn test_quad_is_taken_from_longer_dotted_text() {
        assert_eq!(extract_address("version 1.2.3.4.5"), v4("1.2.3.4"));
        assert_eq!(extract_address("203.0.113.5..2"), v4("203.0.113.5"));
    }

    #[test]
    fn test_leading_zero_octets() {
        assert_eq!(extract_address("203.000.113.005"), v4("203.0.113.5"));
    }

    #[test]
    fn test_quad_inside_longer_digit_run_is_skipped() {
        assert_eq!(extract_address("1234.1.1.1"), None);
        assert_eq!(extract_address("1.1.1.1234"), None);
        assert_eq!(extract_address("id 91.2.3.4567 from 192.0.2.7"), v4("192.0.2.7"));
    }

    #[test]
    fn test_ipv6_literal() {
        let expected: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(extract_address("2001:db8::1\n"), Some(expected));
        assert_eq!(extract_address(r#"{"ip":"2001:db8::1"}"#), Some(expected));
    }

    #[test]
    fn test_ipv4_preferred_over_ipv6() {
        assert_eq!(extract_address("2001:db8::1 203.0.113.5"), v4("203.0.113.5"));
    }

    #[test]
    fn test_no_literal() {
        assert_eq!(extract_address("rate limited, try again later"), None);
        assert_eq!(extract_address("time: 12:30"), None);
        assert_eq!(extract_address(""), None);
    }
}
