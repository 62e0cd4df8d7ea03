// # Local Address Lookup
//
// This crate finds the host's own (usually private) interface address.
//
// ## Selection
//
// Interfaces are enumerated with `local-ip-address`. Loopback addresses and
// addresses of the other family are skipped; the first remaining address is
// returned. When nothing qualifies the family's fallback literal is
// returned instead of an error:
//
// - IPv4: `127.0.0.1`
// - IPv6: `fe80::1`

use ipseek_core::{Error, IpFamily, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Returned for IPv4 when no interface qualifies
pub const FALLBACK_V4: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Returned for IPv6 when no interface qualifies
pub const FALLBACK_V6: IpAddr = IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1));

/// Fallback literal for a family
pub fn fallback_address(family: IpFamily) -> IpAddr {
    match family {
        IpFamily::V4 => FALLBACK_V4,
        IpFamily::V6 => FALLBACK_V6,
    }
}

/// Pick the first non-loopback address of `family`
///
/// # Parameters
///
/// - `interfaces`: (interface name, address) pairs in enumeration order
/// - `family`: Address family to select
pub fn select_address(interfaces: &[(String, IpAddr)], family: IpFamily) -> IpAddr {
    interfaces
        .iter()
        .filter(|(_, ip)| family.matches(ip))
        .find(|(name, ip)| {
            if ip.is_loopback() {
                tracing::debug!("Skipping loopback interface {}: {}", name, ip);
                return false;
            }
            true
        })
        .map(|(name, ip)| {
            tracing::debug!("Using interface {}: {}", name, ip);
            *ip
        })
        .unwrap_or_else(|| fallback_address(family))
}

/// Resolve the local address for `family`
///
/// # Returns
///
/// - `Ok(IpAddr)`: First qualifying interface address, or the fallback literal
/// - `Err(Error::Interface)`: Interfaces could not be enumerated
pub fn resolve_local_address(family: IpFamily) -> Result<IpAddr> {
    let interfaces = local_ip_address::list_afinet_netifas()
        .map_err(|e| Error::interface(format!("Failed to list interfaces: {}", e)))?;

    Ok(select_address(&interfaces, family))
}

/// Resolve the local address for an IP version number
///
/// Fails with `Error::InvalidArgument` unless `version` is 4 or 6.
pub fn resolve_local_address_for(version: u8) -> Result<IpAddr> {
    let family = IpFamily::try_from(version)?;
    resolve_local_address(family)
}
