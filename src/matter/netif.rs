//! Network interface selection for the Matter transport.
//!
//! The default UnixNetifs implementation reports every interface, including
//! Thread mesh addresses visible via mDNS reflection that don't belong to this
//! host. Everything here is pinned to one interface instead: either the
//! configured one or the first running, non-loopback interface with an IPv4
//! address.

use std::ffi::CString;
use std::net::{Ipv4Addr, Ipv6Addr};

use log::{debug, warn};
use nix::ifaddrs::getifaddrs;
use nix::net::if_::{InterfaceFlags, if_nametoindex};
use nix::sys::socket::{AddressFamily, SockaddrLike};

use rs_matter::dm::clusters::gen_diag::{InterfaceTypeEnum, NetifDiag, NetifInfo};
use rs_matter::dm::networks::NetChangeNotif;
use rs_matter::error::Error;

use crate::error::MonitorError;

/// Addresses found on one interface.
#[derive(Debug, Default, Clone)]
pub struct InterfaceAddresses {
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
    pub hw_addr: [u8; 8],
    pub operational: bool,
}

/// Link-local IPv6 (fe80::/10) is not useful for Matter.
fn is_link_local(ip: &Ipv6Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 0xfe && (octets[1] & 0xc0) == 0x80
}

/// Collect the addresses of `interface_name`. Returns `None` if it doesn't exist.
pub fn interface_addresses(
    interface_name: &str,
) -> crate::error::Result<Option<InterfaceAddresses>> {
    let addrs = getifaddrs().map_err(|e| {
        MonitorError::TransportUnavailable(format!("failed to list interfaces: {}", e))
    })?;

    let mut found = false;
    let mut result = InterfaceAddresses::default();

    for ifaddr in addrs {
        if ifaddr.interface_name != interface_name {
            continue;
        }
        found = true;

        if ifaddr.flags.contains(InterfaceFlags::IFF_RUNNING) {
            result.operational = true;
        }

        if let Some(addr) = ifaddr.address
            && let Some(family) = addr.family()
        {
            match family {
                AddressFamily::Inet => {
                    if let Some(sockaddr) = addr.as_sockaddr_in() {
                        result.ipv4.push(sockaddr.ip());
                    }
                }
                AddressFamily::Inet6 => {
                    if let Some(sockaddr) = addr.as_sockaddr_in6() {
                        let ip = sockaddr.ip();
                        if !is_link_local(&ip) {
                            result.ipv6.push(ip);
                        }
                    }
                }
                AddressFamily::Packet => {
                    if let Some(link_addr) = addr.as_link_addr()
                        && let Some(mac) = link_addr.addr()
                    {
                        let len = mac.len().min(8);
                        result.hw_addr[..len].copy_from_slice(&mac[..len]);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(found.then_some(result))
}

/// Get the interface index for a network interface name.
pub fn interface_index(interface_name: &str) -> crate::error::Result<u32> {
    let cname = CString::new(interface_name).map_err(|_| {
        MonitorError::TransportUnavailable(format!("invalid interface name: {}", interface_name))
    })?;
    if_nametoindex(cname.as_c_str()).map_err(|e| {
        MonitorError::TransportUnavailable(format!(
            "no index for interface '{}': {}",
            interface_name, e
        ))
    })
}

/// Pick the first running, non-loopback interface that has an IPv4 address.
pub fn detect_interface() -> Option<String> {
    let addrs = getifaddrs().ok()?;
    for ifaddr in addrs {
        if ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK)
            || !ifaddr.flags.contains(InterfaceFlags::IFF_RUNNING)
        {
            continue;
        }
        if let Some(addr) = ifaddr.address
            && addr.family() == Some(AddressFamily::Inet)
        {
            debug!("Auto-detected network interface '{}'", ifaddr.interface_name);
            return Some(ifaddr.interface_name);
        }
    }
    None
}

/// A network interface implementation that only returns addresses from a specific interface.
#[derive(Clone, Copy)]
pub struct FilteredNetifs {
    interface_name: &'static str,
}

impl FilteredNetifs {
    pub const fn new(interface_name: &'static str) -> Self {
        Self { interface_name }
    }
}

impl NetifDiag for FilteredNetifs {
    fn netifs(&self, f: &mut dyn FnMut(&NetifInfo) -> Result<(), Error>) -> Result<(), Error> {
        let addresses = match interface_addresses(self.interface_name) {
            Ok(Some(addresses)) => addresses,
            Ok(None) => {
                warn!(
                    "FilteredNetifs: interface '{}' not found",
                    self.interface_name
                );
                return Ok(());
            }
            Err(e) => {
                warn!("FilteredNetifs: {}", e);
                return Ok(());
            }
        };

        let netif_index = interface_index(self.interface_name).unwrap_or(0);

        let info = NetifInfo {
            name: self.interface_name,
            operational: addresses.operational,
            offprem_svc_reachable_ipv4: None,
            offprem_svc_reachable_ipv6: None,
            hw_addr: &addresses.hw_addr,
            ipv4_addrs: &addresses.ipv4,
            ipv6_addrs: &addresses.ipv6,
            netif_type: InterfaceTypeEnum::Ethernet,
            netif_index,
        };

        f(&info)
    }
}

impl NetChangeNotif for FilteredNetifs {
    async fn wait_changed(&self) {
        // Address changes are not tracked
        core::future::pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_local_detection() {
        assert!(is_link_local(&"fe80::1".parse().unwrap()));
        assert!(is_link_local(&"febf::1".parse().unwrap()));
        assert!(!is_link_local(&"fd00::1".parse().unwrap()));
        assert!(!is_link_local(&"2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_missing_interface() {
        let result = interface_addresses("definitely-not-an-interface0").unwrap();
        assert!(result.is_none());
    }
}
