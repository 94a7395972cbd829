//! Local address discovery.
//!
//! Players join from phones on the same network, so the host display needs
//! a URL it can put on screen. Enumerates non-internal IPv4 interfaces and
//! prefers private-range addresses for the advertised join URL.

use std::net::IpAddr;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddress {
    pub name: String,
    pub address: String,
}

/// Non-internal IPv4 interfaces, private ranges first.
pub fn list_addresses() -> Vec<NetworkAddress> {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to enumerate network interfaces");
            return Vec::new();
        }
    };

    let mut addresses: Vec<(bool, NetworkAddress)> = interfaces
        .into_iter()
        .filter_map(|(name, ip)| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_link_local() => Some((
                v4.is_private(),
                NetworkAddress {
                    name,
                    address: v4.to_string(),
                },
            )),
            _ => None,
        })
        .collect();

    addresses.sort_by_key(|(private, _)| !*private);
    addresses.into_iter().map(|(_, address)| address).collect()
}

/// The URL players type (or scan) to reach the join page.
pub fn join_url(port: u16) -> Option<String> {
    list_addresses()
        .first()
        .map(|a| format!("http://{}:{}/play", a.address, port))
}
