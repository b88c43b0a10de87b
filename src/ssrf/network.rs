//! Address classification and name resolution.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::LazyLock;

use ipnetwork::IpNetwork;

/// Ranges no outbound request from a protected route may reach.
static PRIVATE_RANGES: LazyLock<Vec<IpNetwork>> = LazyLock::new(|| {
    [
        // RFC 1918
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        // loopback
        "127.0.0.0/8",
        "::1/128",
        // link-local, cloud metadata included
        "169.254.0.0/16",
        "fe80::/10",
        // unspecified and "this network"
        "0.0.0.0/8",
        "::/128",
        "100.64.0.0/10",
        "192.0.0.0/24",
        // documentation and benchmarking
        "192.0.2.0/24",
        "198.18.0.0/15",
        "198.51.100.0/24",
        "203.0.113.0/24",
        "2001:db8::/32",
        // reserved and broadcast
        "240.0.0.0/4",
        "255.255.255.255/32",
        // unique local
        "fc00::/7",
    ]
    .iter()
    .map(|cidr| IpNetwork::from_str(cidr).expect("static network"))
    .collect()
});

/// True for loopback, private, link-local, unspecified, documentation and
/// reserved addresses. IPv4-mapped IPv6 addresses are judged as IPv4.
pub fn is_private(ip: IpAddr) -> bool {
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    };
    PRIVATE_RANGES.iter().any(|range| range.contains(ip))
}

/// Resolve `host` to its distinct addresses, in resolver order.
pub async fn resolve(host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
    // Bracketed IPv6 literals come straight from the URL.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let mut addresses: Vec<IpAddr> = Vec::new();
    for addr in tokio::net::lookup_host((host, port)).await? {
        if !addresses.contains(&addr.ip()) {
            addresses.push(addr.ip());
        }
    }
    Ok(addresses)
}
