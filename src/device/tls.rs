use std::net::Ipv4Addr;

/// Decides, per target host, whether an invalid or self-signed certificate
/// may be accepted. Returning `false` keeps normal certificate validation.
pub type CertificatePolicy = fn(&str) -> bool;

/// Terminals on the LAN ship with self-signed certificates, so only hosts
/// given as a private IPv4 literal (10/8, 172.16/12, 192.168/16) get a pass.
pub fn private_network_only(host: &str) -> bool {
    host.parse::<Ipv4Addr>()
        .map(|ip| ip.is_private())
        .unwrap_or(false)
}

pub fn always_verify(_host: &str) -> bool {
    false
}
