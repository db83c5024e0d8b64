//! Static network lease registration
//!
//! Registers a DHCP host mapping and a DNS host mapping for the
//! generated MAC against the libvirt `default` network, before the VM
//! is created. Either registration failing aborts the run.

use std::net::Ipv4Addr;

use tracing::info;

use super::run_checked;
use crate::ProvisionError;
use crate::config::VmConfig;

/// Generate a locally administered MAC address in the KVM range
pub fn generate_mac() -> String {
    let bytes: [u8; 3] = rand::random();
    format!(
        "52:54:00:{:02x}:{:02x}:{:02x}",
        bytes[0], bytes[1], bytes[2]
    )
}

/// XML fragment registering the DHCP host entry
pub fn dhcp_host_xml(mac: &str, hostname: &str, ip: Ipv4Addr) -> String {
    format!("<host mac='{}' name='{}' ip='{}'/>", mac, hostname, ip)
}

/// XML fragment registering the DNS host entry
pub fn dns_host_xml(hostname: &str, ip: Ipv4Addr) -> String {
    format!("<host ip='{}'><hostname>{}</hostname></host>", ip, hostname)
}

/// Register the static DHCP and DNS lease for the VM
pub async fn register_lease(config: &VmConfig, ip: Ipv4Addr) -> Result<(), ProvisionError> {
    info!(
        "Registering static lease {} -> {} on network 'default'",
        config.hostname, ip
    );

    let dhcp = dhcp_host_xml(&config.mac, &config.hostname, ip);
    run_checked(
        "virsh",
        [
            "net-update",
            "default",
            "add",
            "ip-dhcp-host",
            dhcp.as_str(),
            "--live",
            "--config",
        ],
    )
    .await?;

    let dns = dns_host_xml(&config.hostname, ip);
    run_checked(
        "virsh",
        [
            "net-update",
            "default",
            "add",
            "dns-host",
            dns.as_str(),
            "--live",
            "--config",
        ],
    )
    .await?;

    Ok(())
}
