//! Post-install domain reconciliation
//!
//! Cloud-init builds leave the VM holding the seed disk, usually
//! powered off by the user-data payload. After the install finishes
//! the seed disk is detached persistently and the VM is started.

use std::path::Path;

use tracing::info;

use super::run_checked;
use crate::ProvisionError;

/// virsh arguments detaching the seed disk from the domain
pub fn detach_disk_args(hostname: &str, disk: &Path) -> Vec<String> {
    vec![
        "detach-disk".to_string(),
        hostname.to_string(),
        disk.display().to_string(),
        "--persistent".to_string(),
    ]
}

/// virsh arguments starting the domain
pub fn start_args(hostname: &str) -> Vec<String> {
    vec!["start".to_string(), hostname.to_string()]
}

/// Persistently detach the seed disk from the domain
pub async fn detach_disk(hostname: &str, disk: &Path) -> Result<(), ProvisionError> {
    info!("Detaching {} from {}", disk.display(), hostname);
    run_checked("virsh", detach_disk_args(hostname, disk)).await
}

/// Start the domain
pub async fn start(hostname: &str) -> Result<(), ProvisionError> {
    info!("Starting {}", hostname);
    run_checked("virsh", start_args(hostname)).await
}
