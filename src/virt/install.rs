//! VM creation via virt-install
//!
//! Argument assembly is a pure function of the resolved configuration
//! and the built artifacts, so it can be checked without touching a
//! hypervisor. Execution inherits stdio because the install runs on
//! the serial console.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::ProvisionError;
use crate::config::{InstallSource, VmConfig};
use crate::kickstart::RenderedKickstart;
use crate::seed::SeedImage;

/// Assemble the ordered virt-install argument list
pub fn build_args(
    config: &VmConfig,
    kickstart: Option<&RenderedKickstart>,
    seed: Option<&SeedImage>,
) -> Vec<String> {
    let mut args = vec![
        "--name".to_string(),
        config.hostname.clone(),
        "--memory".to_string(),
        config.memory.to_string(),
        "--vcpus".to_string(),
        config.vcpus.to_string(),
        "--network".to_string(),
        format!("model=virtio,bridge={},mac={}", config.bridge, config.mac),
        "--disk".to_string(),
        primary_disk(config),
        "--graphics".to_string(),
        "none".to_string(),
        "--os-variant".to_string(),
        config.os_variant.clone(),
    ];

    if let InstallSource::Location { location, .. } = &config.source {
        args.push("--location".to_string());
        args.push(location.clone());
    }

    if let Some(seed) = seed {
        args.push("--disk".to_string());
        args.push(seed.disk_arg());
    }

    if let Some(ks) = kickstart {
        args.push("--initrd-inject".to_string());
        args.push(ks.path().display().to_string());
        args.push("--extra-args".to_string());
        args.push(ks.kernel_args().to_string());
    }

    if let InstallSource::Image { .. } = &config.source {
        args.push("--import".to_string());
    }

    if config.noreboot {
        args.push("--noreboot".to_string());
    }

    args
}

fn primary_disk(config: &VmConfig) -> String {
    match &config.source {
        InstallSource::Location { disk_size, .. } => format!("size={},bus=virtio", disk_size),
        InstallSource::Image { path } => format!("path={},bus=virtio", path.display()),
    }
}

/// Create the VM, inheriting stdio so the serial console is usable
pub async fn run(
    config: &VmConfig,
    kickstart: Option<&RenderedKickstart>,
    seed: Option<&SeedImage>,
) -> Result<(), ProvisionError> {
    let args = build_args(config, kickstart, seed);
    info!("Creating VM {}", config.hostname);
    debug!("virt-install {}", args.join(" "));

    let status = Command::new("virt-install")
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| ProvisionError::spawn("virt-install", e.to_string()))?;

    if !status.success() {
        return Err(ProvisionError::command(
            "virt-install",
            status.code().unwrap_or(-1),
        ));
    }

    Ok(())
}
