//! virt-kickstart-rs library
//!
//! Provisions libvirt VMs in one linear pass: resolve options,
//! optionally register a static network lease, build the install data
//! (rendered kickstart or cloud-init seed image), create the VM with
//! virt-install, then clean up and reconcile.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`#![forbid(unsafe_code)]`)
//! - **Delegate the heavy lifting**: disk images, domains, and installs
//!   belong to `mkfs.vfat`/`mcopy`, `virsh`, and `virt-install`
//! - **Fail fast**: any external command failure aborts the run

pub mod config;
pub mod flavor;
pub mod kickstart;
pub mod seed;
pub mod virt;

mod error;

pub use error::ProvisionError;

use tracing::{debug, info};

use config::{InstallSource, ProvisionOpts, VmConfig};
use seed::SeedImage;

/// Provision one VM, end to end
pub async fn provision(opts: &ProvisionOpts) -> Result<(), ProvisionError> {
    let config = config::resolve(opts).await?;
    debug!("Resolved configuration: {:?}", config);

    if let Some(ip) = config.static_ip {
        virt::network::register_lease(&config, ip).await?;
    }

    let seed = match &config.cloud_init {
        Some(files) => Some(SeedImage::build(&config.hostname, files).await?),
        None => None,
    };

    let ks = match &config.source {
        InstallSource::Location { .. } => Some(kickstart::build(&config).await?),
        InstallSource::Image { .. } => None,
    };

    let install_result = virt::install::run(&config, ks.as_ref(), seed.as_ref()).await;

    // The installer is done with the kickstart whether or not it
    // succeeded; an install failure stays the reported error.
    let ks_cleanup = match ks {
        Some(ks) => ks.remove(),
        None => Ok(()),
    };
    install_result?;
    ks_cleanup?;

    if let Some(seed) = seed {
        reconcile_cloud_init(&config, seed).await?;
    }

    info!("Provisioned {}", config.hostname);
    Ok(())
}

/// Detach the seed disk, drop its file, and start the VM
///
/// Cloud-init user-data commonly powers the VM off at first boot, so
/// the start step is unconditional. The seed file is only removed
/// after a successful detach; until then the domain definition still
/// references it.
async fn reconcile_cloud_init(config: &VmConfig, seed: SeedImage) -> Result<(), ProvisionError> {
    virt::domain::detach_disk(&config.hostname, seed.path()).await?;
    seed.remove().await?;
    virt::domain::start(&config.hostname).await
}
