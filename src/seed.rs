//! Cloud-init seed image construction
//!
//! Builds the small FAT volume cloud-init reads at first boot: a 1 MiB
//! file labeled `cidata` holding the caller's files under the fixed
//! names `meta-data` and `user-data`. The image is attached to the VM
//! as a second virtio disk and must outlive this process: it is only
//! removed after the post-install detach succeeds, since the domain
//! definition references it until then.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tokio::fs;
use tracing::{debug, info};

use crate::ProvisionError;
use crate::config::CloudInitFiles;
use crate::virt::run_checked;

/// Seed volume size; plenty for the two files it carries
const SEED_IMAGE_SIZE: u64 = 1024 * 1024;

/// A built cloud-init seed image on disk
#[derive(Debug)]
pub struct SeedImage {
    path: PathBuf,
}

impl SeedImage {
    /// Build the seed image for a VM
    pub async fn build(hostname: &str, files: &CloudInitFiles) -> Result<Self, ProvisionError> {
        let path = allocate(hostname)?;
        info!("Building cloud-init seed image at {}", path.display());

        let img = path.as_os_str();
        run_checked("mkfs.vfat", [img]).await?;
        run_checked("mlabel", [OsStr::new("-i"), img, OsStr::new("::cidata")]).await?;
        run_checked(
            "mcopy",
            [
                OsStr::new("-i"),
                img,
                files.meta_data.as_os_str(),
                OsStr::new("::meta-data"),
            ],
        )
        .await?;
        run_checked(
            "mcopy",
            [
                OsStr::new("-i"),
                img,
                files.user_data.as_os_str(),
                OsStr::new("::user-data"),
            ],
        )
        .await?;

        Ok(Self { path })
    }

    /// Wrap an already-built seed image
    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the seed image file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disk descriptor attaching the image to the VM
    pub fn disk_arg(&self) -> String {
        format!("path={},bus=virtio", self.path.display())
    }

    /// Remove the image file, once nothing references it anymore
    pub async fn remove(self) -> Result<(), ProvisionError> {
        debug!("Removing seed image {}", self.path.display());
        fs::remove_file(&self.path).await?;
        Ok(())
    }
}

/// Allocate the empty seed file next to the other temporary files
fn allocate(hostname: &str) -> Result<PathBuf, ProvisionError> {
    let file = Builder::new()
        .prefix(&format!("{}.", hostname))
        .suffix(".cidata")
        .tempfile()?;
    // Persist it; the domain keeps referencing the file until the
    // post-install detach.
    let (file, path) = file.keep().map_err(|e| ProvisionError::Io(e.error))?;
    file.set_len(SEED_IMAGE_SIZE)?;
    Ok(path)
}
