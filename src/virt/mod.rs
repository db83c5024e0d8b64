//! External command plumbing for the virt toolchain
//!
//! Every step that leaves this process goes through here: lease
//! registration and domain management via `virsh`, VM creation via
//! `virt-install`, and the filesystem-image tools the seed builder
//! shells out to.

pub mod domain;
pub mod install;
pub mod network;

use std::ffi::OsStr;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::ProvisionError;

/// Run an external command to completion, treating non-zero exit as an
/// error
///
/// Output is captured; stderr is logged at warn level when the command
/// fails, stdout at debug level otherwise.
pub async fn run_checked<I, S>(program: &str, args: I) -> Result<(), ProvisionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();
    debug!(
        "Running {} {}",
        program,
        args.iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(program)
        .args(&args)
        .output()
        .await
        .map_err(|e| ProvisionError::spawn(program, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("{} stderr: {}", program, stderr.trim_end());
        }
        return Err(ProvisionError::command(
            program,
            output.status.code().unwrap_or(-1),
        ));
    }

    if !output.stdout.is_empty() {
        debug!("{} stdout: {}", program, String::from_utf8_lossy(&output.stdout));
    }

    Ok(())
}
