//! Kickstart generation
//!
//! Prompts for a root password, hashes it with SHA-512 crypt, renders
//! the kickstart template into a temporary file, and derives the
//! kernel boot arguments pointing the installer at that file and at
//! the package repository. The temporary file lives until the install
//! command has finished.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use minijinja::Environment;
use sha_crypt::{Sha512Params, sha512_simple};
use tempfile::{Builder, NamedTempFile};
use tokio::fs;
use tracing::debug;

use crate::ProvisionError;
use crate::config::{InstallSource, VmConfig};
use crate::flavor::OsFamily;

/// A rendered kickstart file plus the kernel arguments that use it
#[derive(Debug)]
pub struct RenderedKickstart {
    file: NamedTempFile,
    kernel_args: String,
}

impl RenderedKickstart {
    /// Path of the rendered kickstart file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Value for the install command's extra kernel arguments
    pub fn kernel_args(&self) -> &str {
        &self.kernel_args
    }

    /// Remove the kickstart file once the installer is done with it
    pub fn remove(self) -> Result<(), ProvisionError> {
        self.file.close()?;
        Ok(())
    }
}

/// Prompt for a root password twice and return its SHA-512 crypt hash
pub fn prompt_root_password(hostname: &str) -> Result<String, ProvisionError> {
    let password = rpassword::prompt_password(format!("Root password for {}: ", hostname))?;
    let confirm = rpassword::prompt_password("Confirm: ")?;
    if password != confirm {
        return Err(ProvisionError::precondition("passwords don't match"));
    }
    hash_password(&password)
}

/// Hash a password in SHA-512 crypt form (`$6$...`)
pub fn hash_password(password: &str) -> Result<String, ProvisionError> {
    sha512_simple(password, &Sha512Params::default())
        .map_err(|e| ProvisionError::Hash(format!("{:?}", e)))
}

/// Prompt for the root password and render the kickstart
pub async fn build(config: &VmConfig) -> Result<RenderedKickstart, ProvisionError> {
    let rootpw_hash = prompt_root_password(&config.hostname)?;
    build_with_hash(config, &rootpw_hash).await
}

/// Render the kickstart for an already-computed password hash
pub async fn build_with_hash(
    config: &VmConfig,
    rootpw_hash: &str,
) -> Result<RenderedKickstart, ProvisionError> {
    let InstallSource::Location {
        location,
        repo,
        template,
        extra_args,
        ..
    } = &config.source
    else {
        return Err(ProvisionError::precondition(
            "image-based builds do not take a kickstart",
        ));
    };

    let template_content = fs::read_to_string(template).await?;
    let rendered = render_template(&template_content, &config.hostname, rootpw_hash, location)?;

    let mut file = Builder::new()
        .prefix(&format!("{}.", config.hostname))
        .suffix(".ks")
        .tempfile()?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;
    debug!("Rendered kickstart at {}", file.path().display());

    let basename = file
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kernel_args = kernel_args(
        config.family(),
        &basename,
        repo,
        extra_args.as_deref(),
    );

    Ok(RenderedKickstart { file, kernel_args })
}

/// Render a kickstart template with the standard context variables
fn render_template(
    template: &str,
    hostname: &str,
    rootpw_hash: &str,
    location: &str,
) -> Result<String, ProvisionError> {
    let mut env = Environment::new();
    env.add_template("kickstart", template)
        .map_err(|e| ProvisionError::Template(format!("parse error: {}", e)))?;

    let tmpl = env
        .get_template("kickstart")
        .map_err(|e| ProvisionError::Template(e.to_string()))?;

    let mut context: HashMap<String, minijinja::Value> = HashMap::new();
    context.insert("hostname".to_string(), hostname.into());
    context.insert("rootpw_hash".to_string(), rootpw_hash.into());
    context.insert("location".to_string(), location.into());

    tmpl.render(context)
        .map_err(|e| ProvisionError::Template(format!("render error: {}", e)))
}

/// Kernel boot arguments for the installer
///
/// Always carries the serial console plus the family-specific
/// kickstart and repository arguments; user-supplied extras go last.
pub fn kernel_args(
    family: OsFamily,
    ks_basename: &str,
    repo: &str,
    extra: Option<&str>,
) -> String {
    let mut args = vec![
        "console=ttyS0".to_string(),
        family.ks_arg(ks_basename),
        family.repo_arg(repo),
    ];
    if let Some(extra) = extra {
        args.push(extra.to_string());
    }
    args.join(" ")
}
