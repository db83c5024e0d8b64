//! Command line options and provisioning configuration
//!
//! Resolves explicit flags, the flavor table, and config-file defaults
//! into one immutable [`VmConfig`] for the rest of the run. Precedence
//! per field: explicit flag > flavor table > config file > built-in
//! default.

pub mod loader;

pub use loader::{ToolConfig, ToolDefaults};

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};

use crate::ProvisionError;
use crate::flavor::{self, OsFamily};
use crate::virt::network::generate_mac;

pub const DEFAULT_MEMORY: u32 = 4096;
pub const DEFAULT_VCPUS: u32 = 1;
pub const DEFAULT_DISK_SIZE: u32 = 20;
pub const DEFAULT_BRIDGE: &str = "virbr0";
pub const DEFAULT_FLAVOR: &str = "alma9";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/virt-kickstart-rs/config.yaml";
pub const DEFAULT_TEMPLATE_DIR: &str = "/usr/share/virt-kickstart-rs/templates";

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(name = "virt-kickstart-rs")]
#[command(author, version)]
#[command(about = "Provision libvirt VMs from kickstart templates or cloud-init seed images")]
pub struct ProvisionOpts {
    /// Bridge for the VM network interface
    #[arg(short = 'b', long)]
    pub bridge: Option<String>,

    /// Build and attach a cloud-init seed disk
    #[arg(short = 'C', long = "cloud-init")]
    pub cloud_init: bool,

    /// Virtual CPU count
    #[arg(short = 'c', long = "cpus", value_name = "N")]
    pub cpus: Option<u32>,

    /// Primary disk size in GB
    #[arg(short = 'd', long = "disk-size", value_name = "GB")]
    pub disk_size: Option<u32>,

    /// OS flavor supplying os-variant/location/template defaults
    #[arg(short = 'F', long, value_name = "NAME")]
    pub flavor: Option<String>,

    /// Register a static DHCP and DNS lease for this address
    #[arg(short = 'i', long, value_name = "IPV4")]
    pub ipaddr: Option<Ipv4Addr>,

    /// Use a pre-built disk image instead of a network install
    #[arg(short = 'I', long = "image-file", value_name = "FILE")]
    pub image_file: Option<PathBuf>,

    /// Kickstart template (overrides the flavor's template)
    #[arg(short = 'k', long, value_name = "FILE")]
    pub kickstart: Option<PathBuf>,

    /// Install media location (overrides the flavor's location)
    #[arg(short = 'l', long, value_name = "URL")]
    pub location: Option<String>,

    /// Cloud-init meta-data file
    #[arg(short = 'M', long = "meta-data", value_name = "FILE")]
    pub meta_data: Option<PathBuf>,

    /// VM memory in MiB
    #[arg(short = 'm', long, value_name = "MIB")]
    pub memory: Option<u32>,

    /// Do not reboot after install
    #[arg(short = 'n', long)]
    pub noreboot: bool,

    /// os-variant tag (overrides the flavor's os_variant)
    #[arg(short = 'o', long = "os-variant", value_name = "NAME")]
    pub os_variant: Option<String>,

    /// Cloud-init user-data file
    #[arg(short = 'U', long = "user-data", value_name = "FILE")]
    pub user_data: Option<PathBuf>,

    /// Extra kernel arguments appended to the generated ones
    #[arg(short = 'x', long = "extra-args", value_name = "ARGS")]
    pub extra_args: Option<String>,

    /// Tool config file
    #[arg(long, env = "VIRT_KICKSTART_CONFIG", default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Name of the VM to create (also its hostname)
    #[arg(value_name = "HOSTNAME")]
    pub hostname: String,
}

/// Caller-supplied cloud-init input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudInitFiles {
    pub meta_data: PathBuf,
    pub user_data: PathBuf,
}

/// Where the VM's operating system comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// Network install from install media at `location`
    Location {
        /// Install media location passed to the VM creation tool
        location: String,
        /// Repository the installed system fetches packages from;
        /// equals `location` for Anaconda installs, the mirror root
        /// above `dists/` for Ubuntu
        repo: String,
        /// Primary disk size in GB
        disk_size: u32,
        /// Kickstart template to render
        template: PathBuf,
        /// Extra kernel arguments appended to the generated ones
        extra_args: Option<String>,
    },
    /// Boot a pre-built disk image directly
    Image { path: PathBuf },
}

/// Fully resolved provisioning configuration, immutable for the run
#[derive(Debug, Clone)]
pub struct VmConfig {
    pub hostname: String,
    /// Memory in MiB
    pub memory: u32,
    pub vcpus: u32,
    pub bridge: String,
    /// Generated locally-administered MAC, shared by the lease
    /// registration and the VM network descriptor
    pub mac: String,
    pub os_variant: String,
    /// Static address to register with the default network, if any
    pub static_ip: Option<Ipv4Addr>,
    pub noreboot: bool,
    pub cloud_init: Option<CloudInitFiles>,
    pub source: InstallSource,
}

impl VmConfig {
    /// Installer family for the resolved os-variant
    pub fn family(&self) -> OsFamily {
        OsFamily::detect(&self.os_variant)
    }
}

/// Load the tool config file and resolve the final configuration
pub async fn resolve(opts: &ProvisionOpts) -> Result<VmConfig, ProvisionError> {
    let tool = loader::load_tool_config(&opts.config).await?;
    resolve_with(opts, &tool)
}

/// Resolve the final configuration against an already-loaded tool config
pub fn resolve_with(opts: &ProvisionOpts, tool: &ToolConfig) -> Result<VmConfig, ProvisionError> {
    let mut flavors = flavor::builtin_flavors();
    for (name, fl) in &tool.flavors {
        if flavors.insert(name.clone(), fl.clone()).is_some() {
            debug!("Config file overrides built-in flavor '{}'", name);
        }
    }

    let flavor_key = opts
        .flavor
        .clone()
        .or_else(|| tool.defaults.flavor.clone())
        .unwrap_or_else(|| DEFAULT_FLAVOR.to_string());
    let flavor = flavors.get(&flavor_key).ok_or_else(|| {
        let known: Vec<&str> = flavors.keys().map(String::as_str).collect();
        ProvisionError::usage(format!(
            "unknown flavor '{}' (known flavors: {})",
            flavor_key,
            known.join(", ")
        ))
    })?;

    let os_variant = opts
        .os_variant
        .clone()
        .unwrap_or_else(|| flavor.os_variant.clone());
    let memory = opts.memory.or(tool.defaults.memory).unwrap_or(DEFAULT_MEMORY);
    let vcpus = opts.cpus.or(tool.defaults.vcpus).unwrap_or(DEFAULT_VCPUS);
    let disk_size = opts
        .disk_size
        .or(tool.defaults.disk_size)
        .unwrap_or(DEFAULT_DISK_SIZE);
    let bridge = opts
        .bridge
        .clone()
        .or_else(|| tool.defaults.bridge.clone())
        .unwrap_or_else(|| DEFAULT_BRIDGE.to_string());

    let cloud_init = if opts.cloud_init {
        let meta_data = opts
            .meta_data
            .clone()
            .ok_or_else(|| ProvisionError::precondition("cloud-init requires a meta-data file (-M)"))?;
        let user_data = opts
            .user_data
            .clone()
            .ok_or_else(|| ProvisionError::precondition("cloud-init requires a user-data file (-U)"))?;
        require_file(&meta_data, "meta-data file")?;
        require_file(&user_data, "user-data file")?;
        Some(CloudInitFiles {
            meta_data,
            user_data,
        })
    } else {
        if opts.meta_data.is_some() || opts.user_data.is_some() {
            warn!("meta-data/user-data are ignored without --cloud-init");
        }
        None
    };

    // Cloud-init payloads commonly power the VM off at first boot; the
    // post-install start step needs the reboot to stay enabled.
    let mut noreboot = opts.noreboot;
    if noreboot && cloud_init.is_some() {
        warn!("cloud-init installs must be restartable, ignoring --noreboot");
        noreboot = false;
    }

    let source = match &opts.image_file {
        Some(image) => {
            require_file(image, "disk image")?;
            if opts.location.is_some() {
                warn!("--location is ignored for image-based builds");
            }
            warn!("disk_size is currently ignored for image-based builds");
            InstallSource::Image {
                path: image.clone(),
            }
        }
        None => {
            let location = opts
                .location
                .clone()
                .unwrap_or_else(|| flavor.location.clone());
            let repo = match OsFamily::detect(&os_variant) {
                OsFamily::Ubuntu => flavor::ubuntu_mirror_root(&location).ok_or_else(|| {
                    ProvisionError::precondition(format!(
                        "Ubuntu install location '{}' has no dists/ segment",
                        location
                    ))
                })?,
                OsFamily::Anaconda => location.clone(),
            };
            let template = match &opts.kickstart {
                Some(path) => path.clone(),
                None => template_dir(tool).join(&flavor.template),
            };
            require_file(&template, "kickstart template")?;
            InstallSource::Location {
                location,
                repo,
                disk_size,
                template,
                extra_args: opts.extra_args.clone(),
            }
        }
    };

    Ok(VmConfig {
        hostname: opts.hostname.clone(),
        memory,
        vcpus,
        bridge,
        mac: generate_mac(),
        os_variant,
        static_ip: opts.ipaddr,
        noreboot,
        cloud_init,
        source,
    })
}

fn template_dir(tool: &ToolConfig) -> PathBuf {
    tool.defaults
        .template_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR))
}

fn require_file(path: &Path, what: &str) -> Result<(), ProvisionError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ProvisionError::precondition(format!(
            "{} '{}' does not exist",
            what,
            path.display()
        )))
    }
}
