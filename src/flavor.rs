//! OS flavor table and family-sensitive install behavior
//!
//! A flavor bundles the os-variant tag, default install media location,
//! and kickstart template for one OS release. Built-in flavors can be
//! extended or overridden from the tool config file.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Named bundle of OS-specific install defaults
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Flavor {
    /// os-variant tag passed to the VM creation tool
    pub os_variant: String,
    /// Default install media location
    pub location: String,
    /// Kickstart template file name, resolved against the template dir
    pub template: String,
}

impl Flavor {
    fn new(os_variant: &str, location: &str, template: &str) -> Self {
        Self {
            os_variant: os_variant.to_string(),
            location: location.to_string(),
            template: template.to_string(),
        }
    }
}

/// The built-in flavor table
pub fn builtin_flavors() -> BTreeMap<String, Flavor> {
    let mut flavors = BTreeMap::new();
    flavors.insert(
        "alma8".to_string(),
        Flavor::new(
            "almalinux8",
            "https://mirror.umd.edu/almalinux/8/BaseOS/x86_64/os/",
            "rhel.ks.tmpl",
        ),
    );
    flavors.insert(
        "alma9".to_string(),
        Flavor::new(
            "almalinux9",
            "https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/",
            "rhel.ks.tmpl",
        ),
    );
    flavors.insert(
        "centos9".to_string(),
        Flavor::new(
            "centos-stream9",
            "https://mirror.stream.centos.org/9-stream/BaseOS/x86_64/os/",
            "rhel.ks.tmpl",
        ),
    );
    flavors.insert(
        "rocky9".to_string(),
        Flavor::new(
            "rocky9",
            "https://mirror.umd.edu/rocky/9/BaseOS/x86_64/os/",
            "rhel.ks.tmpl",
        ),
    );
    flavors.insert(
        "ubuntu2004".to_string(),
        Flavor::new(
            "ubuntu20.04",
            "http://archive.ubuntu.com/ubuntu/dists/focal/main/installer-amd64/",
            "ubuntu.ks.tmpl",
        ),
    );
    flavors.insert(
        "ubuntu2204".to_string(),
        Flavor::new(
            "ubuntu22.04",
            "http://archive.ubuntu.com/ubuntu/dists/jammy/main/installer-amd64/",
            "ubuntu.ks.tmpl",
        ),
    );
    flavors
}

/// Installer family, detected from the os-variant tag
///
/// The family decides the kernel argument names pointing the installer
/// at the kickstart file and the package repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Anaconda-based installers (RHEL, AlmaLinux, Rocky, CentOS Stream)
    Anaconda,
    /// Debian-installer based Ubuntu releases
    Ubuntu,
}

impl OsFamily {
    /// Detect the family from an os-variant tag
    pub fn detect(os_variant: &str) -> Self {
        if os_variant.starts_with("ubuntu") {
            OsFamily::Ubuntu
        } else {
            OsFamily::Anaconda
        }
    }

    /// Kernel argument pointing the installer at the injected kickstart
    pub fn ks_arg(&self, ks_basename: &str) -> String {
        match self {
            OsFamily::Anaconda => format!("inst.ks=file:/{}", ks_basename),
            OsFamily::Ubuntu => format!("ks=file:/{}", ks_basename),
        }
    }

    /// Kernel argument pointing the installer at the package repository
    pub fn repo_arg(&self, repo: &str) -> String {
        match self {
            OsFamily::Anaconda => format!("inst.repo={}", repo),
            OsFamily::Ubuntu => format!("repo={}", repo),
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsFamily::Anaconda => write!(f, "anaconda"),
            OsFamily::Ubuntu => write!(f, "ubuntu"),
        }
    }
}

/// Repository root for an Ubuntu install location
///
/// Ubuntu install locations point below `dists/`; the repository the
/// installed system fetches packages from is the mirror root above it.
/// Returns `None` when the location has no `dists/` segment.
pub fn ubuntu_mirror_root(location: &str) -> Option<String> {
    location
        .find("dists/")
        .map(|idx| location[..idx].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_flavor_values() {
        let flavors = builtin_flavors();
        let alma9 = &flavors["alma9"];
        assert_eq!(alma9.os_variant, "almalinux9");
        assert_eq!(
            alma9.location,
            "https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/"
        );
        assert_eq!(alma9.template, "rhel.ks.tmpl");

        let ubuntu = &flavors["ubuntu2204"];
        assert_eq!(ubuntu.os_variant, "ubuntu22.04");
        assert_eq!(ubuntu.template, "ubuntu.ks.tmpl");
        assert!(ubuntu.location.contains("dists/"));
    }

    #[test]
    fn test_family_detection() {
        assert_eq!(OsFamily::detect("almalinux9"), OsFamily::Anaconda);
        assert_eq!(OsFamily::detect("centos-stream9"), OsFamily::Anaconda);
        assert_eq!(OsFamily::detect("ubuntu22.04"), OsFamily::Ubuntu);
        assert_eq!(OsFamily::detect("ubuntu20.04"), OsFamily::Ubuntu);
    }

    #[test]
    fn test_anaconda_kernel_args() {
        let family = OsFamily::Anaconda;
        assert_eq!(family.ks_arg("test1.abc.ks"), "inst.ks=file:/test1.abc.ks");
        assert_eq!(
            family.repo_arg("https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/"),
            "inst.repo=https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/"
        );
    }

    #[test]
    fn test_ubuntu_kernel_args() {
        let family = OsFamily::Ubuntu;
        assert_eq!(family.ks_arg("vm.xyz.ks"), "ks=file:/vm.xyz.ks");
        assert_eq!(
            family.repo_arg("http://archive.ubuntu.com/ubuntu/"),
            "repo=http://archive.ubuntu.com/ubuntu/"
        );
    }

    #[test]
    fn test_ubuntu_mirror_root() {
        assert_eq!(
            ubuntu_mirror_root(
                "http://archive.ubuntu.com/ubuntu/dists/jammy/main/installer-amd64/"
            ),
            Some("http://archive.ubuntu.com/ubuntu/".to_string())
        );
        assert_eq!(
            ubuntu_mirror_root("https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/"),
            None
        );
    }
}
