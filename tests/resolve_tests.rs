//! Integration tests for option resolution

use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use tempfile::TempDir;

use virt_kickstart_rs::config::{self, InstallSource, ProvisionOpts};

fn opts(hostname: &str, config: PathBuf) -> ProvisionOpts {
    ProvisionOpts {
        bridge: None,
        cloud_init: false,
        cpus: None,
        disk_size: None,
        flavor: None,
        ipaddr: None,
        image_file: None,
        kickstart: None,
        location: None,
        meta_data: None,
        memory: None,
        noreboot: false,
        os_variant: None,
        user_data: None,
        extra_args: None,
        config,
        verbose: 0,
        hostname: hostname.to_string(),
    }
}

fn write_template(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(
        &path,
        "network --hostname={{ hostname }}\nrootpw --iscrypted {{ rootpw_hash }}\n",
    )
    .unwrap();
    path
}

/// Test built-in flavor defaults flow into the resolved configuration
#[tokio::test]
async fn test_builtin_defaults() {
    let dir = TempDir::new().unwrap();
    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.kickstart = Some(write_template(&dir, "rhel.ks.tmpl"));

    let config = config::resolve(&opts).await.unwrap();
    assert_eq!(config.hostname, "vm1");
    assert_eq!(config.memory, 4096);
    assert_eq!(config.vcpus, 1);
    assert_eq!(config.bridge, "virbr0");
    assert_eq!(config.os_variant, "almalinux9");
    assert!(config.static_ip.is_none());
    match &config.source {
        InstallSource::Location {
            location,
            repo,
            disk_size,
            ..
        } => {
            assert_eq!(
                location,
                "https://mirror.umd.edu/almalinux/9/BaseOS/x86_64/os/"
            );
            assert_eq!(repo, location);
            assert_eq!(*disk_size, 20);
        }
        InstallSource::Image { .. } => panic!("expected a location source"),
    }
}

/// Test config file defaults sit between built-ins and explicit flags
#[tokio::test]
async fn test_config_file_precedence() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        "defaults:\n  memory: 8192\n  vcpus: 2\n  disk_size: 40\n  bridge: br0\n",
    )
    .unwrap();

    let mut opts = opts("vm1", config_path);
    opts.kickstart = Some(write_template(&dir, "rhel.ks.tmpl"));
    opts.memory = Some(2048);

    let config = config::resolve(&opts).await.unwrap();
    assert_eq!(config.memory, 2048);
    assert_eq!(config.vcpus, 2);
    assert_eq!(config.bridge, "br0");
    match &config.source {
        InstallSource::Location { disk_size, .. } => assert_eq!(*disk_size, 40),
        InstallSource::Image { .. } => panic!("expected a location source"),
    }
}

/// Test user-defined flavors extend the built-in table
#[tokio::test]
async fn test_config_file_flavors() {
    let dir = TempDir::new().unwrap();
    write_template(&dir, "debian.ks.tmpl");
    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            concat!(
                "defaults:\n",
                "  template_dir: {}\n",
                "flavors:\n",
                "  debian12:\n",
                "    os_variant: debian12\n",
                "    location: https://deb.debian.org/debian/\n",
                "    template: debian.ks.tmpl\n",
            ),
            dir.path().display()
        ),
    )
    .unwrap();

    let mut opts = opts("vm1", config_path);
    opts.flavor = Some("debian12".to_string());

    let config = config::resolve(&opts).await.unwrap();
    assert_eq!(config.os_variant, "debian12");
    match &config.source {
        InstallSource::Location { location, template, .. } => {
            assert_eq!(location, "https://deb.debian.org/debian/");
            assert_eq!(template, &dir.path().join("debian.ks.tmpl"));
        }
        InstallSource::Image { .. } => panic!("expected a location source"),
    }
}

/// Test an unknown flavor is rejected as a usage error
#[tokio::test]
async fn test_unknown_flavor() {
    let dir = TempDir::new().unwrap();
    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.flavor = Some("slackware".to_string());

    let err = config::resolve(&opts).await.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("slackware"));
}

/// Test cloud-init with a missing input file fails before any command
#[tokio::test]
async fn test_cloud_init_missing_user_data() {
    let dir = TempDir::new().unwrap();
    let meta = dir.path().join("meta.yaml");
    fs::write(&meta, "instance-id: vm1\n").unwrap();

    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.cloud_init = true;
    opts.meta_data = Some(meta);

    let err = config::resolve(&opts).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("user-data"));
}

/// Test Ubuntu locations must carry a dists segment
#[tokio::test]
async fn test_ubuntu_location_without_dists() {
    let dir = TempDir::new().unwrap();
    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.kickstart = Some(write_template(&dir, "ubuntu.ks.tmpl"));
    opts.flavor = Some("ubuntu2204".to_string());
    opts.location = Some("http://archive.ubuntu.com/ubuntu/".to_string());

    let err = config::resolve(&opts).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("dists/"));
}

/// Test the static lease address lands in the resolved configuration
#[tokio::test]
async fn test_static_address() {
    let dir = TempDir::new().unwrap();
    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.kickstart = Some(write_template(&dir, "rhel.ks.tmpl"));
    opts.ipaddr = Some(Ipv4Addr::new(192, 168, 122, 40));

    let config = config::resolve(&opts).await.unwrap();
    assert_eq!(config.static_ip, Some(Ipv4Addr::new(192, 168, 122, 40)));
}

/// Test noreboot is dropped when cloud-init is enabled
#[tokio::test]
async fn test_cloud_init_forces_reboot() {
    let dir = TempDir::new().unwrap();
    let meta = dir.path().join("meta.yaml");
    let user = dir.path().join("user.yaml");
    fs::write(&meta, "instance-id: vm1\n").unwrap();
    fs::write(&user, "#cloud-config\n").unwrap();

    let mut opts = opts("vm1", dir.path().join("missing.yaml"));
    opts.kickstart = Some(write_template(&dir, "rhel.ks.tmpl"));
    opts.cloud_init = true;
    opts.meta_data = Some(meta);
    opts.user_data = Some(user);
    opts.noreboot = true;

    let config = config::resolve(&opts).await.unwrap();
    assert!(!config.noreboot);
    assert!(config.cloud_init.is_some());
}
