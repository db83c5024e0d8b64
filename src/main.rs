//! virt-kickstart-rs - provision libvirt VMs
//!
//! Renders a kickstart file or builds a cloud-init seed image, then
//! drives virt-install and virsh to create and reconcile the VM.

use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use virt_kickstart_rs::config::ProvisionOpts;
use virt_kickstart_rs::{ProvisionError, provision};

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let opts = ProvisionOpts::parse();
    init_logging(opts.verbose);

    if let Err(err) = provision(&opts).await {
        error!("{}", err);
        if let ProvisionError::Usage(_) = err {
            eprintln!("Try 'virt-kickstart-rs --help' for more information.");
        }
        std::process::exit(err.exit_code());
    }
}
