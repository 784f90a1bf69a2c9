//! Background Removal Studio CLI
//!
//! Command-line front end for the bgremove-studio library: one-shot
//! background removal or an interactive session shell.

#[cfg(feature = "cli")]
use bgremove_studio::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
