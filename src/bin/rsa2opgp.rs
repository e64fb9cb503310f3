//! Wraps a PEM RSA private key into a self-certified OpenPGP key.
//!
//! Usage:
//!   rsa2opgp -i key.pem -n "Alice" -e alice@example.org [-c comment] [-d 2024-01-01_00:00:00] [-o key.asc]

use std::fs;
use std::process;

use clap::Parser;
use tracing::{error, info};

use vanityid::config::Rsa2OpgpConfig;
use vanityid::convert;

fn main() {
    vanityid::init_logging();
    let config = Rsa2OpgpConfig::parse();

    if let Err(e) = config.holder.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&config) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: &Rsa2OpgpConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pem = fs::read_to_string(&config.input)
        .map_err(|e| format!("cannot read {}: {}", config.input.display(), e))?;

    let created_at = config.holder.creation_time()?;
    let asc = convert::rsa_to_pgp(&pem, &config.holder.holder(), created_at)?;

    match &config.output {
        Some(path) => {
            fs::write(path, &asc).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            info!(path = %path.display(), "wrote OpenPGP key");
        }
        None => print!("{}", asc),
    }
    Ok(())
}
