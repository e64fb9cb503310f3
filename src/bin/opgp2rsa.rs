//! Extracts the RSA private key of an OpenPGP private key as PKCS#1 PEM.
//!
//! Usage:
//!   opgp2rsa -i key.asc -o key.pem [-p passphrase]

use std::fs;
use std::process;

use clap::Parser;
use tracing::{error, info};

use vanityid::config::Opgp2RsaConfig;
use vanityid::convert;

fn main() {
    vanityid::init_logging();
    let config = Opgp2RsaConfig::parse();

    if let Err(e) = run(&config) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: &Opgp2RsaConfig) -> Result<(), Box<dyn std::error::Error>> {
    let armored = fs::read_to_string(&config.input)
        .map_err(|e| format!("cannot read {}: {}", config.input.display(), e))?;

    let pem = convert::pgp_to_rsa_pem(&armored, config.passphrase.as_deref())?;

    match &config.output {
        Some(path) => {
            fs::write(path, &pem).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            info!(path = %path.display(), "wrote RSA private key");
        }
        None => print!("{}", pem),
    }
    Ok(())
}
