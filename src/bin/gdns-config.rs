//! Validate a gdns zone configuration file.
//!
//! Exits non-zero when the file cannot be read, parsed or validated.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use gdns::{config::Configuration, errors::DnsError};

#[derive(Parser, Debug)]
#[command(name = "gdns-config", version, about = "Check a gdns zone configuration file")]
struct Cli {
    /// File to check.
    #[arg(short, long, env = "GDNS_CONFIG_FILE", value_name = "FILE")]
    file: PathBuf,

    /// Print the parsed configuration as JSON.
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<(), DnsError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse();
    let config = Configuration::load(&cli.file)?;

    if cli.dump {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    info!("{} is valid", cli.file.display());
    Ok(())
}
