//! openapi-synth - build OpenAPI documents from the routers of Rust web projects.
//!
//! # Usage
//!
//! ```bash
//! openapi-synth [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-synth ./my-api-project -o openapi.yaml
//! ```
//!
//! Generate JSON with a title and shortened component names:
//! ```bash
//! openapi-synth ./my-api-project -f json --title "Messaging API" --strip my_api::models
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_synth::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-synth starting...");

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");
    Ok(())
}
