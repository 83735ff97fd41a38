use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;
use metacall_core::{Configuration, LoaderRegistry, Value};
use metacall_loader_file::FileLoaderBackend;

/// Loads a configuration, registers the file backend under the tag it
/// names, and invokes one symbol by name.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to a JSON configuration file (see metacall-core's `Configuration`).
    config: PathBuf,

    /// Name of the function to invoke after loading finishes.
    symbol: String,

    /// String arguments passed to the invoked function.
    args: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(value) => {
            println!("{value:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> metacall_core::Result<Value> {
    let config = Configuration::from_file(&cli.config)?;

    let registry = LoaderRegistry::new()?;
    registry.register_backend(config.tag.clone(), Box::new(FileLoaderBackend::new(config.tag.clone())))?;
    metacall_loader_file::register_file_type(&registry, &config.tag)?;

    config.apply(&registry)?;

    let args: Vec<Value> = cli.args.iter().map(|arg| Value::string(arg.clone())).collect();
    let result = registry.invoke(&cli.symbol, &args);

    if let Err(err) = registry.destroy() {
        error!("teardown failed: {err}");
    }

    result
}
