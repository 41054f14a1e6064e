// SPDX-License-Identifier: MIT OR Apache-2.0

//! # lazycfg
//!
//! Resolves a YAML shape declaration against the process environment and a YAML parameter
//! file, and prints the resulting configuration as JSON.

use clap::Parser;
use lazycfg::adapters::{
    CommandLineEnvironment, ProcessEnvironment, StaticParameterStore, TracingLogger,
    YamlParameterStore, YamlShapeParser,
};
use lazycfg::ports::{LogLevel, ParameterStore};
use lazycfg::service::{ConfigurationFactory, FactorySettings};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, Level};

#[derive(Parser, Debug)]
#[command(name = "lazycfg")]
#[command(about = "Resolve a configuration shape and print it as JSON")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Shape declaration file (YAML)
    #[arg(short, long)]
    shape: PathBuf,

    /// Parameter file answering remote keys (YAML)
    #[arg(short, long)]
    parameters: Option<PathBuf>,

    /// First segment of remote keys
    #[arg(long)]
    system: Option<String>,

    /// Second segment of remote keys
    #[arg(long)]
    env_type: Option<String>,

    /// Third segment of remote keys
    #[arg(long)]
    service_name: Option<String>,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Abort the parameter fetch after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Override an environment variable, as NAME=value (repeatable)
    #[arg(short = 'e', long = "env", value_name = "NAME=VALUE")]
    overrides: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    /// Overlays command-line values on settings read from `LAZYCFG_*` variables.
    fn settings(&self) -> Result<FactorySettings, Box<dyn std::error::Error>> {
        let mut settings = FactorySettings::from_env()?;
        let namespace = &mut settings.namespace;
        if self.system.is_some() {
            namespace.system.clone_from(&self.system);
        }
        if self.env_type.is_some() {
            namespace.env_type.clone_from(&self.env_type);
        }
        if self.service_name.is_some() {
            namespace.service_name.clone_from(&self.service_name);
        }
        if self.timeout_ms.is_some() {
            settings.fetch_timeout_ms = self.timeout_ms;
        }
        if self.log_level.is_some() {
            settings.log_level.clone_from(&self.log_level);
        }
        Ok(settings)
    }
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

async fn run(cli: &Cli, settings: &FactorySettings) -> Result<String, Box<dyn std::error::Error>> {
    let shape = YamlShapeParser::new().parse_file(&cli.shape)?;
    debug!("loaded shape with {} top-level fields", shape.len());

    let store: Arc<dyn ParameterStore> = match &cli.parameters {
        Some(path) => Arc::new(YamlParameterStore::from_file(path)?),
        None => Arc::new(StaticParameterStore::new()),
    };
    let environment = CommandLineEnvironment::new()
        .with_pairs(&cli.overrides[..])
        .over(ProcessEnvironment::new());

    let factory = ConfigurationFactory::builder()
        .shape(shape)
        .environment(environment)
        .store_arc(store)
        .settings(settings)
        .logger(Arc::new(TracingLogger::new(settings.log_level())))
        .build()?;

    let config = factory.get_configuration().await?;
    let json = if cli.pretty {
        config.to_json_pretty()?
    } else {
        config.to_json()?
    };
    Ok(json)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("lazycfg: invalid settings: {}", e);
            process::exit(2);
        }
    };

    let _subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing_level(settings.log_level()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    match run(&cli, &settings).await {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("configuration resolution failed: {}", e);
            eprintln!("lazycfg: {}", e);
            process::exit(1);
        }
    }
}
