//! monitor-config command-line tool.

use anyhow::{Context, Result, bail};
use clap::Parser;
use monitor_config::cli::{Cli, Command, DumpFormat};
use monitor_config::config::AgentConfig;
use monitor_config::document::Node;
use monitor_config::logging::{LogTarget, init_logging};
use serde_json::json;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogTarget::from_arg(&cli.log), cli.verbose)?;

    let mut config = AgentConfig::new();
    match &cli.config {
        Some(path) => {
            config
                .init_from_file(path, &cli.options)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        }
        None => {
            config
                .init(&cli.options)
                .context("Failed to load configuration from command-line options")?;
        }
    }

    match cli.command {
        Command::Check => {
            let report = json!({
                "loaded_files": config.loaded_files(),
                "webserver": config.webserver,
                "plugins": config.plugins,
                "load_plugins": config.load_plugins,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Get { path } => match config.config.get_node(&path) {
            None => bail!("'{}' is not defined", path),
            Some(Node::Scalar(_)) => {
                println!("{}", config.config.get_expanded(&path).unwrap_or_default());
            }
            Some(node) => {
                let value = node.to_yaml(Some(config.config.env().as_ref()));
                print!("{}", serde_yaml::to_string(&value)?);
            }
        },
        Command::Dump { format, raw } => {
            let value = config.config.to_yaml_value(!raw);
            match format {
                DumpFormat::Yaml => print!("{}", serde_yaml::to_string(&value)?),
                DumpFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
            }
        }
    }

    Ok(())
}
