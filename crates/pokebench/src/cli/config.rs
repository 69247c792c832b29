//! The `pokebench config` command for configuration management.

use std::path::Path;

use clap::{Args, Subcommand};
use pokebench_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command against the file at `path`.
pub async fn execute(args: ConfigArgs, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            // Show fails loudly on a broken file instead of falling back.
            let config = super::load_config(path)?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let init = || ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        execute(init(), &path).await.unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scoring.top_k, Config::default().scoring.top_k);

        // A second init without --force refuses to clobber
        assert!(execute(init(), &path).await.is_err());
        let forced = ConfigArgs {
            command: ConfigCommand::Init { force: true },
        };
        execute(forced, &path).await.unwrap();
    }
}
