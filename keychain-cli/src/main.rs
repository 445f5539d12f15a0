mod config;
mod platform;
mod storage;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::CliConfig;
use keychain_core::{Keychain, RustCryptoProvider};
use std::path::PathBuf;
use std::sync::Arc;
use storage::FileStorage;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

const MASTER_PASSWORD_ENV: &str = "KEYCHAIN_MASTER_PASSWORD";

/// Keychain CLI - an encrypted, tamper-evident password keychain
#[derive(Parser)]
#[command(name = "keychain")]
#[command(about = "Encrypted, tamper-evident password keychain", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty keychain
    Init {
        /// Overwrite an existing keychain
        #[arg(long)]
        force: bool,
    },

    /// Print the password stored for a domain
    Get {
        /// Domain name
        domain: String,
    },

    /// Store a password for a domain
    Set {
        /// Domain name
        domain: String,

        /// Password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },

    /// Remove the password stored for a domain
    Remove {
        /// Domain name
        domain: String,
    },

    /// Print the number of stored records
    Count,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(platform::get_default_config_path);
    let config = CliConfig::load_or_default(&config_path)?;

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")?;

    let storage = FileStorage::new(&config.store_path, &config.checksum_path);

    match cli.command {
        Commands::Init { force } => {
            if storage.exists() && !force {
                bail!(
                    "A keychain already exists at {} (use --force to replace it)",
                    storage.store_path().display()
                );
            }

            info!("Initializing new keychain...");
            let master = match master_password_from_env() {
                Some(master) => master,
                None => {
                    let master = prompt_secret("New master password: ")?;
                    let confirm = prompt_secret("Confirm master password: ")?;
                    if *master != *confirm {
                        bail!("Master passwords do not match");
                    }
                    master
                }
            };

            let provider = Arc::new(RustCryptoProvider::new());
            let keychain = Keychain::init_with(&master, &config.keychain, provider)?;
            storage.write(&keychain.dump()?)?;
            info!("Keychain created at {}", storage.store_path().display());
        }
        Commands::Get { domain } => {
            let keychain = unlock(&storage)?;
            match keychain.get(&domain)? {
                Some(password) => {
                    let password = Zeroizing::new(password);
                    println!("{}", *password);
                }
                None => bail!("No password stored for {}", domain),
            }
        }
        Commands::Set { domain, password } => {
            let mut keychain = unlock(&storage)?;
            let password = match password {
                Some(p) => Zeroizing::new(p),
                None => prompt_secret(&format!("Password for {}: ", domain))?,
            };

            keychain.set(&domain, &password)?;
            storage.write(&keychain.dump()?)?;
            info!("Stored password for {}", domain);
        }
        Commands::Remove { domain } => {
            let mut keychain = unlock(&storage)?;
            if keychain.remove(&domain)? {
                storage.write(&keychain.dump()?)?;
                info!("Removed password for {}", domain);
            } else {
                info!("No password stored for {}", domain);
            }
        }
        Commands::Count => {
            let keychain = unlock(&storage)?;
            println!("{}", keychain.len());
        }
    }

    Ok(())
}

/// Load the keychain from storage with the master password
fn unlock(storage: &FileStorage) -> Result<Keychain> {
    if !storage.exists() {
        bail!(
            "No keychain found at {}. Create one with: keychain init",
            storage.store_path().display()
        );
    }

    let dump = storage.read()?;
    let master = match master_password_from_env() {
        Some(master) => master,
        None => prompt_secret("Master password: ")?,
    };

    info!("Unlocking keychain...");
    let keychain = Keychain::load(&master, &dump.representation, &dump.checksum)?;
    Ok(keychain)
}

fn master_password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(MASTER_PASSWORD_ENV).ok().map(Zeroizing::new)
}

/// Prompt for a secret without echo
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let value = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(value))
}
