//! Operator CLI for a clinic records database.
//!
//! # Environment
//!
//! - `CLINIC_RECORDS_DB`: database file (default: "clinic-records.db")
//! - `CLINIC_RECORDS_ADMIN_USERNAME` / `CLINIC_RECORDS_ADMIN_PASSWORD`:
//!   first-run administrator credentials (default: "admin" / "admin")
//! - `CLINIC_RECORDS_HASH_ROUNDS`: password hash iterations
//! - `CLINIC_RECORDS_USERNAME` / `CLINIC_RECORDS_PASSWORD`: login for every
//!   command except `init`
//! - `RUST_LOG`: log filter (default: "info")

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use clinic_records_core::{config, ClinicRecordsCore, Database, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic-records")]
#[command(about = "Clinic records backup and administration CLI")]
struct Cli {
    /// Login name
    #[arg(long, global = true, env = "CLINIC_RECORDS_USERNAME")]
    username: Option<String>,
    /// Login password
    #[arg(long, global = true, env = "CLINIC_RECORDS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and the default administrator
    Init,
    /// Write a JSON backup of every collection
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace collections from a JSON backup
    Import {
        /// Backup file
        file: PathBuf,
    },
    /// List patients
    Patients {
        /// Only patients whose name or registration number contains this
        #[arg(long)]
        search: Option<String>,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Read or write a setting
    Settings {
        #[command(subcommand)]
        command: SettingCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List accounts
    List,
    /// Create an account
    Add {
        /// New account's login name
        #[arg(value_name = "USERNAME")]
        new_username: String,
        /// New account's password
        #[arg(long = "new-password")]
        new_password: String,
        /// administrator, records-clerk or clinician
        #[arg(long)]
        role: String,
    },
    /// Delete an account by id
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum SettingCommands {
    /// Print a setting as JSON
    Get { key: String },
    /// Save a setting; values that are not JSON are stored as text
    Set { key: String, value: String },
}

fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = config_from(|name| std::env::var(name).ok()).and_then(|config| {
        let mut out = std::io::stdout().lock();
        run(cli, config, &mut out)
    });

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Resolve store configuration from environment lookups.
fn config_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<StoreConfig> {
    let path = lookup("CLINIC_RECORDS_DB")
        .unwrap_or_else(|| config::DEFAULT_DATABASE_FILE.to_string());
    let mut store = StoreConfig::new(path);

    let username = lookup("CLINIC_RECORDS_ADMIN_USERNAME");
    let password = lookup("CLINIC_RECORDS_ADMIN_PASSWORD");
    if username.is_some() || password.is_some() {
        store = store.with_default_admin(
            username.unwrap_or_else(|| config::DEFAULT_ADMIN_USERNAME.to_string()),
            password.unwrap_or_else(|| config::DEFAULT_ADMIN_PASSWORD.to_string()),
        )?;
    }

    if let Some(rounds) = lookup("CLINIC_RECORDS_HASH_ROUNDS") {
        let rounds = rounds
            .parse()
            .with_context(|| format!("CLINIC_RECORDS_HASH_ROUNDS: not a number: {}", rounds))?;
        store = store.with_hash_rounds(rounds)?;
    }

    Ok(store)
}

fn run(cli: Cli, config: StoreConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let db = Database::open(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let core = ClinicRecordsCore::with_database(db, config)?;

    if let Commands::Init = cli.command {
        writeln!(out, "Database ready at {}", core.config().database_path().display())?;
        return Ok(());
    }

    let (Some(username), Some(password)) = (cli.username, cli.password) else {
        bail!("--username and --password are required");
    };
    if core.login(username, password)?.is_none() {
        bail!("invalid username or password");
    }

    match cli.command {
        Commands::Init => {}
        Commands::Export { out: Some(path) } => {
            std::fs::write(&path, core.export_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Commands::Export { out: None } => {
            writeln!(out, "{}", core.export_json()?)?;
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let summary = core.import_json(json)?;
            for (name, count) in [
                ("patients", summary.patients),
                ("visits", summary.visits),
                ("users", summary.users),
                ("settings", summary.settings),
            ] {
                match count {
                    Some(n) => writeln!(out, "{}: {} imported", name, n)?,
                    None => writeln!(out, "{}: unchanged", name)?,
                }
            }
        }
        Commands::Patients { search } => {
            let patients = match search {
                Some(term) => core.search_patients(term)?,
                None => core.list_patients()?,
            };
            if patients.is_empty() {
                writeln!(out, "No patients found.")?;
            }
            for patient in patients {
                writeln!(
                    out,
                    "ID: {}, Reg: {}, Name: {}, Registered: {}",
                    patient.id.unwrap_or_default(),
                    patient.registration_number,
                    patient.full_name,
                    patient.registration_date
                )?;
            }
        }
        Commands::Users { command } => match command {
            UserCommands::List => {
                for user in core.list_users()? {
                    writeln!(
                        out,
                        "ID: {}, Username: {}, Role: {}, Created: {}",
                        user.id.unwrap_or_default(),
                        user.username,
                        user.role,
                        user.created_at
                    )?;
                }
            }
            UserCommands::Add {
                new_username,
                new_password,
                role,
            } => {
                let user = core.create_user(new_username, new_password, role)?;
                writeln!(
                    out,
                    "Created {} ({}) with ID: {}",
                    user.username,
                    user.role,
                    user.id.unwrap_or_default()
                )?;
            }
            UserCommands::Delete { id } => {
                if core.delete_user(id)? {
                    writeln!(out, "Deleted user {}", id)?;
                } else {
                    writeln!(out, "No user with ID: {}", id)?;
                }
            }
        },
        Commands::Settings { command } => match command {
            SettingCommands::Get { key } => match core.get_setting(key.clone())? {
                Some(value) => writeln!(out, "{}", value)?,
                None => writeln!(out, "{} is not set", key)?,
            },
            SettingCommands::Set { key, value } => {
                let value = match serde_json::from_str::<serde_json::Value>(&value) {
                    Ok(json) => json,
                    Err(_) => serde_json::Value::String(value),
                };
                core.save_setting(key.clone(), value.to_string())?;
                writeln!(out, "Saved {}", key)?;
            }
        },
    }

    Ok(())
}
