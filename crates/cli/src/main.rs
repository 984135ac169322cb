use clap::{Parser, Subcommand};
use emc_core::config::{locale_from_env_value, patient_location_attributes_from_env_value};
use emc_core::wire::{CreateLocationReq, LocationJson, UpdateLocationReq};
use emc_core::{CoreConfig, FileGateway, LocationRegistry, Ready, DEFAULT_DATA_DIR};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "emc")]
#[command(about = "EMC location registry CLI")]
struct Cli {
    /// Directory holding location and patient records
    #[arg(long, global = true, env = "EMC_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Locale used for names (defaults to "en")
    #[arg(long, global = true, env = "EMC_DEFAULT_LOCALE")]
    locale: Option<String>,

    /// Comma-separated patient attributes that hold a location UUID
    #[arg(long, global = true, env = "EMC_PATIENT_LOCATION_ATTRIBUTES")]
    patient_location_attributes: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the root and zone locations if missing
    Bootstrap,
    /// List all non-retired locations
    List,
    /// Show one location
    Show {
        /// Location UUID
        uuid: String,
    },
    /// Create a location
    Create {
        /// Parent location UUID
        #[arg(long)]
        parent: String,
        /// Display name
        name: String,
    },
    /// Rename a location
    Rename {
        /// Location UUID
        uuid: String,
        /// New display name
        name: String,
    },
    /// Delete a location and everything under it
    Delete {
        /// Location UUID
        uuid: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("emc=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli, &mut std::io::stdout().lock())
}

fn open_registry(cli: &Cli) -> anyhow::Result<LocationRegistry<Ready>> {
    std::fs::create_dir_all(&cli.data_dir)?;

    let cfg = Arc::new(CoreConfig::new(
        cli.data_dir.clone(),
        locale_from_env_value(cli.locale.clone()),
        patient_location_attributes_from_env_value(cli.patient_location_attributes.clone()),
    )?);
    let gateway = Arc::new(FileGateway::new(cfg.clone()));

    Ok(LocationRegistry::new(cfg, gateway).bootstrap()?)
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let registry = open_registry(&cli)?;
    let locale = locale_from_env_value(cli.locale.clone());

    match cli.command {
        Commands::Bootstrap => {
            let report = registry.bootstrap_report();
            if report.is_noop() {
                writeln!(out, "Skeleton already present.")?;
            } else {
                for id in &report.created {
                    writeln!(out, "Created {id}")?;
                }
            }
        }
        Commands::List => {
            for location in registry.list_all()?.results {
                print_location(out, &location)?;
            }
        }
        Commands::Show { uuid } => match registry.retrieve(&uuid)? {
            Some(location) => print_location(out, &location)?,
            None => anyhow::bail!("No location found with UUID {uuid}"),
        },
        Commands::Create { parent, name } => {
            let created = registry.create(CreateLocationReq::new(parent, &locale, name))?;
            writeln!(out, "Created location with UUID: {}", created.uuid)?;
        }
        Commands::Rename { uuid, name } => {
            let updated = registry.update(&uuid, UpdateLocationReq::rename(&locale, name))?;
            print_location(out, &updated)?;
        }
        Commands::Delete { uuid } => {
            registry.delete(&uuid)?;
            writeln!(out, "Deleted location {uuid}")?;
        }
    }

    Ok(())
}

fn print_location(out: &mut impl Write, location: &LocationJson) -> std::io::Result<()> {
    let name = location.names.values().next().map_or("", String::as_str);
    match &location.parent_uuid {
        Some(parent) => writeln!(out, "{}  {}  (parent {})", location.uuid, name, parent),
        None => writeln!(out, "{}  {}", location.uuid, name),
    }
}
