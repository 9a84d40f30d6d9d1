use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use update_resolver::catalog::JsonCatalog;
use update_resolver::config::{ServiceConfig, log_path};
use update_resolver::query::{RolloutOverride, UpdateQuery};
use update_resolver::resolve::Resolver;
use update_resolver::{logging, response};

#[derive(Parser)]
#[command(name = "update-resolver")]
#[command(version, about = "Rule-driven update resolution for update-check requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one update-check request and print the response document
    Resolve {
        /// JSON catalog holding rules, releases and shutoffs
        #[arg(long)]
        catalog: PathBuf,
        /// Service configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override staged-rollout sampling
        #[arg(long, value_enum)]
        force: Option<Force>,
        /// Request path, e.g. /update/6/Firefox/.../update.xml?force=1
        path: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Force {
    Include,
    Exclude,
}

impl From<Force> for RolloutOverride {
    fn from(force: Force) -> Self {
        match force {
            Force::Include => RolloutOverride::ForceInclude,
            Force::Exclude => RolloutOverride::ForceExclude,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            catalog,
            config,
            force,
            path,
        } => {
            let config = match config {
                Some(path) => ServiceConfig::load(&path)?,
                None => ServiceConfig::default(),
            };
            let _guard = logging::init(&config.log_level, &log_path())?;

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(resolve(catalog, config, force, path))
        }
    }
}

async fn resolve(
    catalog: PathBuf,
    config: ServiceConfig,
    force: Option<Force>,
    request: String,
) -> anyhow::Result<()> {
    let catalog = Arc::new(JsonCatalog::load(&catalog)?);

    let (path, params) = request.split_once('?').unwrap_or((request.as_str(), ""));
    let params: Vec<(String, String)> = url::form_urlencoded::parse(params.as_bytes())
        .into_owned()
        .collect();
    let mut query = UpdateQuery::from_path(path)?
        .with_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(force) = force {
        query.force = force.into();
    }

    let resolver = Resolver::new(catalog.clone(), catalog.clone(), catalog)
        .with_shutoff_cache(config.shutoff_cache());
    let resolution = resolver.resolve(&query).await?;

    println!(
        "{}",
        response::render(
            &resolution,
            &config.whitelisted_domains,
            &config.special_force_hosts
        )
    );
    Ok(())
}
