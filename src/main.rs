use actix_multipart::form::MultipartFormConfig;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

mod api;
mod cli;
mod collectors;
mod config;
mod db;
mod dedup;
mod harvest;
mod import;
mod logging;
mod record;
mod shutdown;
mod sources;
mod store;
mod worker;

use crate::api::{health::health_config, job::handlers::job_config, job::JobService, validation};
use crate::cli::{Cli, Command};
use crate::collectors::HttpFetcher;
use crate::config::Config;
use crate::harvest::Harvester;
use crate::shutdown::{ServerTask, ShutdownCoordinator};
use crate::store::RecordStore;
use crate::worker::Scheduler;

/// Log a startup failure and turn it into the process error
fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::other(format!("{}: {}", context, e))
}

fn build_harvester(config: &Config, store: Arc<dyn RecordStore>) -> std::io::Result<Harvester> {
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout)
        .map_err(|e| startup_error("Failed to build HTTP client", e))?;

    Ok(Harvester::new(
        config.sources_file.clone(),
        Arc::new(fetcher),
        store,
        config.collect_options(),
    ))
}

fn start_server(config: &Config, store: Arc<dyn RecordStore>) -> std::io::Result<ServerTask> {
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        let job_service = web::Data::new(JobService::new(store.clone()));

        // Configure payload size limits globally
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);

        let multipart_config = MultipartFormConfig::default().total_limit(max_payload_size);

        App::new()
            .app_data(web::Data::from(store.clone()))
            .app_data(job_service)
            .app_data(payload_config)
            .app_data(multipart_config)
            .app_data(validation::query_config())
            .configure(health_config)
            .configure(job_config)
    });

    info!("Server starting on http://{}:{}", config.bind_addr, config.port);

    let server = server.bind((config.bind_addr.as_str(), config.port))?.run();

    // Get server handle for graceful shutdown
    let handle = server.handle();
    let task = tokio::spawn(server);

    Ok(ServerTask { handle, task })
}

async fn open_store(config: &Config) -> std::io::Result<Arc<dyn RecordStore>> {
    store::open_store(config)
        .await
        .map_err(|e| startup_error("Failed to open record store", e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment; logging comes first so a bad setting is logged
    let config = Config::from_env();
    let log_dir = match &config {
        Ok(config) => config.log_dir.clone(),
        Err(_) => Config::log_dir_from_env(),
    };
    logging::init(&log_dir)?;

    let mut config = config.map_err(|e| startup_error("Invalid configuration", e))?;
    if let Some(backend) = cli.store {
        config.store_backend = backend;
    }
    if let Some(sources) = cli.sources {
        config.sources_file = sources;
    }

    info!("Starting job-harvester");
    info!("Configuration loaded successfully:");
    info!("  - Store backend: {}", config.store_backend);
    info!("  - Dedup key: {}", config.dedup_key);
    info!("  - Sources file: {}", config.sources_file.display());
    info!("  - Max pages per source: {}", config.max_pages);
    info!("  - Page delay: {:?}", config.page_delay);

    match cli.command {
        Command::Sources => {
            let entries = sources::load_sources(&config.sources_file);
            for entry in &entries {
                println!("{:>4}  {}", entry.line, entry);
            }
            println!("{} sources", entries.len());
            Ok(())
        }
        Command::Run => {
            let store = open_store(&config).await?;
            let harvester = build_harvester(&config, store.clone())?;
            let report = harvester.run_cycle().await;
            store.close().await;

            if report.collected > 0 && report.merge.is_none() {
                return Err(startup_error("Harvest failed", "collected jobs could not be stored"));
            }
            Ok(())
        }
        Command::Import { file } => {
            let store = open_store(&config).await?;
            let result = import::import_csv(&file, store.as_ref()).await;
            store.close().await;

            let report = result.map_err(|e| startup_error("Import failed", e))?;
            println!(
                "Imported {}: {} added, {} duplicates skipped, {} stored",
                file.display(),
                report.added,
                report.duplicates,
                report.total
            );
            Ok(())
        }
        Command::Serve => {
            let store = open_store(&config).await?;
            let (shutdown_tx, _) = tokio::sync::watch::channel(false);
            let server = start_server(&config, store.clone())?;

            ShutdownCoordinator::new(Some(server), Vec::new(), shutdown_tx, store)
                .wait_for_shutdown()
                .await
        }
        Command::Schedule { serve } => {
            let store = open_store(&config).await?;
            // watch channel allows multiple receivers to get the same value
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

            let harvester = Arc::new(build_harvester(&config, store.clone())?);
            let scheduler = Scheduler::new(harvester, config.cycle_interval);
            let scheduler_handle = tokio::spawn(async move {
                scheduler.run(shutdown_rx).await;
            });
            info!("Spawned harvest scheduler");

            let server = if serve {
                Some(start_server(&config, store.clone())?)
            } else {
                None
            };

            ShutdownCoordinator::new(server, vec![scheduler_handle], shutdown_tx, store)
                .wait_for_shutdown()
                .await
        }
    }
}
