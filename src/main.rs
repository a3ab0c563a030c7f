use anyhow::Result;
use std::sync::Arc;
use tarif_edf::config::Config;
use tarif_edf::coordinator::TarifCoordinator;
use tarif_edf::fetch::HttpFetcher;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tarif_edf::logging::init_logging(&config.logging)?;

    info!(
        "Tarif EDF {} starting up ({} {}kVA)",
        env!("APP_VERSION"),
        config.contract.contract_type,
        config.contract.contract_power
    );

    let fetcher = Arc::new(HttpFetcher::new(&config.endpoints)?);
    let mut coordinator = TarifCoordinator::new(config, fetcher)
        .map_err(|e| anyhow::anyhow!("Failed to create coordinator: {}", e))?;
    let web_config = coordinator.config().web.clone();

    #[cfg(feature = "web")]
    let web_task = web_config.enabled.then(|| {
        let snapshots = coordinator.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                tarif_edf::web::serve(snapshots, &web_config.host, web_config.port).await
            {
                error!("Web server error: {}", e);
            }
        })
    });
    #[cfg(not(feature = "web"))]
    let _ = web_config;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let result = coordinator.run(shutdown).await;

    #[cfg(feature = "web")]
    if let Some(task) = web_task {
        task.abort();
    }

    match result {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Coordinator failed with error: {}", e);
            Err(anyhow::anyhow!("Coordinator error: {}", e))
        }
    }
}
