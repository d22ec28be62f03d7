use contentful_sync::{Connector, ConnectorConfig, SyncRunner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConnectorConfig::from_env()?;
    let connector = Connector::new(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling sync");
            on_signal.cancel();
        }
    });

    info!(organization_id = %config.organization_id, "Syncing Contentful organization");
    let snapshot = SyncRunner::new(&connector).run(&cancel).await?;

    if snapshot.report.has_errors() {
        warn!(errors = snapshot.report.errors.len(), "Sync finished with errors");
    }
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
