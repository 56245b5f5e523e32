use std::sync::Arc;
use chrono::Utc;
use dotenv::dotenv;
use tracing_log::log::info;
use defect_tracker::configuration::Settings;
use defect_tracker::seed::init_demo_data;
use defect_tracker::storage::DatabaseStorage;
use defect_tracker::telemetry::{get_subscriber, init_subscriber};
use defect_tracker::DefectApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "defect_tracker".into(),
        "info,sqlx=warn".into(),
        std::io::stdout
    );
    init_subscriber(subscriber)?;

    info!("Starting defect tracker...");

    dotenv().ok();
    let settings = Settings::from_env()?;
    info!("Environment loaded");

    let storage = DatabaseStorage::connect(&settings.database).await?;
    storage.migrate().await?;

    if settings.seed_demo_data {
        let seeded = init_demo_data(&storage).await?;
        info!("Demo data seeded: {}", seeded);
    }

    let api = DefectApi::from_settings(Arc::new(storage), &settings);

    let stats = api.dashboard_stats(Utc::now()).await?;
    info!("Dashboard: {}", serde_json::to_string(&stats)?);

    let summaries = api.project_summaries().await?;
    for summary in summaries.data.unwrap_or_default() {
        info!(
            "{}: {} defects, {} open, {} critical",
            summary.project.name,
            summary.total_defects,
            summary.open_defects,
            summary.critical_defects
        );
    }

    Ok(())
}
