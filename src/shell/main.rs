use sales_groups::modules::groups::adapters::outbound::gateway_http::HttpEntityGateway;
use sales_groups::modules::groups::adapters::outbound::notifier::TracingNotifier;
use sales_groups::shell::config::Config;
use sales_groups::shell::context::SyncContext;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;
    tracing::info!(
        api = %config.api_base_url,
        interval_secs = config.sync.interval.as_secs(),
        max_attempts = ?config.sync.max_attempts,
        "starting sales groups sync"
    );

    let gateway = Arc::new(HttpEntityGateway::new(
        &config.api_base_url,
        config.page_size,
        config.request_timeout,
    )?);
    let context = SyncContext::init(
        gateway,
        Arc::new(TracingNotifier),
        config.sync.clone(),
        config.history_capacity,
    );

    match context.store().fetch_all().await {
        Ok(()) => {
            let state = context.store().snapshot();
            for group in &state.groups {
                tracing::info!(
                    id = %group.id,
                    name = %group.name,
                    leader = group.leader.as_deref().unwrap_or("-"),
                    members = group.member_count,
                    sold = group.sold_this_month,
                    quota = group.monthly_quota,
                    "group"
                );
            }
            tracing::info!(
                groups = state.groups.len(),
                leader_candidates = state.leader_candidates.len(),
                available_sellers = state.available_sellers.len(),
                "groups loaded"
            );
        }
        Err(error) => tracing::error!(%error, "initial load failed"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let left = context.dispose().await;
    if left > 0 {
        anyhow::bail!("{left} change(s) could not be synced");
    }
    Ok(())
}
