use anyhow::Context;
use tally_config::TallyConfig;
use tally_db::TallyDb;
use tally_llm::{Assistant, OpenAiCompatClient};

use crate::router::IntentRouter;

pub fn load_config() -> anyhow::Result<TallyConfig> {
    TallyConfig::load_with_dotenv().context("failed to load tally configuration")
}

/// Open the ledger, create missing tables, and wire up the model client.
pub async fn build_router(config: &TallyConfig) -> anyhow::Result<IntentRouter<OpenAiCompatClient>> {
    let db = TallyDb::open_local(&config.database.path)
        .await
        .with_context(|| format!("failed to open ledger at {}", config.database.path))?;
    let created = db
        .ensure_schema()
        .await
        .context("failed to create ledger tables")?;
    if !created.is_empty() {
        tracing::debug!(?created, path = db.path(), "bootstrapped ledger");
    }

    let client =
        OpenAiCompatClient::new(&config.llm).context("failed to build language-model client")?;
    tracing::debug!(model = client.model(), policy = %config.query.policy, "router ready");

    Ok(IntentRouter::new(db, Assistant::new(client), config.query.policy))
}
