//! Create the administrator account if it does not exist yet.
//!
//! Usage: `seed-admin [config.yaml]` (defaults to `config/rewear.yaml`).

use anyhow::Context;
use rewear::logging::init_logging;
use rewear::{MarketConfig, MarketService};
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG: &str = "config/rewear.yaml";

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = MarketConfig::load_or_default(&path)?;
    let _guard = init_logging(&config);

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = sled::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    let service = MarketService::new(Arc::new(db), config.rules)?;

    let (admin, created) = service.ensure_admin(&config.admin.name, &config.admin.email)?;
    if created {
        info!(user = %admin.id, email = %admin.email, "admin user created");
    } else {
        info!(user = %admin.id, email = %admin.email, "admin user already exists");
    }

    service.store().flush()?;
    Ok(())
}
