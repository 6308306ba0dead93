pub mod app_config;
pub mod memory_repo;
pub mod json_repo;

use cashdrop_core::{BoxError, OrderRepository};
use std::sync::Arc;

pub use app_config::{Backend, Config, PersistenceConfig, SimulationConfig, TrackingConfig};
pub use json_repo::JsonFileOrderRepository;
pub use memory_repo::InMemoryOrderRepository;

/// Repository selected by `persistence.backend`
pub async fn build_repository(config: &PersistenceConfig) -> Result<Arc<dyn OrderRepository>, BoxError> {
    let repository: Arc<dyn OrderRepository> = match config.backend {
        Backend::Memory => Arc::new(InMemoryOrderRepository::new()),
        Backend::Json => Arc::new(JsonFileOrderRepository::open(&config.data_dir).await?),
    };
    tracing::info!("Using {:?} order repository", config.backend);
    Ok(repository)
}
