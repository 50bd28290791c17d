//! Builds the configured store once at startup.

use std::sync::Arc;

use tracing::info;

use crate::application::store::BlogStore;
use crate::config::{StoreBackend, StoreSettings};

use super::{db::PostgresStore, error::InfraError, rest::PostgrestStore};

pub fn connect(settings: &StoreSettings) -> Result<Arc<dyn BlogStore>, InfraError> {
    let store: Arc<dyn BlogStore> = match &settings.backend {
        StoreBackend::Rest(rest) => {
            info!(
                target = "sanluis::store",
                backend = "rest",
                url = %rest.url,
                collection = %settings.collection,
                "using PostgREST store"
            );
            Arc::new(PostgrestStore::new(
                rest.url.clone(),
                rest.api_key.clone(),
                settings.request_timeout,
            )?)
        }
        StoreBackend::Postgres(pg) => {
            info!(
                target = "sanluis::store",
                backend = "postgres",
                max_connections = pg.max_connections.get(),
                collection = %settings.collection,
                "using Postgres store"
            );
            let pool = PostgresStore::connect_lazy(
                &pg.url,
                pg.max_connections.get(),
                settings.request_timeout,
            )
            .map_err(|err| InfraError::database(err.to_string()))?;
            Arc::new(PostgresStore::new(pool))
        }
    };

    Ok(store)
}
