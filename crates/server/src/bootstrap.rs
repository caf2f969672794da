//! Startup wiring: metadata store and domain filter mappings.

use anyhow::{Context, Result, bail};
use sitegate_core::config::AppConfig;
use sitegate_core::{EntityCapabilities, EntityDescriptor, MappingRegistry};
use sitegate_metadata::{MetadataError, MetadataStore};

/// Build the domain filter registry from the declared entity tables.
///
/// The accessor capabilities of each entity are read from its table: a
/// `domain_id` column provides the single-domain accessor and a `domain_ids`
/// column the multi-domain one. A declaration the table cannot satisfy
/// aborts startup.
pub async fn build_registry(
    metadata: &dyn MetadataStore,
    config: &AppConfig,
) -> Result<MappingRegistry> {
    let mut builder = MappingRegistry::builder();

    for entity in &config.entities {
        let columns = match metadata.table_columns(&entity.table).await {
            Ok(columns) => columns,
            Err(MetadataError::NotFound(_)) => bail!(
                "entity '{}' declares table '{}' which does not exist",
                entity.kind,
                entity.table
            ),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to inspect table '{}' of entity '{}'", entity.table, entity.kind)
                });
            }
        };

        let capabilities = EntityCapabilities {
            domain_id: columns.iter().any(|c| c == "domain_id"),
            domain_ids: columns.iter().any(|c| c == "domain_ids"),
        };
        if entity.filter.auto_domain_id && !columns.iter().any(|c| c == "id") {
            bail!(
                "entity '{}' table '{}' has no 'id' column",
                entity.kind,
                entity.table
            );
        }

        builder = builder
            .register_descriptor(EntityDescriptor {
                kind: entity.entity_kind(),
                filter: entity.filter,
                capabilities,
                table: Some(entity.table.clone()),
            })
            .with_context(|| format!("invalid domain filter for entity '{}'", entity.kind))?;

        tracing::debug!(
            kind = %entity.kind,
            table = %entity.table,
            auto_domain_id = entity.filter.auto_domain_id,
            for_all_domain_enabled = entity.filter.for_all_domain_enabled,
            "domain filter registered"
        );
    }

    let registry = builder.build();
    tracing::info!(entities = registry.len(), "domain filter mappings built");
    Ok(registry)
}
