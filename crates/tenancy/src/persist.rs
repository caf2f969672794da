//! Persistence of tagged entities and the attachment migration.

use crate::attachment::AttachmentBatch;
use crate::error::TenancyResult;
use crate::management::DomainsManagement;
use sitegate_core::{DomainId, EntityKind, MappingRegistry};
use sitegate_metadata::AttachmentRepo;

/// Write the final domain of every tagged entity to its table.
///
/// Entities visited several times are written once with their last state.
/// Kinds without a backing table and entities without a domain are skipped.
/// Returns the number of rows written.
pub async fn flush_attachments(
    store: &dyn AttachmentRepo,
    registry: &MappingRegistry,
    batch: AttachmentBatch,
) -> TenancyResult<u64> {
    let mut persisted = 0;

    for entry in batch.latest() {
        let Some(domain_id) = entry.domain_id.as_deref() else {
            continue;
        };
        let Some(table) = registry.table_for(&entry.kind) else {
            tracing::debug!(kind = %entry.kind, "no table declared, attachment not persisted");
            continue;
        };

        if store
            .persist_attachment(table, &entry.entity_id, domain_id)
            .await?
        {
            persisted += 1;
        } else {
            tracing::warn!(
                kind = %entry.kind,
                table,
                entity_id = %entry.entity_id,
                "tagged entity has no stored row"
            );
        }
    }

    Ok(persisted)
}

/// Rows attached in one table by [`migrate_attachments`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMigration {
    pub kind: EntityKind,
    pub table: String,
    pub attached: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationReport {
    /// Domain stamped onto untagged rows.
    pub domain_id: DomainId,
    pub tables: Vec<TableMigration>,
}

impl MigrationReport {
    pub fn total(&self) -> u64 {
        self.tables.iter().map(|t| t.attached).sum()
    }
}

/// Attach every untagged row of every auto-domain table to the master domain.
///
/// `management` must be initialized. Running it twice attaches nothing the
/// second time.
pub async fn migrate_attachments(
    management: &DomainsManagement,
    store: &dyn AttachmentRepo,
    registry: &MappingRegistry,
) -> TenancyResult<MigrationReport> {
    let master = management.domain_master()?;
    if master.id.is_reserved() {
        tracing::warn!(
            domain_id = %master.id,
            "no master domain stored, untagged rows get the synthesized master id"
        );
    }

    let mut report = MigrationReport {
        domain_id: master.id.clone(),
        tables: Vec::new(),
    };

    for mapping in registry.iter().filter(|m| m.auto_domain_id()) {
        let Some(table) = mapping.table() else {
            continue;
        };
        let attached = store.attach_unassigned(table, master.id.as_str()).await?;
        tracing::info!(
            kind = %mapping.kind(),
            table,
            attached,
            domain_id = %master.id,
            "attached untagged rows to master domain"
        );
        report.tables.push(TableMigration {
            kind: mapping.kind().clone(),
            table: table.to_string(),
            attached,
        });
    }

    Ok(report)
}
