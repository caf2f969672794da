use async_trait::async_trait;
use sitegate_core::Domain;
use sitegate_metadata::{
    AttachmentRepo, DomainRepo, DomainRow, EntityAttachmentRow, MetadataError, MetadataResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory domain repository that counts lookup queries.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockDomainRepo {
    rows: Mutex<Vec<DomainRow>>,
    pub select_calls: AtomicUsize,
    fail_next: AtomicBool,
}

#[allow(dead_code)]
impl MockDomainRepo {
    /// Repository holding `domains`, returned in the given order.
    pub fn with_domains(domains: &[Domain]) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(domains.iter().map(DomainRow::from).collect()),
            ..Default::default()
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next lookup query fail with a database error.
    pub fn fail_next_query(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn select_count(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> MetadataResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MetadataError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl DomainRepo for MockDomainRepo {
    async fn select_all_enabled_domains(&self) -> MetadataResult<Vec<DomainRow>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.is_enabled).cloned().collect())
    }

    async fn retrieve_by_domain(&self, host: &str) -> MetadataResult<Option<DomainRow>> {
        let rows = self.rows.lock().unwrap();
        let matches: Vec<_> = rows
            .iter()
            .filter(|r| r.is_enabled && r.host.as_deref() == Some(host))
            .collect();
        if matches.len() > 1 {
            return Err(MetadataError::Constraint(host.to_string()));
        }
        Ok(matches.first().map(|r| (*r).clone()))
    }

    async fn retrieve_by_master(&self) -> MetadataResult<Option<DomainRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.is_enabled && r.is_master).cloned())
    }

    async fn create_domain(&self, domain: &DomainRow) -> MetadataResult<()> {
        self.rows.lock().unwrap().push(domain.clone());
        Ok(())
    }

    async fn list_domains(&self) -> MetadataResult<Vec<DomainRow>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_domain(&self, domain_id: &str) -> MetadataResult<Option<DomainRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.domain_id == domain_id).cloned())
    }

    async fn get_domain_by_keyname(&self, keyname: &str) -> MetadataResult<Option<DomainRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.keyname.as_deref() == Some(keyname))
            .cloned())
    }

    async fn update_domain(&self, domain: &DomainRow) -> MetadataResult<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.domain_id == domain.domain_id) {
            Some(row) => {
                *row = domain.clone();
                Ok(())
            }
            None => Err(MetadataError::NotFound(domain.domain_id.clone())),
        }
    }

    async fn delete_domain(&self, domain_id: &str) -> MetadataResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.domain_id != domain_id);
        if rows.len() == before {
            return Err(MetadataError::NotFound(domain_id.to_string()));
        }
        Ok(())
    }
}

/// Attachment repository recording writes in memory.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockAttachmentRepo {
    /// table -> (entity id -> domain id)
    pub tables: Mutex<HashMap<String, HashMap<String, Option<String>>>>,
    pub writes: AtomicUsize,
}

#[allow(dead_code)]
impl MockAttachmentRepo {
    pub fn with_table(self, table: &str, ids: &[&str]) -> Self {
        self.tables.lock().unwrap().insert(
            table.to_string(),
            ids.iter().map(|id| (id.to_string(), None)).collect(),
        );
        self
    }

    pub fn domain_of(&self, table: &str, id: &str) -> Option<String> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|rows| rows.get(id).cloned().flatten())
    }
}

#[async_trait]
impl AttachmentRepo for MockAttachmentRepo {
    async fn table_columns(&self, table: &str) -> MetadataResult<Vec<String>> {
        if self.tables.lock().unwrap().contains_key(table) {
            Ok(vec!["id".to_string(), "domain_id".to_string()])
        } else {
            Err(MetadataError::NotFound(table.to_string()))
        }
    }

    async fn get_entity_attachment(
        &self,
        table: &str,
        entity_id: &str,
    ) -> MetadataResult<Option<EntityAttachmentRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(entity_id))
            .map(|domain_id| EntityAttachmentRow {
                entity_id: entity_id.to_string(),
                domain_id: domain_id.clone(),
            }))
    }

    async fn persist_attachment(
        &self,
        table: &str,
        entity_id: &str,
        domain_id: &str,
    ) -> MetadataResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.get_mut(table).and_then(|rows| rows.get_mut(entity_id)) else {
            return Ok(false);
        };
        *row = Some(domain_id.to_string());
        Ok(true)
    }

    async fn attach_unassigned(&self, table: &str, domain_id: &str) -> MetadataResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut attached = 0;
        for value in rows.values_mut().filter(|v| v.is_none()) {
            *value = Some(domain_id.to_string());
            attached += 1;
        }
        Ok(attached)
    }
}
