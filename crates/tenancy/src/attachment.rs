//! Accumulated domain attachments of one request.

use sitegate_core::EntityKind;

/// One visit of a domain-aware entity during tagging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachedEntity {
    pub kind: EntityKind,
    pub entity_id: String,
    /// Domain carried by the entity after tagging, if any.
    pub domain_id: Option<String>,
}

/// Owned buffer of tagged entities, drained once when the request flushes.
#[derive(Clone, Debug, Default)]
pub struct AttachmentBatch {
    entries: Vec<AttachedEntity>,
}

impl AttachmentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: AttachedEntity) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttachedEntity> {
        self.entries.iter()
    }

    /// Number of times the given entity was visited.
    pub fn visits(&self, kind: &EntityKind, entity_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| &e.kind == kind && e.entity_id == entity_id)
            .count()
    }

    /// Last recorded state of every entity, in first-visit order.
    pub fn latest(&self) -> Vec<&AttachedEntity> {
        let mut latest: Vec<&AttachedEntity> = Vec::new();
        for entry in &self.entries {
            match latest
                .iter_mut()
                .find(|seen| seen.kind == entry.kind && seen.entity_id == entry.entity_id)
            {
                Some(seen) => *seen = entry,
                None => latest.push(entry),
            }
        }
        latest
    }
}

impl IntoIterator for AttachmentBatch {
    type Item = AttachedEntity;
    type IntoIter = std::vec::IntoIter<AttachedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttachmentBatch {
    type Item = &'a AttachedEntity;
    type IntoIter = std::slice::Iter<'a, AttachedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
