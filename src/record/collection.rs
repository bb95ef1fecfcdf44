//! Ordered, deduplicated record storage.

use std::collections::HashSet;

use crate::record::item::{MediaRef, Record};

/// Records in first-seen order, unique by identifier.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    records: Vec<Record>,
    seen: HashSet<String>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection from previously saved records, dropping repeats.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut collection = Self::new();
        collection.extend_new(records);
        collection
    }

    /// Append the record unless its identifier was already seen.
    ///
    /// Returns whether the record was added.
    pub fn push(&mut self, record: Record) -> bool {
        if self.seen.contains(&record.id) {
            return false;
        }
        self.seen.insert(record.id.clone());
        self.records.push(record);
        true
    }

    /// Append every unseen record, preserving order. Returns the number added.
    pub fn extend_new(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut added = 0;
        for record in records {
            if self.push(record) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        if !self.contains(id) {
            return None;
        }
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view handed to exporters.
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Replace the media references of one record with their downloaded state.
    ///
    /// The reference count must match; mismatches are ignored.
    pub fn update_media(&mut self, id: &str, media: Vec<MediaRef>) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) if record.media.len() == media.len() => {
                record.media = media;
                true
            }
            _ => false,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
