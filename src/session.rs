use std::collections::HashMap;

use crate::{record::Record, search::SearchIndex, tags::TagUpdate};

/// Where the records of a session came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Cache,
    Snapshot,
    /// Nothing could be loaded; the page only shows "No data".
    Unavailable,
}

/// Everything a page session knows: the dataset plus its two lookup maps.
#[derive(Debug)]
pub struct Session {
    records: Vec<Record>,
    by_key: HashMap<String, usize>,
    by_human_key: HashMap<String, usize>,
    origin: Origin,
    version: Option<String>,
    render_due: bool,
}

impl Session {
    pub fn new(records: Vec<Record>, origin: Origin, version: Option<String>) -> Self {
        let by_key = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();
        let by_human_key = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.human_key.clone(), i))
            .collect();
        Session {
            records,
            by_key,
            by_human_key,
            origin,
            version,
            render_due: false,
        }
    }

    pub fn unavailable() -> Self {
        Session::new(Vec::new(), Origin::Unavailable, None)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_unavailable(&self) -> bool {
        self.origin == Origin::Unavailable
    }

    pub fn by_human_key(&self, human_key: &str) -> Option<&Record> {
        self.by_human_key.get(human_key).map(|&i| &self.records[i])
    }

    /// Append late-arriving tags to their record. Returns `false` for unknown keys.
    pub fn apply(&mut self, update: TagUpdate) -> bool {
        let Some(&i) = self.by_key.get(&update.key) else {
            log::debug!("tags for unknown record {}", update.key);
            return false;
        };
        self.records[i].tags.extend(update.tags);
        self.render_due = true;
        true
    }

    /// Whether something changed since the last call.
    pub fn take_render_due(&mut self) -> bool {
        std::mem::take(&mut self.render_due)
    }

    /// Run a query against the current records. The index is rebuilt each time, so tags
    /// applied since the last query are always searchable.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        SearchIndex::build(&self.records).search(query)
    }
}
