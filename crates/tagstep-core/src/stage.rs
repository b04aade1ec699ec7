use crate::error::{Result, TagstepError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// StageEntry
// ---------------------------------------------------------------------------

/// One row of the progression: `tag` advances to `next`, or is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl StageEntry {
    pub fn new(tag: impl Into<String>, next: Option<&str>) -> Self {
        Self {
            tag: tag.into(),
            next: next.map(str::to_string),
        }
    }
}

/// The progression used when the config file does not override it.
pub fn default_stages() -> Vec<StageEntry> {
    vec![
        StageEntry::new("M1", Some("M2")),
        StageEntry::new("M2", Some("M3")),
        StageEntry::new("M3", None),
    ]
}

// ---------------------------------------------------------------------------
// StageMap
// ---------------------------------------------------------------------------

/// Ordered, acyclic successor function over tag names.
///
/// Construction rejects duplicate keys and cycles, so every `StageMap` value
/// is safe to walk with repeated `successor` lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMap {
    entries: Vec<StageEntry>,
    index: HashMap<String, usize>,
}

impl StageMap {
    pub fn new(entries: Vec<StageEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.tag.is_empty() {
                return Err(TagstepError::InvalidStageMap(
                    "stage tag names must not be empty".to_string(),
                ));
            }
            if index.insert(entry.tag.clone(), i).is_some() {
                return Err(TagstepError::InvalidStageMap(format!(
                    "tag '{}' is listed more than once",
                    entry.tag
                )));
            }
        }
        let map = Self { entries, index };
        map.check_acyclic()?;
        Ok(map)
    }

    /// A linear chain: each tag advances to the one after it, the last is terminal.
    pub fn chain<S: AsRef<str>>(tags: &[S]) -> Result<Self> {
        let entries = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                StageEntry::new(tag.as_ref(), tags.get(i + 1).map(|n| n.as_ref()))
            })
            .collect();
        Self::new(entries)
    }

    pub fn successor(&self, tag: &str) -> Option<&str> {
        let i = *self.index.get(tag)?;
        self.entries[i].next.as_deref()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Successors that never appear as a key. Legal (they behave as terminal)
    /// but usually a typo in hand-written config.
    pub fn dangling_successors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.next.as_deref())
            .filter(|next| !self.contains(next))
            .collect()
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut cleared: HashSet<&str> = HashSet::new();
        for entry in &self.entries {
            let mut seen: Vec<&str> = Vec::new();
            let mut current = Some(entry.tag.as_str());
            while let Some(tag) = current {
                if cleared.contains(tag) {
                    break;
                }
                if seen.contains(&tag) {
                    seen.push(tag);
                    return Err(TagstepError::InvalidStageMap(format!(
                        "cycle detected: {}",
                        seen.join(" -> ")
                    )));
                }
                seen.push(tag);
                current = self.successor(tag);
            }
            cleared.extend(seen);
        }
        Ok(())
    }
}

impl Default for StageMap {
    fn default() -> Self {
        let entries = default_stages();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.tag.clone(), i))
            .collect();
        Self { entries, index }
    }
}
