use crate::types::{AdvancementResult, TagMembers};
use serde::Serialize;

pub const PROPAGATION_NOTE: &str = "It might take some time for updates to reflect in Mailchimp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub members: usize,
}

/// Per-tag member counts for one run, sorted by tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvanceReport {
    pub list: String,
    pub dry_run: bool,
    pub added: Vec<TagCount>,
    pub removed: Vec<TagCount>,
}

fn counts(map: &TagMembers) -> Vec<TagCount> {
    // BTreeMap iteration is already in tag order
    map.iter()
        .map(|(tag, ids)| TagCount {
            tag: tag.clone(),
            members: ids.len(),
        })
        .collect()
}

impl AdvanceReport {
    pub fn new(list: impl Into<String>, result: &AdvancementResult, dry_run: bool) -> Self {
        Self {
            list: list.into(),
            dry_run,
            added: counts(&result.added),
            removed: counts(&result.removed),
        }
    }

    pub fn total_added(&self) -> usize {
        self.added.iter().map(|c| c.members).sum()
    }

    /// Human-readable summary: one line per added tag, or "No tags added".
    pub fn render(&self) -> String {
        if self.added.is_empty() {
            return "No tags added".to_string();
        }
        let heading = if self.dry_run {
            "Number of updates per tag (dry run, nothing sent):"
        } else {
            "Number of updates per tag:"
        };
        let mut out = String::from(heading);
        out.push_str("\n\n");
        for c in &self.added {
            out.push_str(&format!("- {}: {}\n", c.tag, c.members));
        }
        if !self.dry_run {
            out.push_str(&format!("\n({PROPAGATION_NOTE})\n"));
        }
        out
    }
}
