use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag name → member ids, in the order members were encountered.
pub type TagMembers = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// TagStatus
// ---------------------------------------------------------------------------

/// The remote service removes a tag by marking it inactive, never by deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStatus {
    Active,
    Inactive,
}

impl TagStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TagStatus::Active => "active",
            TagStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Lists and members
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(rename = "email_address")]
    pub email: String,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

impl Member {
    pub fn new(id: impl Into<String>, email: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            tags: tags
                .iter()
                .map(|t| TagRef {
                    name: (*t).to_string(),
                })
                .collect(),
        }
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMutation {
    pub name: String,
    pub status: TagStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TagMutationBody {
    tags: Vec<TagMutation>,
}

/// One per-member tag mutation inside a batch request. `body` is itself a
/// JSON document encoded as a string, as the batch endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperation {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl BatchOperation {
    pub fn set_member_tag(
        list_id: &str,
        member_id: &str,
        tag_name: &str,
        status: TagStatus,
    ) -> crate::Result<Self> {
        let body = TagMutationBody {
            tags: vec![TagMutation {
                name: tag_name.to_string(),
                status,
            }],
        };
        Ok(Self {
            method: "POST".to_string(),
            path: format!("/lists/{list_id}/members/{member_id}/tags"),
            body: serde_json::to_string(&body)?,
        })
    }

    /// Decode the embedded body back into its tag mutations.
    pub fn mutations(&self) -> crate::Result<Vec<TagMutation>> {
        let body: TagMutationBody = serde_json::from_str(&self.body)?;
        Ok(body.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAck {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// PendingBatch / AdvancementResult
// ---------------------------------------------------------------------------

/// All member ids that need one tag set to one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    pub tag_name: String,
    pub member_ids: Vec<String>,
    pub status: TagStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancementResult {
    pub added: TagMembers,
    pub removed: TagMembers,
}

impl AdvancementResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Additions first, then removals, so no member is ever left without
    /// either the old or the new stage tag.
    pub fn pending_batches(&self) -> Vec<PendingBatch> {
        let adds = self.added.iter().map(|(tag, ids)| PendingBatch {
            tag_name: tag.clone(),
            member_ids: ids.clone(),
            status: TagStatus::Active,
        });
        let removes = self.removed.iter().map(|(tag, ids)| PendingBatch {
            tag_name: tag.clone(),
            member_ids: ids.clone(),
            status: TagStatus::Inactive,
        });
        adds.chain(removes).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_decodes_email_address_field() {
        let json = r#"{"id":"m1","email_address":"a@x.com","tags":[{"id":7,"name":"M1"}]}"#;
        let member: Member = serde_json::from_str(json).unwrap();
        assert_eq!(member.email, "a@x.com");
        assert_eq!(member.tag_names().collect::<Vec<_>>(), vec!["M1"]);
    }

    #[test]
    fn member_without_tags_field_has_no_tags() {
        let member: Member = serde_json::from_str(r#"{"id":"m1","email_address":"a@x.com"}"#).unwrap();
        assert!(member.tags.is_empty());
    }

    #[test]
    fn batch_operation_targets_member_tag_collection() {
        let op = BatchOperation::set_member_tag("123", "456", "tag1", TagStatus::Active).unwrap();
        assert_eq!(op.method, "POST");
        assert_eq!(op.path, "/lists/123/members/456/tags");
        assert_eq!(op.body, r#"{"tags":[{"name":"tag1","status":"active"}]}"#);
        assert_eq!(
            op.mutations().unwrap(),
            vec![TagMutation {
                name: "tag1".into(),
                status: TagStatus::Active
            }]
        );
    }

    #[test]
    fn pending_batches_put_additions_before_removals() {
        let mut result = AdvancementResult::default();
        result.removed.insert("A".into(), vec!["m1".into()]);
        result.added.insert("B".into(), vec!["m1".into()]);
        result.added.insert("C".into(), vec!["m2".into()]);

        let statuses: Vec<_> = result
            .pending_batches()
            .iter()
            .map(|b| (b.tag_name.clone(), b.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("B".to_string(), TagStatus::Active),
                ("C".to_string(), TagStatus::Active),
                ("A".to_string(), TagStatus::Inactive),
            ]
        );
    }
}
