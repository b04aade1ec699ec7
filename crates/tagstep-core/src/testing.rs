//! In-memory [`ListClient`] that records every call, for unit tests.

use crate::client::ListClient;
use crate::error::{RemoteCause, Result, TagstepError};
use crate::types::{BatchAck, BatchOperation, ListSummary, Member, TagStatus};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchLists,
    FetchMembers(String),
    SubmitBatch(Vec<BatchOperation>),
}

/// A batch the fake accepted, decoded back into tag / status / members.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedBatch {
    pub tag: String,
    pub status: TagStatus,
    pub member_ids: Vec<String>,
    pub paths: Vec<String>,
}

#[derive(Default)]
pub struct FakeListClient {
    lists: Vec<ListSummary>,
    members: Vec<Member>,
    fail_batch_at: Option<usize>,
    calls: RefCell<Vec<Call>>,
    accepted: RefCell<Vec<SubmittedBatch>>,
}

impl FakeListClient {
    pub fn with_list(mut self, id: &str, name: &str) -> Self {
        self.lists.push(ListSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Make the `n`th batch submission (0-based) fail with HTTP 500.
    pub fn fail_batch_at(mut self, n: usize) -> Self {
        self.fail_batch_at = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn batches(&self) -> Vec<SubmittedBatch> {
        self.accepted.borrow().clone()
    }
}

impl ListClient for FakeListClient {
    fn fetch_lists(&self) -> Result<Vec<ListSummary>> {
        self.calls.borrow_mut().push(Call::FetchLists);
        Ok(self.lists.clone())
    }

    fn fetch_members_with_tags(&self, list_id: &str) -> Result<Vec<Member>> {
        self.calls
            .borrow_mut()
            .push(Call::FetchMembers(list_id.to_string()));
        Ok(self.members.clone())
    }

    fn submit_batch(&self, operations: &[BatchOperation]) -> Result<BatchAck> {
        let index = {
            let mut calls = self.calls.borrow_mut();
            let index = calls
                .iter()
                .filter(|c| matches!(c, Call::SubmitBatch(_)))
                .count();
            calls.push(Call::SubmitBatch(operations.to_vec()));
            index
        };
        if self.fail_batch_at == Some(index) {
            return Err(TagstepError::remote(
                RemoteCause::Status(500),
                "fake://batches",
            ));
        }

        let first = operations
            .first()
            .map(|op| op.mutations())
            .transpose()?
            .and_then(|m| m.into_iter().next());
        if let Some(mutation) = first {
            self.accepted.borrow_mut().push(SubmittedBatch {
                tag: mutation.name,
                status: mutation.status,
                member_ids: operations
                    .iter()
                    .filter_map(|op| op.path.split('/').nth(4).map(str::to_string))
                    .collect(),
                paths: operations.iter().map(|op| op.path.clone()).collect(),
            });
        }
        Ok(BatchAck {
            id: format!("batch_{index}"),
            status: Some("pending".to_string()),
        })
    }
}
