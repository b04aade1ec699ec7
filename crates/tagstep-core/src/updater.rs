use crate::client::ListClient;
use crate::config::MAX_CHUNK_SIZE;
use crate::error::Result;
use crate::types::{BatchOperation, PendingBatch, TagStatus};
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

/// The audit tag stamped next to every activated stage tag:
/// `"<tag> - dd.mm.yyyy."`, trailing period included.
pub fn dated_tag_name(tag_name: &str, date: NaiveDate) -> String {
    format!("{tag_name} - {}", date.format("%d.%m.%Y."))
}

// ---------------------------------------------------------------------------
// BatchTagUpdater
// ---------------------------------------------------------------------------

/// Applies one tag status to many members through the batch endpoint.
///
/// Application is at-least-once and not transactional: when a chunk fails
/// after its retries, earlier chunks stay applied on the remote side and later
/// chunks are never sent. Re-running is safe because setting the same status
/// twice is a no-op remotely.
pub struct BatchTagUpdater<'a, C: ListClient + ?Sized> {
    client: &'a C,
    chunk_size: usize,
    date: Option<NaiveDate>,
}

impl<'a, C: ListClient + ?Sized> BatchTagUpdater<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            chunk_size: MAX_CHUNK_SIZE,
            date: None,
        }
    }

    /// Clamped into `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Stamp dated tags with a fixed date instead of today's local date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set `tag_name` to `status` on every member in `member_ids`.
    ///
    /// Activation also sets the dated companion tag, one extra batch per
    /// chunk right after the primary one. The date is taken once per call so
    /// every chunk carries the same stamp.
    pub fn apply(
        &self,
        list_id: &str,
        tag_name: &str,
        member_ids: &[String],
        status: TagStatus,
    ) -> Result<()> {
        let dated = match status {
            TagStatus::Active => {
                let date = self.date.unwrap_or_else(|| Local::now().date_naive());
                Some(dated_tag_name(tag_name, date))
            }
            TagStatus::Inactive => None,
        };

        let chunks = member_ids.len().div_ceil(self.chunk_size);
        for (i, chunk) in member_ids.chunks(self.chunk_size).enumerate() {
            self.submit(list_id, tag_name, chunk, status)?;
            if let Some(dated) = &dated {
                self.submit(list_id, dated, chunk, status)?;
            }
            info!(
                list_id,
                tag = tag_name,
                %status,
                chunk = i + 1,
                chunks,
                members = chunk.len(),
                "applied tag batch"
            );
        }
        Ok(())
    }

    pub fn apply_batch(&self, list_id: &str, batch: &PendingBatch) -> Result<()> {
        self.apply(list_id, &batch.tag_name, &batch.member_ids, batch.status)
    }

    fn submit(
        &self,
        list_id: &str,
        tag_name: &str,
        member_ids: &[String],
        status: TagStatus,
    ) -> Result<()> {
        let operations = member_ids
            .iter()
            .map(|id| BatchOperation::set_member_tag(list_id, id, tag_name, status))
            .collect::<Result<Vec<_>>>()?;
        let ack = self.client.submit_batch(&operations)?;
        debug!(
            batch_id = %ack.id,
            tag = tag_name,
            operations = operations.len(),
            "batch accepted"
        );
        Ok(())
    }
}
