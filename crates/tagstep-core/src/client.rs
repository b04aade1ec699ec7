//! Remote list client.
//!
//! Every request to the mailing-list service goes through [`ListClient`].
//! [`HttpListClient`] is the real implementation; each of its calls runs
//! inside the configured [`RetryPolicy`].

use crate::config::{Config, Credentials};
use crate::error::{RemoteCause, Result, TagstepError};
use crate::retry::RetryPolicy;
use crate::types::{BatchAck, BatchOperation, ListSummary, Member};
use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ---------------------------------------------------------------------------
// ListClient
// ---------------------------------------------------------------------------

pub trait ListClient {
    /// All lists in the account, as `(id, name)` pairs.
    fn fetch_lists(&self) -> Result<Vec<ListSummary>>;

    /// Every member of `list_id` with id, email and tags, in one unpaginated call.
    fn fetch_members_with_tags(&self, list_id: &str) -> Result<Vec<Member>>;

    /// Submit one batch request. The caller keeps `operations` within the
    /// batch size limit.
    fn submit_batch(&self, operations: &[BatchOperation]) -> Result<BatchAck>;

    /// Id of the list whose name matches `name` exactly. When several lists
    /// share the name, the last one listed wins.
    fn lookup_list_id(&self, name: &str) -> Result<String> {
        self.fetch_lists()?
            .into_iter()
            .rev()
            .find(|list| list.name == name)
            .map(|list| list.id)
            .ok_or_else(|| TagstepError::ListNotFound(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ListsResponse {
    lists: Vec<ListSummary>,
}

#[derive(Deserialize)]
struct MembersResponse {
    members: Vec<Member>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    operations: &'a [BatchOperation],
}

// ---------------------------------------------------------------------------
// HttpListClient
// ---------------------------------------------------------------------------

pub struct HttpListClient {
    http: Client,
    credentials: Credentials,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpListClient {
    pub fn new(credentials: Credentials, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tagstep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TagstepError::Config(format!("failed to build HTTP client: {e}")))?;
        let base_url = credentials.base_url();
        Ok(Self {
            http,
            credentials,
            base_url,
            retry,
        })
    }

    pub fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        Self::new(credentials, config.timeout(), config.retry_policy())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, what: &str, url: &str) -> Result<T> {
        self.retry.run(what, |attempt| {
            debug!(call = what, attempt, url, "GET");
            let sent = self
                .http
                .get(url)
                .header(AUTHORIZATION, self.credentials.bearer())
                .send();
            decode(sent, url)
        })
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.retry.run(what, |attempt| {
            debug!(call = what, attempt, url, "POST");
            let sent = self
                .http
                .post(url)
                .header(AUTHORIZATION, self.credentials.bearer())
                .json(body)
                .send();
            decode(sent, url)
        })
    }
}

/// Non-2xx and transport failures come back as `RemoteService` (retryable);
/// an unparseable 2xx body is `MalformedResponse` (not retryable).
fn decode<T: DeserializeOwned>(sent: reqwest::Result<Response>, url: &str) -> Result<T> {
    let response =
        sent.map_err(|e| TagstepError::remote(RemoteCause::Transport(e.to_string()), url))?;
    let status = response.status();
    if !status.is_success() {
        return Err(TagstepError::remote(RemoteCause::Status(status.as_u16()), url));
    }
    let text = response
        .text()
        .map_err(|e| TagstepError::remote(RemoteCause::Transport(e.to_string()), url))?;
    serde_json::from_str(&text).map_err(|source| TagstepError::MalformedResponse {
        url: url.to_string(),
        source,
    })
}

impl ListClient for HttpListClient {
    fn fetch_lists(&self) -> Result<Vec<ListSummary>> {
        let url = format!("{}/lists?fields=lists.id,lists.name", self.base_url);
        let resp: ListsResponse = self.get_json("fetch_lists", &url)?;
        Ok(resp.lists)
    }

    fn fetch_members_with_tags(&self, list_id: &str) -> Result<Vec<Member>> {
        let url = format!(
            "{}/lists/{list_id}/members?fields=members.id,members.email_address,members.tags",
            self.base_url
        );
        let resp: MembersResponse = self.get_json("fetch_members_with_tags", &url)?;
        Ok(resp.members)
    }

    fn submit_batch(&self, operations: &[BatchOperation]) -> Result<BatchAck> {
        let url = format!("{}/batches", self.base_url);
        self.post_json("submit_batch", &url, &BatchRequest { operations })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
