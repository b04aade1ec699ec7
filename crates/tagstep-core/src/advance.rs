use crate::client::ListClient;
use crate::config::{Config, MAX_CHUNK_SIZE};
use crate::error::Result;
use crate::lease::ListLeases;
use crate::planner::plan;
use crate::stage::StageMap;
use crate::types::{AdvancementResult, Member};
use crate::updater::BatchTagUpdater;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

/// What an advancement run would do, computed without touching the remote list.
#[derive(Debug, Clone, Serialize)]
pub struct AdvancementPlan {
    pub list_id: String,
    pub list_name: String,
    pub total_members: usize,
    pub matched_members: usize,
    pub result: AdvancementResult,
}

// ---------------------------------------------------------------------------
// Advancer
// ---------------------------------------------------------------------------

/// Moves every CRM-matched member of a list one stage along the stage map.
pub struct Advancer<'a, C: ListClient + ?Sized> {
    client: &'a C,
    stages: StageMap,
    chunk_size: usize,
    date: Option<NaiveDate>,
    leases: ListLeases,
}

impl<'a, C: ListClient + ?Sized> Advancer<'a, C> {
    pub fn new(client: &'a C, stages: StageMap) -> Self {
        Self {
            client,
            stages,
            chunk_size: MAX_CHUNK_SIZE,
            date: None,
            leases: ListLeases::new(),
        }
    }

    pub fn from_config(client: &'a C, config: &Config) -> Result<Self> {
        let advancer = Self::new(client, config.stage_map()?);
        Ok(advancer.with_chunk_size(config.batch.effective_chunk_size()))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Share leases with other advancers so they never run on the same list at once.
    pub fn with_leases(mut self, leases: ListLeases) -> Self {
        self.leases = leases;
        self
    }

    pub fn stages(&self) -> &StageMap {
        &self.stages
    }

    /// Resolve, fetch, filter and plan. Sends no mutations.
    pub fn preview(
        &self,
        crm_emails: &HashSet<String>,
        list_name: &str,
    ) -> Result<AdvancementPlan> {
        let list_id = self.client.lookup_list_id(list_name)?;
        self.plan_for(list_id, crm_emails, list_name)
    }

    /// Advance every member whose email is in `crm_emails`.
    ///
    /// The list lease is taken as soon as the list id is known and held
    /// across the member fetch, the plan and every batch. All additions
    /// (with their dated companions) are applied before any removal. On
    /// failure, batches already sent stay applied; the error does not say
    /// which members were reached. Running again converges.
    pub fn advance(
        &self,
        crm_emails: &HashSet<String>,
        list_name: &str,
    ) -> Result<AdvancementResult> {
        let list_id = self.client.lookup_list_id(list_name)?;
        let _lease = self.leases.acquire(&list_id)?;
        let planned = self.plan_for(list_id, crm_emails, list_name)?;

        let mut updater = BatchTagUpdater::new(self.client).with_chunk_size(self.chunk_size);
        if let Some(date) = self.date {
            updater = updater.with_date(date);
        }
        for batch in planned.result.pending_batches() {
            updater.apply_batch(&planned.list_id, &batch)?;
        }

        info!(
            list = list_name,
            added_tags = planned.result.added.len(),
            removed_tags = planned.result.removed.len(),
            "advancement complete"
        );
        Ok(planned.result)
    }

    fn plan_for(
        &self,
        list_id: String,
        crm_emails: &HashSet<String>,
        list_name: &str,
    ) -> Result<AdvancementPlan> {
        let members = self.client.fetch_members_with_tags(&list_id)?;
        let total_members = members.len();
        let matched: Vec<Member> = members
            .into_iter()
            .filter(|m| crm_emails.contains(&m.email))
            .collect();
        info!(
            list = list_name,
            list_id = %list_id,
            total_members,
            matched_members = matched.len(),
            "fetched list members"
        );
        let result = plan(&matched, &self.stages);
        Ok(AdvancementPlan {
            list_id,
            list_name: list_name.to_string(),
            total_members,
            matched_members: matched.len(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagstepError;
    use crate::testing::{Call, FakeListClient};
    use crate::types::{BatchAck, BatchOperation, ListSummary, TagMembers, TagStatus};
    use std::cell::Cell;

    fn emails(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tm(pairs: &[(&str, &[&str])]) -> TagMembers {
        pairs
            .iter()
            .map(|(tag, ids)| {
                (
                    tag.to_string(),
                    ids.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 15).unwrap()
    }

    fn scenario_client() -> FakeListClient {
        FakeListClient::default()
            .with_list("L1", "airt")
            .with_members(vec![
                Member::new("m1", "a@x.com", &["stage1"]),
                Member::new("m2", "b@x.com", &["stage2"]),
                Member::new("m3", "c@x.com", &["stage2"]),
            ])
    }

    fn stages() -> StageMap {
        StageMap::chain(&["stage1", "stage2", "stage3"]).unwrap()
    }

    #[test]
    fn end_to_end_scenario() {
        let client = scenario_client();
        let result = Advancer::new(&client, stages())
            .with_date(date())
            .advance(&emails(&["a@x.com", "b@x.com"]), "airt")
            .unwrap();

        assert_eq!(result.added, tm(&[("stage2", &["m1"]), ("stage3", &["m2"])]));
        assert_eq!(result.removed, tm(&[("stage1", &["m1"]), ("stage2", &["m2"])]));

        let batches = client.batches();
        let active = batches.iter().filter(|b| b.status == TagStatus::Active).count();
        let inactive = batches.iter().filter(|b| b.status == TagStatus::Inactive).count();
        assert_eq!(active, 4);
        assert_eq!(inactive, 2);
        assert!(batches.iter().all(|b| !b.member_ids.contains(&"m3".to_string())));
    }

    #[test]
    fn call_sequence_is_lookup_fetch_adds_removes() {
        let client = scenario_client();
        Advancer::new(&client, stages())
            .with_date(date())
            .advance(&emails(&["a@x.com", "b@x.com"]), "airt")
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls[0], Call::FetchLists);
        assert_eq!(calls[1], Call::FetchMembers("L1".to_string()));
        assert_eq!(calls.len(), 8);

        let statuses: Vec<TagStatus> = client.batches().iter().map(|b| b.status).collect();
        let first_inactive = statuses
            .iter()
            .position(|s| *s == TagStatus::Inactive)
            .unwrap();
        assert!(statuses[..first_inactive].iter().all(|s| *s == TagStatus::Active));
        assert!(statuses[first_inactive..].iter().all(|s| *s == TagStatus::Inactive));

        let tags: Vec<String> = client.batches().into_iter().map(|b| b.tag).collect();
        assert_eq!(
            tags,
            vec![
                "stage2",
                "stage2 - 15.11.2024.",
                "stage3",
                "stage3 - 15.11.2024.",
                "stage1",
                "stage2",
            ]
        );
    }

    #[test]
    fn unknown_list_fails_before_fetching_members() {
        let client = scenario_client();
        let err = Advancer::new(&client, stages())
            .advance(&emails(&["a@x.com"]), "missing")
            .unwrap_err();
        assert!(matches!(err, TagstepError::ListNotFound(ref n) if n == "missing"));
        assert_eq!(client.calls(), vec![Call::FetchLists]);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let client = scenario_client();
        let result = Advancer::new(&client, stages())
            .advance(&emails(&["A@x.com"]), "airt")
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(client.calls().len(), 2);
    }

    #[test]
    fn preview_sends_no_batches() {
        let client = scenario_client();
        let planned = Advancer::new(&client, stages())
            .preview(&emails(&["a@x.com", "c@x.com"]), "airt")
            .unwrap();
        assert_eq!(planned.list_id, "L1");
        assert_eq!(planned.total_members, 3);
        assert_eq!(planned.matched_members, 2);
        assert_eq!(planned.result.added, tm(&[("stage2", &["m1"]), ("stage3", &["m3"])]));
        assert!(client.batches().is_empty());
    }

    #[test]
    fn busy_list_is_refused() {
        let client = scenario_client();
        let leases = ListLeases::new();
        let _held = leases.acquire("L1").unwrap();
        let err = Advancer::new(&client, stages())
            .with_leases(leases.clone())
            .advance(&emails(&["a@x.com"]), "airt")
            .unwrap_err();
        assert!(matches!(err, TagstepError::ListBusy(_)));
        assert_eq!(client.calls(), vec![Call::FetchLists]);
    }

    /// Records whether the list lease is held when members are fetched.
    struct LeaseObservingClient {
        inner: FakeListClient,
        leases: ListLeases,
        held_during_fetch: Cell<Option<bool>>,
    }

    impl ListClient for LeaseObservingClient {
        fn fetch_lists(&self) -> Result<Vec<ListSummary>> {
            self.inner.fetch_lists()
        }

        fn fetch_members_with_tags(&self, list_id: &str) -> Result<Vec<Member>> {
            self.held_during_fetch.set(Some(self.leases.is_held(list_id)));
            self.inner.fetch_members_with_tags(list_id)
        }

        fn submit_batch(&self, operations: &[BatchOperation]) -> Result<BatchAck> {
            self.inner.submit_batch(operations)
        }
    }

    #[test]
    fn lease_covers_member_fetch_and_plan() {
        let leases = ListLeases::new();
        let client = LeaseObservingClient {
            inner: scenario_client(),
            leases: leases.clone(),
            held_during_fetch: Cell::new(None),
        };
        Advancer::new(&client, stages())
            .with_leases(leases.clone())
            .with_date(date())
            .advance(&emails(&["a@x.com"]), "airt")
            .unwrap();

        assert_eq!(client.held_during_fetch.get(), Some(true));
        assert!(!leases.is_held("L1"));
    }

    #[test]
    fn preview_takes_no_lease() {
        let leases = ListLeases::new();
        let _held = leases.acquire("L1").unwrap();
        let client = scenario_client();
        let planned = Advancer::new(&client, stages())
            .with_leases(leases.clone())
            .preview(&emails(&["a@x.com"]), "airt")
            .unwrap();
        assert_eq!(planned.matched_members, 1);
    }

    #[test]
    fn lease_released_after_failed_run() {
        let client = scenario_client().fail_batch_at(2);
        let leases = ListLeases::new();
        let err = Advancer::new(&client, stages())
            .with_leases(leases.clone())
            .with_date(date())
            .advance(&emails(&["a@x.com", "b@x.com"]), "airt")
            .unwrap_err();
        assert!(err.is_transient());
        assert!(!leases.is_held("L1"));
        // additions for stage2 landed, nothing was deactivated
        assert_eq!(client.batches().len(), 2);
        assert!(client
            .batches()
            .iter()
            .all(|b| b.status == TagStatus::Active));
    }

    #[test]
    fn from_config_uses_configured_stages() {
        let client = FakeListClient::default()
            .with_list("L1", "airt")
            .with_members(vec![Member::new("m1", "a@x.com", &["M1"])]);
        let advancer = Advancer::from_config(&client, &Config::default()).unwrap();
        let result = advancer.advance(&emails(&["a@x.com"]), "airt").unwrap();
        assert_eq!(result.added, tm(&[("M2", &["m1"])]));
    }
}
