use crate::cmd::remote_client;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tagstep_cli::crm::CrmEmails;
use tagstep_core::report::AdvanceReport;
use tagstep_core::{Advancer, Config};

pub fn run(root: &Path, list: &str, csv: &Path, dry_run: bool, json: bool) -> anyhow::Result<()> {
    if list.is_empty() {
        anyhow::bail!("list name must not be empty");
    }
    let config = Config::load(root).context("failed to load config")?;
    let crm = CrmEmails::from_path(csv)
        .with_context(|| format!("failed to read CRM export {}", csv.display()))?;
    tracing::info!(rows = crm.rows(), emails = crm.len(), "read CRM export");

    let client = remote_client(&config)?;
    let advancer = Advancer::from_config(&client, &config)?;
    let emails = crm.to_set();

    let result = if dry_run {
        advancer.preview(&emails, list)?.result
    } else {
        advancer.advance(&emails, list)?
    };

    let report = AdvanceReport::new(list, &result, dry_run);
    if json {
        print_json(&report)?;
    } else {
        println!("{}", report.render().trim_end());
    }
    Ok(())
}
