use crate::cmd::remote_client;
use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tagstep_core::{Config, ListClient};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let client = remote_client(&config)?;
    let lists = client.fetch_lists()?;

    if json {
        print_json(&lists)?;
    } else if lists.is_empty() {
        println!("No lists in this account.");
    } else {
        let rows: Vec<Vec<String>> = lists.into_iter().map(|l| vec![l.id, l.name]).collect();
        print_table(&["ID", "NAME"], &rows);
    }
    Ok(())
}
