use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tagstep_core::Config;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let stages = config.stage_map()?;

    if json {
        print_json(&stages.entries())?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = stages
        .entries()
        .iter()
        .map(|e| {
            vec![
                e.tag.clone(),
                e.next.clone().unwrap_or_else(|| "(terminal)".to_string()),
            ]
        })
        .collect();
    print_table(&["TAG", "NEXT"], &rows);
    Ok(())
}
