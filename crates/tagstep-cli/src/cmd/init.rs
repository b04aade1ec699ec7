use anyhow::Context;
use std::path::Path;
use tagstep_core::{io, paths, Config};

pub fn run(root: &Path) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    let yaml = serde_yaml::to_string(&Config::default()).context("failed to render config")?;
    let written = io::write_if_missing(&path, yaml.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    if written {
        println!("created: {}", path.display());
    } else {
        println!("exists:  {}", path.display());
    }
    Ok(())
}
