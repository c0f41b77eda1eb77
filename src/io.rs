use crate::scheduler::{ScheduleOptions, ScheduleResult};
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Charge les options d'un appel depuis un fichier JSON.
pub fn load_options<P: AsRef<Path>>(path: P) -> anyhow::Result<ScheduleOptions> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let opts: ScheduleOptions = serde_json::from_slice(&data)
        .with_context(|| format!("parsing schedule options {}", path.display()))?;
    Ok(opts)
}

/// Résultat en JSON (jolie mise en forme).
pub fn result_to_json(result: &ScheduleResult) -> anyhow::Result<String> {
    serde_json::to_string_pretty(result).context("serializing schedule result")
}

pub fn write_result<P: AsRef<Path>>(path: P, result: &ScheduleResult) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = result_to_json(result)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
