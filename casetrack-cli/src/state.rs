use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$CASETRACK_HOME`, else `~/.casetrack`.
pub fn casetrack_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CASETRACK_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".casetrack"))
}

pub fn ensure_casetrack_home() -> Result<PathBuf> {
    let dir = casetrack_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn outbox_dir() -> Result<PathBuf> {
    let dir = ensure_casetrack_home()?.join("outbox");
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Delivered notifications, one JSON object per line.
pub fn outbox_path() -> Result<PathBuf> {
    Ok(outbox_dir()?.join("notifications.jsonl"))
}

/// Dedupe keys of everything already sent.
pub fn sent_keys_path() -> Result<PathBuf> {
    Ok(outbox_dir()?.join("sent_keys.txt"))
}
