//! Test fixture creation for the record store and widget assets
//!
//! Fixtures seed a known board of three tasks and write a markup artifact
//! for every widget the registry knows about.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use taskdeck_mcp_server::mcp::widgets::WIDGET_SPECS;
use taskdeck_mcp_server::record_store::{RecordStore, KIND_TASK};

use super::constants::*;

/// Seeds the standard test board: two tasks for ada, one unassigned.
pub async fn seed_test_tasks(store: &dyn RecordStore) -> Result<()> {
    create_task(
        store,
        TASK_1_ID,
        &[
            ("title", TASK_1_TITLE),
            ("status", "in-progress"),
            ("assignee", ASSIGNEE_ADA),
            ("estimated_hours", "3"),
            ("tags", r#"["auth","bug"]"#),
            ("created_at", "2026-08-01T09:00:00+00:00"),
        ],
    )
    .await?;
    create_task(
        store,
        TASK_2_ID,
        &[
            ("title", TASK_2_TITLE),
            ("status", "todo"),
            ("assignee", ASSIGNEE_ADA),
            ("estimated_hours", "1.5"),
            ("created_at", "2026-08-02T09:00:00+00:00"),
        ],
    )
    .await?;
    create_task(
        store,
        TASK_3_ID,
        &[
            ("title", TASK_3_TITLE),
            ("status", "todo"),
            ("created_at", "2026-08-03T09:00:00+00:00"),
        ],
    )
    .await?;
    Ok(())
}

async fn create_task(store: &dyn RecordStore, id: &str, pairs: &[(&str, &str)]) -> Result<()> {
    let attrs: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    store.create(KIND_TASK, id, &attrs).await
}

/// Writes one markup artifact per known widget into `assets_dir`.
pub fn create_widget_assets(assets_dir: &Path) -> Result<()> {
    fs::create_dir_all(assets_dir)?;
    for spec in WIDGET_SPECS {
        fs::write(assets_dir.join(format!("{}.html", spec.id)), WIDGET_MARKUP)?;
    }
    Ok(())
}
