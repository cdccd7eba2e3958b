use crate::planner::RenamePlan;
use anyhow::{Context, Result};
use std::fs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    pub renamed: usize,
    pub removed_duplicates: usize,
}

pub fn execute_plan(plan: &RenamePlan) -> Result<ExecuteResult> {
    eprintln!("{}件のファイルをリネームしています...", plan.len());

    let mut result = ExecuteResult::default();
    for entry in &plan.entries {
        if entry.target.is_file() {
            fs::remove_file(&entry.source).with_context(|| {
                format!(
                    "重複ファイルを削除できませんでした: {}",
                    entry.source.display()
                )
            })?;
            result.removed_duplicates += 1;
        } else {
            fs::rename(&entry.source, &entry.target).with_context(|| {
                format!(
                    "リネームに失敗しました: {} -> {}",
                    entry.source.display(),
                    entry.target.display()
                )
            })?;
            result.renamed += 1;
        }
    }
    Ok(result)
}
