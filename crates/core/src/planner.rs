use crate::extractor::creation_datetime;
use crate::provider::{MetadataProvider, MetadataRecord};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const HASH_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub files: usize,
    pub skipped_no_timestamp: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    pub entries: Vec<RenameEntry>,
    pub stats: PlanStats,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn plan_renames(
    media_paths: Vec<PathBuf>,
    provider: &mut dyn MetadataProvider,
) -> Result<RenamePlan> {
    println!(
        "{}件のファイルのメタデータを取得しています...",
        media_paths.len()
    );
    let records = provider.read_metadata(&media_paths)?;
    build_plan(media_paths.into_iter().zip(records))
}

pub fn build_plan<I>(pairs: I) -> Result<RenamePlan>
where
    I: IntoIterator<Item = (PathBuf, MetadataRecord)>,
{
    let mut plan = RenamePlan::default();
    let mut entry_index = HashMap::<PathBuf, usize>::new();

    for (media_path, record) in pairs {
        plan.stats.files += 1;

        let Some(datetime) = creation_datetime(&record)? else {
            plan.stats.skipped_no_timestamp += 1;
            continue;
        };

        let target = target_path(&media_path, datetime)?;
        if target == media_path {
            plan.stats.unchanged += 1;
            continue;
        }

        println!(
            "リネーム予定: {} -> {}",
            media_path.display(),
            target.display()
        );
        match entry_index.get(&media_path) {
            Some(&position) => plan.entries[position].target = target,
            None => {
                entry_index.insert(media_path.clone(), plan.entries.len());
                plan.entries.push(RenameEntry {
                    source: media_path,
                    target,
                });
            }
        }
    }

    Ok(plan)
}

fn target_path(media_path: &Path, datetime: NaiveDateTime) -> Result<PathBuf> {
    let bytes = fs::read(media_path)
        .with_context(|| format!("ファイルを読めませんでした: {}", media_path.display()))?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let extension = media_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .with_context(|| format!("拡張子がありません: {}", media_path.display()))?;

    let stem = format!(
        "{}_{}",
        datetime.format("%Y-%m-%dT%H-%M-%S"),
        &digest[..HASH_PREFIX_LEN]
    );
    Ok(media_path.with_file_name(format!("{stem}.{extension}")))
}
