mod collector;
mod config;
mod executor;
mod extractor;
mod planner;
mod provider;

pub use collector::{collect_media_paths, MEDIA_EXTENSIONS};
pub use config::{load_config, AppConfig};
pub use executor::{execute_plan, ExecuteResult};
pub use extractor::{creation_datetime, InvalidTimestampError};
pub use planner::{build_plan, plan_renames, PlanStats, RenameEntry, RenamePlan};
pub use provider::{ExifTool, MetadataProvider, MetadataRecord};
