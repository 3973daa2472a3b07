//! Defect dataset builder: deterministic, heuristic labeling.
//!
//! Orders a project's releases into a timeline, estimates missing injected
//! versions with the incremental proportion heuristic, and emits one labeled
//! feature row per file per analyzed release.
//!
//! No network, no DB; pure computation + in-memory state.

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod labels;
pub mod logging;
pub mod normalize;
pub mod proportion;
pub mod report;
pub mod timeline;
pub mod types;

pub use config::Config;
pub use engine::{Dataset, Engine};
pub use error::DatasetError;
pub use timeline::Timeline;
pub use types::{DatasetRow, DefectReport, ProjectFeed, Release, ReportStatus, ReportTally};
