//! dirsort - organize files by extension into category subdirectories
//!
//! This library classifies files in a source directory by extension, moves
//! them into category subdirectories of a destination tree, and records
//! every completed move in a durable, append-only CSV audit log.

pub mod audit_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod mover;
pub mod organizer;
pub mod output;

pub use audit_log::{AuditLog, LogError, MoveRecord};
pub use classifier::CategoryRules;
pub use config::{CompiledFilters, ConfigError, OrganizeConfig};
pub use mover::MoveError;
pub use organizer::{
    BatchEvent, FileAction, FileReport, Organizer, OrganizeError, PlannedMove, PlannedOutcome,
    RunSummary, SkipReason,
};

pub use cli::{Cli, run};
