//! subnote-core: Shared types, configuration, and error handling for the submission notifier.
//!
//! This crate provides the foundational types used across all components:
//! - Eligibility rows projected from the knowledge graph
//! - Email drafts and the persisted notification resource
//! - Per-unit graph naming
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod naming;
pub mod types;

pub use config::Settings;
pub use error::SubnoteError;
pub use naming::OrgGraphTemplate;
pub use types::{EligibilityRow, EmailDraft, EmailNotification, SubmissionRef};
