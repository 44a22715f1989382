//! subnote-dispatch: queue notification emails for new submissions.
//!
//! Runs the eligibility query, groups the rows per recipient, composes one
//! email per recipient and hands each to the notification writer.

pub mod compose;
pub mod error;
pub mod plan;
pub mod runner;
