//! Pipeline orchestration and the agent boundary for Boardroom.
//!
//! This crate takes a transcript and a context bundle through the fixed
//! stage sequence (librarian, chief of staff, PRD writer, CFO critic,
//! COO planner) and persists every stage's output as an artifact.

pub mod agent;
pub mod artifacts;
pub mod instructions;
pub mod notes;
pub mod pipeline;
pub mod retry;
