//! Candidate ↔ job/project matching: cosine scoring over embeddings with a
//! keyword fallback, ranking, and the HTTP endpoints that expose them.

pub mod fallback;
pub mod handlers;
pub mod orchestrator;
pub mod similarity;
pub mod skills;
