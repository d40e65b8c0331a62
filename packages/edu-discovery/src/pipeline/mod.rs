//! Discovery pipeline - the core of the library.
//!
//! The pipeline runs:
//! - Domain resolution (core + grade band + subject + extras)
//! - Query construction (quoted terms, keyword hints, exclusions, site filter)
//! - Search execution (see [`crate::executor`])
//! - Filtering (block, trust, parent/child, dedup, rank, cap)
//! - Strict-then-relaxed orchestration

pub mod filter;
pub mod orchestrator;
pub mod query;
pub mod resolve;

pub use filter::ResultFilter;
pub use orchestrator::{DiscoveryOrchestrator, DiscoveryReport, PhaseOutcome, PhaseReport};
pub use query::{site_filter, QueryBuilder, QueryParts};
pub use resolve::DomainResolver;
