//! Pipeline stages of a monitor run.
//!
//! - `batch`: bounded-concurrency fetching
//! - `diff`: score deltas against stored history
//! - `changes`: database change detection
//! - `assemble`: report and notification rows
//! - `render`: markdown output
//! - `splice`: marker-delimited embedding into an existing document
//! - `monitor`: the end-to-end run

pub mod assemble;
pub mod batch;
pub mod changes;
pub mod diff;
pub mod monitor;
pub mod render;
pub mod splice;

pub use assemble::{ContentAssembler, ReportRow};
pub use batch::{BatchOutcome, BatchScheduler, partition};
pub use changes::has_changed;
pub use diff::{DiffCalculator, DiffRecord, round_score};
pub use monitor::{
    Aggregation, Content, RunSummary, Services, aggregate, build_content, expand_scope,
    run_monitor,
};
pub use render::MarkdownRenderer;
pub use splice::splice_segment;
