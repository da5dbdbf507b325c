//! Batch processing over a directory of images.
//!
//! - **dispatcher**: bounded worker pool with cooperative cancellation
//! - **captioning**: caption every image and write caption files
//! - **quarantine**: move failed images aside for manual review
//! - **watermark**: watermark detection with copy/move of flagged images

pub mod captioning;
pub mod dispatcher;
pub mod quarantine;
pub mod watermark;

pub use captioning::{CaptionBatch, CaptionOutcome};
pub use dispatcher::{BatchReport, Dispatcher, JobResult};
pub use quarantine::Quarantine;
pub use watermark::{WatermarkAction, WatermarkBatch, WatermarkOutcome};
