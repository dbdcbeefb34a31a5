// THEORY:
// `bbox_overlay` draws detection boxes over image thumbnails whose on-screen
// size differs from their natural size, and keeps the state of the report
// dashboard those thumbnails live in.
//
// Public surface:
// - `pipeline::OverlayPipeline`: one overlay pass over a `CardBoard`.
// - `core_modules::geometry::project_box`: the pure coordinate mapping.
// - `core_modules::settle`: the awaitable "all images settled" signal.
// - `dashboard::DashboardController`: chart handles and date filters.

pub mod core_modules;
pub mod dashboard;
pub mod error;
pub mod parallel_probe;
pub mod pipeline;

pub use core_modules::board::CardBoard;
pub use core_modules::card::{BBOX_HEADING, CardElement, CardField, ImageElement};
pub use core_modules::geometry::{BoundingBox, Dimensions, DisplayRect, project_box};
pub use core_modules::probe::{FileProbe, ImageProbe};
pub use pipeline::{CardOutcome, OverlayPipeline, PassReport, PipelineConfig};
