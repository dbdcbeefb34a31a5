pub mod bbox_text;
pub mod board;
pub mod card;
pub mod date_range;
pub mod geometry;
pub mod overlay_surface;
pub mod pass_tracker;
pub mod probe;
pub mod report;
pub mod settle;
