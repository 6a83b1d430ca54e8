//! PDF case reports

pub mod pdf;

pub use pdf::{RenderedReport, ReportRenderer};
