//! Data models for detection and anonymization

pub mod finding;
pub mod result;
pub mod segment;

pub use finding::{Finding, FindingSource};
pub use result::{AnonymizedResult, FindingRecord};
pub use segment::{NormalizedSegment, Origin, PageMap, PAGE_SEPARATOR};
