//! Shared data model for the driver qualification file (DQF) packet
//!
//! Field placements, answer values and page geometry used by both the
//! interactive overlay and the fill engine.

pub mod answer;
pub mod field;
pub mod page;

pub use answer::{AnswerMap, AnswerValue};
pub use field::{CoordinateSpace, FieldDefinition, FieldKind};
pub use page::PageDimensions;
