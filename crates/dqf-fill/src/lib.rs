//! Coordinate-based field overlay and fill engine for the driver
//! qualification file (DQF) packet
//!
//! - `registry`: field placements for the 25-page packet
//! - `coords`: reconciles percent/top-left and point/bottom-left placements
//! - `overlay`: positioned input widgets for the page being displayed
//! - `store` / `autosave`: answer map with debounced persistence and resume
//! - `fill`: bakes answers into the template PDF
//! - `fallback`: degraded summary PDF when the template is unavailable
//!
//! # Feature Flags
//!
//! - `server` (default): Enables `produce_document_async` with timeout (requires tokio)

pub mod autosave;
pub mod config;
pub mod coords;
pub mod error;
pub mod fallback;
pub mod fill;
pub mod generate;
pub mod metrics;
pub mod overlay;
pub mod pdf;
pub mod registry;
pub mod session;
pub mod store;
pub mod template;
pub mod validation;

pub use dqf_types::{
    AnswerMap, AnswerValue, CoordinateSpace, FieldDefinition, FieldKind, PageDimensions,
};

pub use autosave::{Autosaver, SaveStatus};
pub use config::FillConfig;
pub use error::{DqfError, ValidationError};
pub use fallback::generate_summary;
pub use fill::{fill, FillOutput, FillReport};
pub use generate::{produce_document, DocumentOutcome, GenerationGate, GenerationTicket};
pub use overlay::{render_page, OverlayView, Widget, WidgetValue};
pub use registry::{dqf_packet, FieldRegistry, PACKET_PAGE_COUNT};
pub use session::FillSession;
pub use store::{AnswerStore, Draft, DraftStore, FileDraftStore, MemoryDraftStore, OwnerKey};
pub use template::{BytesTemplate, FileTemplate, TemplateSource};
pub use validation::validate_required;

#[cfg(feature = "server")]
pub use generate::produce_document_async;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, DqfError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| DqfError::TemplateLoad(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse PDF bytes and return each page's size, in page order
pub fn get_page_dimensions(bytes: &[u8]) -> Result<Vec<PageDimensions>, DqfError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| DqfError::TemplateLoad(e.to_string()))?;
    Ok(doc
        .get_pages()
        .values()
        .map(|&page_id| pdf::page_dimensions(&doc, page_id))
        .collect())
}
