//! One applicant's fill session: answers, page navigation, autosave and
//! the final document

use crate::autosave::{Autosaver, SaveStatus};
use crate::config::FillConfig;
use crate::error::DqfError;
use crate::generate::{produce_document, DocumentOutcome, GenerationGate};
use crate::overlay::{render_page, OverlayView};
use crate::registry::FieldRegistry;
use crate::store::{AnswerStore, DraftStore, OwnerKey};
use crate::template::TemplateSource;
use crate::validation::validate_required;
use dqf_types::{AnswerValue, PageDimensions};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct FillSession<D: DraftStore> {
    registry: Arc<FieldRegistry>,
    store: AnswerStore,
    owner: OwnerKey,
    drafts: D,
    autosaver: Autosaver,
    scale: f64,
    generation_timeout_ms: u64,
}

impl<D: DraftStore> FillSession<D> {
    /// Open a session, picking up the owner's saved draft if there is one
    pub fn resume(
        registry: Arc<FieldRegistry>,
        drafts: D,
        owner: OwnerKey,
        config: &FillConfig,
    ) -> Self {
        let store = AnswerStore::load_persisted(&drafts, &owner);
        Self {
            registry,
            store,
            owner,
            drafts,
            autosaver: Autosaver::new(config.autosave_delay()),
            scale: config.default_scale,
            generation_timeout_ms: config.generation_timeout_ms,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.store
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    pub fn drafts(&self) -> &D {
        &self.drafts
    }

    pub fn status(&self) -> &SaveStatus {
        self.autosaver.status()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn current_page(&self) -> u32 {
        self.store.current_page()
    }

    /// Record a value for a registered field and re-arm the autosave
    pub fn edit(
        &mut self,
        id: &str,
        value: impl Into<AnswerValue>,
        now: Instant,
    ) -> Result<(), DqfError> {
        if !self.registry.contains(id) {
            return Err(DqfError::UnknownField(id.to_string()));
        }
        self.store.set(id, value);
        self.autosaver.note_edit(now);
        Ok(())
    }

    /// Write the draft if the debounce delay has passed. Failures are
    /// reported through the status only.
    pub fn tick(&mut self, now: Instant) -> SaveStatus {
        if self.autosaver.is_due(now) {
            if let Err(e) = self.save(now) {
                warn!(owner = %self.owner, error = %e, "Autosave failed");
            }
        }
        self.autosaver.status().clone()
    }

    /// Write the draft now, pending edits or not
    pub fn flush(&mut self, now: Instant) -> Result<(), DqfError> {
        self.save(now)
    }

    fn save(&mut self, now: Instant) -> Result<(), DqfError> {
        match self.store.persist(&self.drafts, &self.owner) {
            Ok(()) => {
                debug!(answers = self.store.answers().len(), "Draft saved");
                self.autosaver.mark_saved(now);
                Ok(())
            }
            Err(e) => {
                self.autosaver.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Overlay for the current page of a `page_count`-page template at the
    /// current scale
    pub fn overlay(&self, page_count: u32, dims: PageDimensions) -> OverlayView {
        render_page(
            &self.registry,
            self.store.current_page(),
            page_count,
            dims,
            self.scale,
            self.store.answers(),
        )
    }

    pub fn go_to_page(&mut self, page: u32, now: Instant) {
        self.store.set_current_page(page);
        self.autosaver.note_edit(now);
    }

    /// Leave an internal page for the next page the applicant fills in.
    /// Returns the new page, or `None` when there is nowhere to go.
    pub fn skip_internal_page(&mut self, page_count: u32, now: Instant) -> Option<u32> {
        let current = self.store.current_page();
        if !self.registry.is_internal_page(current) {
            return None;
        }
        let next = self.registry.next_user_page(current, page_count)?;
        self.go_to_page(next, now);
        Some(next)
    }

    /// Change the viewport zoom. Non-positive or non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Validate, snapshot the answers, and produce the document under `gate`
    pub fn finalize<T: TemplateSource + ?Sized>(
        &self,
        template: &T,
        gate: &GenerationGate,
    ) -> Result<DocumentOutcome, DqfError> {
        validate_required(&self.registry, self.store.answers())?;
        let answers = self.store.snapshot();
        let _ticket = gate.begin()?;

        info!(owner = %self.owner, template = %template.describe(), "Generating document");
        produce_document(template.fetch(), &self.registry, &answers)
    }

    /// [`finalize`](Self::finalize) with the work moved onto the blocking pool.
    /// The gate stays closed until the fill ends, even if it times out.
    #[cfg(feature = "server")]
    pub async fn finalize_async<T: TemplateSource + ?Sized>(
        &self,
        template: &T,
        gate: &GenerationGate,
    ) -> Result<DocumentOutcome, DqfError> {
        validate_required(&self.registry, self.store.answers())?;
        let answers = self.store.snapshot();
        let ticket = gate.begin()?;

        info!(owner = %self.owner, template = %template.describe(), "Generating document");
        crate::generate::produce_document_async(
            template.fetch(),
            Arc::clone(&self.registry),
            answers,
            self.generation_timeout_ms,
            ticket,
        )
        .await
    }
}
