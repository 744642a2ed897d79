//! Entry points that tie a document, its front matter and the global
//! settings together, plus the debounced auto-numbering trigger.

use std::time::{Duration, Instant};

use crate::editing::{Editor, PassOptions, ViewState};
use crate::formulas::{remove_formula_numbering, renumber_formulas};
use crate::headings::{remove_heading_numbering, renumber_headings};
use crate::metadata::DocumentMetadata;
use crate::settings::{
    FormulaSettings, FrontMatterError, HeadingSettings, Overrides, read_overrides, save_overrides,
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// Settings in force for one document at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub metadata: DocumentMetadata,
    pub headings: HeadingSettings,
    pub formulas: FormulaSettings,
}

impl EffectiveSettings {
    fn headings_auto(&self) -> bool {
        self.headings.enabled && self.headings.auto
    }

    fn formulas_auto(&self) -> bool {
        self.formulas.enabled && self.formulas.auto
    }
}

/// Global numbering defaults and the state of the auto trigger.
///
/// Every operation takes the editor as an `Option`: no active document is a
/// no-op, not an error.
#[derive(Debug, Clone)]
pub struct NumberingController {
    headings: HeadingSettings,
    formulas: FormulaSettings,
    refresh_interval: Duration,
    deadline: Option<Instant>,
}

impl NumberingController {
    pub fn new(headings: HeadingSettings, formulas: FormulaSettings) -> Self {
        Self {
            headings,
            formulas,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            deadline: None,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Delay between losing focus and the auto pass firing.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn heading_settings(&self) -> &HeadingSettings {
        &self.headings
    }

    pub fn formula_settings(&self) -> &FormulaSettings {
        &self.formulas
    }

    /// Scan the document and merge its front-matter overrides over the
    /// global defaults. Unreadable front matter falls back to the defaults.
    pub fn resolve<E: Editor + ?Sized>(&self, editor: &E) -> EffectiveSettings {
        let metadata = DocumentMetadata::from_editor(editor);
        let overrides = read_overrides(metadata.front_matter.as_ref()).unwrap_or_else(|e| {
            log::warn!("Using default numbering settings: {e}");
            Overrides::default()
        });

        EffectiveSettings {
            headings: overrides.apply_headings(&self.headings),
            formulas: overrides.apply_formulas(&self.formulas),
            metadata,
        }
    }

    pub fn renumber_headings<E: Editor + ?Sized>(
        &self,
        editor: Option<&mut E>,
        options: PassOptions,
    ) -> bool {
        let Some(editor) = editor else {
            return false;
        };
        let effective = self.resolve(&*editor);
        renumber_headings(editor, &effective.metadata, &effective.headings, options)
    }

    pub fn remove_heading_numbering<E: Editor + ?Sized>(&self, editor: Option<&mut E>) -> bool {
        let Some(editor) = editor else {
            return false;
        };
        let metadata = DocumentMetadata::from_editor(&*editor);
        remove_heading_numbering(editor, &metadata)
    }

    pub fn renumber_formulas<E: Editor + ?Sized>(
        &self,
        editor: Option<&mut E>,
        options: PassOptions,
    ) -> bool {
        let Some(editor) = editor else {
            return false;
        };
        let effective = self.resolve(&*editor);
        renumber_formulas(editor, &effective.metadata, &effective.formulas, options)
    }

    pub fn remove_formula_numbering<E: Editor + ?Sized>(&self, editor: Option<&mut E>) -> bool {
        let Some(editor) = editor else {
            return false;
        };
        let metadata = DocumentMetadata::from_editor(&*editor);
        remove_formula_numbering(editor, &metadata)
    }

    /// Write the global settings into the document's front matter.
    pub fn save_settings<E: Editor + ?Sized>(
        &self,
        editor: Option<&mut E>,
        headings: bool,
        formulas: bool,
    ) -> Result<bool, FrontMatterError> {
        let Some(editor) = editor else {
            return Ok(false);
        };
        save_overrides(
            editor,
            headings.then_some(&self.headings),
            formulas.then_some(&self.formulas),
        )
    }

    /// The editor lost focus. Arms the trigger when either feature is set to
    /// renumber automatically for this document; returns whether it did.
    pub fn on_blur<E: Editor + ?Sized>(&mut self, now: Instant, editor: Option<&E>) -> bool {
        let Some(editor) = editor else {
            return false;
        };
        let effective = self.resolve(editor);
        if !effective.headings_auto() && !effective.formulas_auto() {
            return false;
        }

        self.deadline = Some(now + self.refresh_interval);
        log::debug!("auto numbering armed for {:?}", self.refresh_interval);
        true
    }

    /// The editor regained focus before the trigger fired.
    pub fn on_focus(&mut self) {
        if self.deadline.take().is_some() {
            log::debug!("auto numbering cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire the trigger if its deadline has passed: headings first, then
    /// formulas against the renumbered headings, and one view restore at the
    /// end. Returns whether the document changed.
    pub fn poll<E: Editor + ?Sized>(&mut self, now: Instant, editor: Option<&mut E>) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => self.deadline = None,
            _ => return false,
        }
        let Some(editor) = editor else {
            return false;
        };

        let view = ViewState::capture(&*editor);
        let options = PassOptions {
            force: false,
            restore_view: false,
        };
        let mut changed = false;

        let effective = self.resolve(&*editor);
        if effective.headings_auto() {
            changed |= renumber_headings(editor, &effective.metadata, &effective.headings, options);
        }
        if effective.formulas_auto() {
            let metadata = if changed {
                DocumentMetadata::from_editor(&*editor)
            } else {
                effective.metadata
            };
            changed |= renumber_formulas(editor, &metadata, &effective.formulas, options);
        }

        if changed {
            view.restore(editor);
        }
        log::debug!("auto numbering fired, changed: {changed}");
        changed
    }
}

impl Default for NumberingController {
    fn default() -> Self {
        Self::new(HeadingSettings::default(), FormulaSettings::default())
    }
}
