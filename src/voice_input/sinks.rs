use tracing::debug;

use crate::contact::ContactDraft;
use crate::session::{HandoffMode, SessionOutcome};

/// Where a recognized recording ends up
///
/// The only thing that differs between voice-enabled fields.
pub trait DraftSink: Send {
    /// Short name used for logs and the capture arbiter
    fn label(&self) -> &'static str;

    fn handoff(&self) -> HandoffMode;

    /// Merge a recognized outcome into the draft; returns whether anything changed
    fn apply(&mut self, outcome: &SessionOutcome) -> bool;
}

/// Free-form text field (e.g. a quick note)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDictation {
    text: String,
}

impl NoteDictation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, as when the user types
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl DraftSink for NoteDictation {
    fn label(&self) -> &'static str {
        "note"
    }

    fn handoff(&self) -> HandoffMode {
        HandoffMode::Transcript
    }

    fn apply(&mut self, outcome: &SessionOutcome) -> bool {
        match outcome {
            SessionOutcome::Transcript(text) => append(&mut self.text, text, " "),
            _ => false,
        }
    }
}

/// Notes of an existing contact; dictation lands on its own line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactNotes {
    notes: String,
}

impl ContactNotes {
    pub fn new(notes: impl Into<String>) -> Self {
        Self { notes: notes.into() }
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }
}

impl DraftSink for ContactNotes {
    fn label(&self) -> &'static str {
        "contact-note"
    }

    fn handoff(&self) -> HandoffMode {
        HandoffMode::Transcript
    }

    fn apply(&mut self, outcome: &SessionOutcome) -> bool {
        match outcome {
            SessionOutcome::Transcript(text) => append(&mut self.notes, text, "\n"),
            _ => false,
        }
    }
}

/// New-contact form prefilled from a spoken description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContactDraft {
    draft: ContactDraft,
}

impl NewContactDraft {
    pub fn new(draft: ContactDraft) -> Self {
        Self { draft }
    }

    pub fn draft(&self) -> &ContactDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ContactDraft {
        &mut self.draft
    }
}

impl DraftSink for NewContactDraft {
    fn label(&self) -> &'static str {
        "new-contact"
    }

    fn handoff(&self) -> HandoffMode {
        HandoffMode::ContactDraft
    }

    fn apply(&mut self, outcome: &SessionOutcome) -> bool {
        let SessionOutcome::Contact(extraction) = outcome else {
            return false;
        };

        let before = self.draft.clone();
        self.draft.apply(extraction);
        debug!("Prefilled new contact {:?}", self.draft.name);
        before != self.draft
    }
}

fn append(field: &mut String, text: &str, separator: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    if !field.is_empty() {
        field.push_str(separator);
    }
    field.push_str(text);
    true
}
