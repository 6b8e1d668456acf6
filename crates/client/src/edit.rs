//! Inline title editing for sidebar items.

use proto::{MAX_TITLE_LENGTH, ValidationError};

/// Edit mode of one sidebar item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// Title shown as a (possibly truncated) label.
    #[default]
    View,
    /// Title shown in an editable field.
    Editing {
        /// Full title captured when editing started.
        original_title: String,
        /// Current field contents.
        draft: String,
        /// A rename request for this item is in flight.
        saving: bool,
    },
}

/// What a save attempt resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Draft equals the original title; the edit was closed without a request.
    Unchanged,
    /// A rename is already in flight for this item.
    InFlight,
    /// The validated, trimmed title to send.
    Rename(String),
}

impl EditState {
    /// Enters edit mode with the draft pre-filled from `title`.
    pub fn begin(title: &str) -> Self {
        Self::Editing {
            original_title: title.to_string(),
            draft: title.to_string(),
            saving: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Editing { saving: true, .. })
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            Self::Editing { draft, .. } => Some(draft),
            Self::View => None,
        }
    }

    /// Mutable draft, unavailable while a save is in flight.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Editing {
                draft,
                saving: false,
                ..
            } => Some(draft),
            _ => None,
        }
    }

    /// Leaves edit mode, discarding the draft.
    pub fn cancel(&mut self) {
        *self = Self::View;
    }

    /// Validates the draft and decides whether a rename is needed.
    ///
    /// On `Rename` the state stays `Editing` and is marked as saving; on
    /// `Unchanged` it returns to `View`. Validation errors leave it untouched.
    pub fn prepare_save(&mut self) -> Option<Result<SaveOutcome, ValidationError>> {
        let Self::Editing {
            original_title,
            draft,
            saving,
        } = self
        else {
            return None;
        };
        if *saving {
            return Some(Ok(SaveOutcome::InFlight));
        }
        let title = match validate_title(draft) {
            Ok(title) => title,
            Err(err) => return Some(Err(err)),
        };
        if title == *original_title {
            *self = Self::View;
            return Some(Ok(SaveOutcome::Unchanged));
        }
        *saving = true;
        Some(Ok(SaveOutcome::Rename(title)))
    }
}

/// Trims a title and checks it is non-empty and within [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
            len,
        });
    }
    Ok(title.to_string())
}
