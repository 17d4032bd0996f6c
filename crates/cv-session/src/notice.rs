//! Visitor-facing notices
//!
//! Queued by the session, drained by the host's toast UI.

use std::fmt;

/// Something the visitor should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A focus or highlight link referenced sections that no longer exist
    MissingSections { missing: usize, total: usize },
    /// Nothing in a focus or highlight link could be found
    FocusAborted,
    /// New placeholders showed up after the page changed
    PlaceholdersDetected(Vec<String>),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingSections { .. } | Notice::FocusAborted => {
                write!(f, "Some shared/highlighted sections could not be found")
            }
            Notice::PlaceholdersDetected(names) => {
                write!(f, "New placeholders available: {}", names.join(", "))
            }
        }
    }
}
