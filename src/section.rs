//! Page sections and their reveal state
//!
//! A section is one content region of the landing page. It is addressable by
//! id for in-page navigation and trackable for the one-way reveal transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base class carried by every observed section
pub const SECTION_CLASS: &str = "lp-section";

/// Class added once a section has been revealed
pub const REVEALED_CLASS: &str = "lp-section-visible";

/// Stable identifier of a page section (`hero`, `sample`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A mounted section and its reveal flag
///
/// `revealed` only ever moves from `false` to `true`; there is no way to
/// clear it short of dropping the section (a fresh mount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    id: SectionId,
    revealed: bool,
}

impl Section {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            revealed: false,
        }
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Mark the section revealed. Returns `true` only on the false→true edge.
    pub fn reveal(&mut self) -> bool {
        if self.revealed {
            return false;
        }
        self.revealed = true;
        true
    }
}
