//! Style derivation and installation.

mod applicator;
mod derive;
mod document;

pub use applicator::{AppliedState, ApplyOutcome, BLEND_TOLERANCE, StyleApplicator};
pub use derive::{OverlayProfile, derive_style};
pub use document::{FileDocument, MemoryDocument, STYLE_ELEMENT_ID, StyleHost, THEME_DATASET_KEY};
