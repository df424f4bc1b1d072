//! Recolor web pages with curated themes.
//!
//! The crate is organised around the page pipeline: a [`theme`] catalog, the
//! user [`settings`] and their scope resolution, [`style`] derivation and
//! installation, and the debounced [`schedule`] that ties page events to
//! applies. The [`control`] surface edits settings on the user's behalf.
//!
//! The browser pieces (the synchronised store, the document, the message
//! channel) are traits with in-process implementations, so the pipeline can be
//! embedded or driven from the command line.

pub mod agent;
pub mod app_dirs;
pub mod control;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod page;
pub mod schedule;
pub mod settings;
pub mod style;
pub mod theme;

pub use agent::{AgentOptions, PageAgent};
pub use control::{ControlSurface, host_from_url};
pub use messaging::{MessageTarget, RuntimeMessage};
pub use page::{PageEvents, Visibility};
pub use schedule::{ApplyScheduler, Trigger};
pub use settings::{ApplyScope, ResolvedTheme, Settings, SettingsStore, resolve};
pub use style::{ApplyOutcome, StyleApplicator, derive_style};
pub use theme::{Catalog, CatalogLoader, ThemeDefinition, Tone};
