//! Theme definitions and the catalog they are served from.

mod catalog;
mod types;

pub use catalog::{
	Catalog, CatalogError, CatalogLoader, CatalogSource, EmbeddedCatalog, FileCatalog,
};
pub use types::{ThemeColors, ThemeDefinition, Tone};
