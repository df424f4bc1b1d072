use serde::{Deserialize, Serialize};

/// Broad lightness classification of a theme.
///
/// Anything other than `"light"` in a catalog entry is read as [`Tone::Dark`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
	Light,
	#[default]
	#[serde(other)]
	Dark,
}

impl Tone {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dark => "dark",
			Self::Light => "light",
		}
	}
}

/// The eight palette slots every theme provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
	pub background: String,
	pub surface: String,
	pub surface_alt: String,
	pub border: String,
	pub text_primary: String,
	pub text_muted: String,
	pub accent: String,
	pub accent_soft: String,
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDefinition {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub tone: Tone,
	pub colors: ThemeColors,
}

impl ThemeDefinition {
	/// Case-insensitive match against the id, name and description.
	#[must_use]
	pub fn matches(&self, query: &str) -> bool {
		let query = query.trim().to_lowercase();
		if query.is_empty() {
			return true;
		}

		self.name.to_lowercase().contains(&query)
			|| self.id.to_lowercase().contains(&query)
			|| self.description.to_lowercase().contains(&query)
	}
}
