use anyhow::Result;
use mutheme::{ResolvedTheme, ThemeDefinition};
use serde::Serialize;
use serde_json::json;

/// One row of the `themes` listing.
pub(crate) struct ThemeRow<'a> {
	pub(crate) theme: &'a ThemeDefinition,
	pub(crate) favorite: bool,
	pub(crate) current: bool,
}

/// Print the theme listing, one theme per line.
pub(crate) fn print_themes_plain(rows: &[ThemeRow<'_>]) {
	if rows.is_empty() {
		println!("No themes match");
		return;
	}

	let width = rows
		.iter()
		.map(|row| row.theme.id.len())
		.max()
		.unwrap_or_default();
	for row in rows {
		let marker = match (row.current, row.favorite) {
			(true, _) => '>',
			(false, true) => '*',
			(false, false) => ' ',
		};
		println!(
			"{marker} {:<width$}  {:<5}  {}",
			row.theme.id,
			row.theme.tone.as_str(),
			row.theme.name,
		);
	}
}

/// Format the theme listing as a JSON array.
pub(crate) fn format_themes_json(rows: &[ThemeRow<'_>]) -> Result<String> {
	let payload: Vec<_> = rows
		.iter()
		.map(|row| {
			json!({
				"id": row.theme.id,
				"name": row.theme.name,
				"description": row.theme.description,
				"tone": row.theme.tone,
				"favorite": row.favorite,
				"current": row.current,
			})
		})
		.collect();
	Ok(serde_json::to_string_pretty(&payload)?)
}

pub(crate) fn print_themes_json(rows: &[ThemeRow<'_>]) -> Result<()> {
	println!("{}", format_themes_json(rows)?);
	Ok(())
}

/// Print the resolved theme for a host.
pub(crate) fn print_resolved_plain(host: Option<&str>, resolved: &ResolvedTheme) {
	let host = host.unwrap_or("(no host)");
	println!(
		"{host}: {} at {}%",
		resolved.theme_id,
		(resolved.blend * 100.0).round()
	);
}

#[derive(Serialize)]
struct ResolvedOutput<'a> {
	host: Option<&'a str>,
	#[serde(flatten)]
	resolved: &'a ResolvedTheme,
}

/// Format the resolved theme as JSON, including the host it was resolved for.
pub(crate) fn format_resolved_json(host: Option<&str>, resolved: &ResolvedTheme) -> Result<String> {
	Ok(serde_json::to_string_pretty(&ResolvedOutput { host, resolved })?)
}

pub(crate) fn print_resolved_json(host: Option<&str>, resolved: &ResolvedTheme) -> Result<()> {
	println!("{}", format_resolved_json(host, resolved)?);
	Ok(())
}

#[cfg(test)]
mod tests {
	use mutheme::CatalogLoader;
	use serde_json::Value;

	use super::*;

	#[test]
	fn theme_json_carries_flags() {
		let catalog = CatalogLoader::builtin().load();
		let nord = catalog.get("nord").expect("nord");
		let rows = [ThemeRow {
			theme: nord,
			favorite: true,
			current: false,
		}];

		let json = format_themes_json(&rows).expect("json");
		let value: Value = serde_json::from_str(&json).expect("parse");
		assert_eq!(value[0]["id"], "nord");
		assert_eq!(value[0]["tone"], "dark");
		assert_eq!(value[0]["favorite"], true);
		assert_eq!(value[0]["current"], false);
	}

	#[test]
	fn resolved_json_uses_camel_case() {
		let resolved = ResolvedTheme {
			theme_id: "paper".into(),
			blend: 0.4,
		};

		let json = format_resolved_json(None, &resolved).expect("json");
		let value: Value = serde_json::from_str(&json).expect("parse");
		assert_eq!(value["themeId"], "paper");
		assert_eq!(value["blend"], 0.4);
		assert!(value["host"].is_null());

		let json = format_resolved_json(Some("x.com"), &resolved).expect("json");
		let value: Value = serde_json::from_str(&json).expect("parse");
		assert_eq!(
			value,
			serde_json::json!({ "host": "x.com", "themeId": "paper", "blend": 0.4 })
		);
	}
}
