use std::fmt::Write;

use crate::settings::clamp_blend;
use crate::theme::{ThemeDefinition, Tone};

const PAGE_RULES: &str = include_str!("page_rules.css");

/// Overlay strengths derived from a tone and blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayProfile {
	pub tone: Tone,
	/// Page overlay opacity, in percent.
	pub overlay: u32,
	/// Surface overlay, 12 points above the page overlay.
	pub surface_overlay: u32,
	/// Card overlay, 24 points above the page overlay.
	pub card_overlay: u32,
	pub shadow_strength: f64,
	pub overlay_mode: &'static str,
	pub overlay_alpha: f64,
	pub accent_veil: f64,
}

impl OverlayProfile {
	/// Build the profile for `tone`. `blend` is clamped first.
	#[must_use]
	pub fn new(tone: Tone, blend: f64) -> Self {
		let blend = clamp_blend(blend);
		let overlay = percent(blend);
		let surface_overlay = percent(blend + 0.12).min(100);
		let card_overlay = percent(blend + 0.24).min(100);

		match tone {
			Tone::Dark => Self {
				tone,
				overlay,
				surface_overlay,
				card_overlay,
				shadow_strength: 0.35,
				overlay_mode: "multiply",
				overlay_alpha: (blend + 0.05).clamp(0.35, 0.85),
				accent_veil: 0.16,
			},
			Tone::Light => Self {
				tone,
				overlay,
				surface_overlay,
				card_overlay,
				shadow_strength: 0.18,
				overlay_mode: "screen",
				overlay_alpha: (blend + 0.1).min(0.45),
				accent_veil: 0.08,
			},
		}
	}
}

// Halves round up, which is what `f64::round` does for the non-negative
// values seen here.
fn percent(value: f64) -> u32 {
	(value * 100.0).round() as u32
}

/// Render the complete style sheet for `theme` at `blend`.
///
/// The output is a pure function of its inputs: the same theme and blend
/// always produce byte-identical text.
#[must_use]
pub fn derive_style(theme: &ThemeDefinition, blend: f64) -> String {
	let profile = OverlayProfile::new(theme.tone, blend);
	let colors = &theme.colors;

	let variables: [(&str, String); 15] = [
		("bg", colors.background.clone()),
		("surface", colors.surface.clone()),
		("surface-alt", colors.surface_alt.clone()),
		("border", colors.border.clone()),
		("text", colors.text_primary.clone()),
		("text-muted", colors.text_muted.clone()),
		("accent", colors.accent.clone()),
		("accent-soft", colors.accent_soft.clone()),
		("overlay", format!("{}%", profile.overlay)),
		("surface-overlay", format!("{}%", profile.surface_overlay)),
		("card-overlay", format!("{}%", profile.card_overlay)),
		("shadow-strength", profile.shadow_strength.to_string()),
		("overlay-mode", profile.overlay_mode.to_string()),
		("overlay-alpha", profile.overlay_alpha.to_string()),
		("accent-veil", profile.accent_veil.to_string()),
	];

	let mut css = String::with_capacity(PAGE_RULES.len() + 1024);
	css.push_str(":root {\n");
	for (name, value) in &variables {
		let _ = writeln!(css, "  --mut-{name}: {value};");
	}
	let _ = writeln!(css, "  color-scheme: {};", profile.tone.as_str());
	css.push_str("}\n\n");
	css.push_str(PAGE_RULES);
	css
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::theme::ThemeColors;

	fn theme(tone: Tone) -> ThemeDefinition {
		ThemeDefinition {
			id: "t".into(),
			name: "T".into(),
			description: String::new(),
			tone,
			colors: ThemeColors {
				background: "#101010".into(),
				surface: "#202020".into(),
				surface_alt: "#303030".into(),
				border: "#404040".into(),
				text_primary: "#f0f0f0".into(),
				text_muted: "#a0a0a0".into(),
				accent: "#e2b714".into(),
				accent_soft: "#c9a227".into(),
			},
		}
	}

	#[test]
	fn overlays_step_up_and_cap_at_full() {
		let profile = OverlayProfile::new(Tone::Dark, 0.5);
		assert_eq!(
			(profile.overlay, profile.surface_overlay, profile.card_overlay),
			(50, 62, 74)
		);

		let profile = OverlayProfile::new(Tone::Dark, 0.9);
		assert_eq!(
			(profile.overlay, profile.surface_overlay, profile.card_overlay),
			(90, 100, 100)
		);
	}

	#[test]
	fn blend_is_clamped_before_deriving() {
		assert_eq!(OverlayProfile::new(Tone::Dark, 0.0).overlay, 15);
		assert_eq!(OverlayProfile::new(Tone::Dark, 4.0).overlay, 100);
		assert_eq!(OverlayProfile::new(Tone::Dark, f64::NAN).overlay, 90);
	}

	#[test]
	fn tone_selects_constants() {
		let dark = OverlayProfile::new(Tone::Dark, 0.2);
		let light = OverlayProfile::new(Tone::Light, 0.2);

		assert_eq!(dark.shadow_strength, 0.35);
		assert_eq!(light.shadow_strength, 0.18);
		assert_eq!(dark.overlay_mode, "multiply");
		assert_eq!(light.overlay_mode, "screen");
		assert_eq!(dark.accent_veil, 0.16);
		assert_eq!(light.accent_veil, 0.08);
		assert_eq!(dark.overlay_alpha, 0.35);
		assert!((light.overlay_alpha - 0.3).abs() < 1e-9);

		assert_eq!(OverlayProfile::new(Tone::Dark, 1.0).overlay_alpha, 0.85);
		assert_eq!(OverlayProfile::new(Tone::Light, 1.0).overlay_alpha, 0.45);
	}

	#[test]
	fn derivation_is_deterministic() {
		let theme = theme(Tone::Dark);
		assert_eq!(derive_style(&theme, 0.9), derive_style(&theme, 0.9));
		assert_ne!(derive_style(&theme, 0.9), derive_style(&theme, 0.5));
	}

	#[test]
	fn root_block_carries_variables_and_scheme() {
		let css = derive_style(&theme(Tone::Light), 0.5);
		assert!(css.starts_with(":root {\n  --mut-bg: #101010;\n  --mut-surface: #202020;\n"));
		assert!(css.contains("  --mut-surface-alt: #303030;\n"));
		assert!(css.contains("  --mut-text: #f0f0f0;\n"));
		assert!(css.contains("  --mut-overlay: 50%;\n"));
		assert!(css.contains("  --mut-surface-overlay: 62%;\n"));
		assert!(css.contains("  --mut-card-overlay: 74%;\n"));
		assert!(css.contains("  --mut-shadow-strength: 0.18;\n"));
		assert!(css.contains("  --mut-overlay-mode: screen;\n"));
		assert!(css.contains("  --mut-accent-veil: 0.08;\n"));
		assert!(css.contains("  color-scheme: light;\n}\n\nhtml {\n"));
		assert!(css.ends_with("filter: none !important;\n}\n"));
	}

	#[test]
	fn light_and_dark_output_differ() {
		let dark = derive_style(&theme(Tone::Dark), 0.6);
		let light = derive_style(&theme(Tone::Light), 0.6);
		assert!(dark.contains("--mut-overlay-mode: multiply;"));
		assert!(light.contains("--mut-overlay-mode: screen;"));
		assert!(dark.contains("color-scheme: dark;"));
		assert_ne!(dark, light);
	}

	#[test]
	fn every_custom_property_is_declared() {
		let css = derive_style(&theme(Tone::Dark), 0.7);
		for name in [
			"bg",
			"surface",
			"surface-alt",
			"border",
			"text",
			"text-muted",
			"accent",
			"accent-soft",
			"overlay",
			"surface-overlay",
			"card-overlay",
			"shadow-strength",
			"overlay-mode",
			"overlay-alpha",
			"accent-veil",
		] {
			assert!(css.contains(&format!("  --mut-{name}: ")), "missing --mut-{name}");
		}
	}
}
