use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mutheme::settings::{self, JsonFileStore, SettingsStore};
use mutheme::style::FileDocument;
use mutheme::theme::FileCatalog;
use mutheme::{
	AgentOptions, ApplyOutcome, CatalogLoader, ControlSurface, PageAgent, PageEvents,
	StyleApplicator, derive_style, host_from_url, resolve,
};

use crate::cli::{
	Command, OutputFormat, ThemeRow, print_resolved_json, print_resolved_plain, print_themes_json,
	print_themes_plain,
};
use crate::config::ResolvedConfig;

/// How often `watch` re-reads the settings file.
const WATCH_POLL: Duration = Duration::from_millis(250);

/// Runs one command against the configured store and catalog.
pub(crate) struct Workflow {
	store: Arc<JsonFileStore>,
	catalog: Arc<CatalogLoader>,
	debounce: Duration,
}

impl Workflow {
	pub(crate) fn from_config(config: ResolvedConfig) -> Self {
		let catalog = match config.catalog_path {
			Some(path) => CatalogLoader::new(FileCatalog::new(path)),
			None => CatalogLoader::builtin(),
		};

		Self {
			store: Arc::new(JsonFileStore::new(config.store_path)),
			catalog: Arc::new(catalog),
			debounce: config.debounce,
		}
	}

	pub(crate) fn run(self, command: Command) -> Result<()> {
		match command {
			Command::Themes {
				search,
				favorites,
				output,
			} => self.list_themes(search.as_deref().unwrap_or_default(), favorites, output),
			Command::Resolve { host, output } => self.show_resolved(page_host(host)?, output),
			Command::Css { theme, blend, host } => self.print_css(theme, blend, page_host(host)?),
			Command::Apply { host, out } => self.apply_once(page_host(host)?, out),
			Command::Watch { host, out } => self.watch(page_host(host)?, out),
			Command::Select { theme, host } => {
				self.ensure_known(&theme)?;
				let mut surface = self.surface(page_host(host)?)?;
				surface.select_theme(&theme)?;
				report_selection(&surface);
				Ok(())
			}
			Command::Blend { value, host } => {
				let mut surface = self.surface(page_host(host)?)?;
				surface.update_blend(value)?;
				report_selection(&surface);
				Ok(())
			}
			Command::Scope { scope, host } => {
				let mut surface = self.surface(page_host(host)?)?;
				if !surface.change_scope(scope.into())? {
					bail!("site scope needs a host (pass --host)");
				}
				report_selection(&surface);
				Ok(())
			}
			Command::Favorite { theme } => {
				self.ensure_known(&theme)?;
				let mut surface = self.surface(None)?;
				if surface.toggle_favorite(&theme)? {
					println!("{theme} added to favorites");
				} else {
					println!("{theme} removed from favorites");
				}
				Ok(())
			}
			Command::ClearSite { host } => {
				let host = page_host(Some(host))?;
				let mut surface = self.surface(host)?;
				surface.clear_site_override()?;
				report_selection(&surface);
				Ok(())
			}
			Command::Init => {
				let written = settings::install_defaults(self.store.as_ref())?;
				if written.is_empty() {
					println!("Settings already initialised");
				} else {
					println!("Initialised {}", written.join(", "));
				}
				Ok(())
			}
		}
	}

	fn list_themes(&self, query: &str, favorites_only: bool, format: OutputFormat) -> Result<()> {
		let surface = self.surface(None)?;
		let rows: Vec<ThemeRow<'_>> = surface
			.filter_catalog(query, favorites_only)
			.into_iter()
			.map(|theme| ThemeRow {
				favorite: surface.is_favorite(&theme.id),
				current: theme.id == surface.current_theme_id(),
				theme,
			})
			.collect();

		match format {
			OutputFormat::Plain => print_themes_plain(&rows),
			OutputFormat::Json => print_themes_json(&rows)?,
		}
		Ok(())
	}

	fn show_resolved(&self, host: Option<String>, format: OutputFormat) -> Result<()> {
		let settings = settings::load(self.store.as_ref())?;
		let resolved = resolve(&settings, host.as_deref());

		match format {
			OutputFormat::Plain => print_resolved_plain(host.as_deref(), &resolved),
			OutputFormat::Json => print_resolved_json(host.as_deref(), &resolved)?,
		}
		Ok(())
	}

	fn print_css(&self, theme: Option<String>, blend: Option<f64>, host: Option<String>) -> Result<()> {
		let settings = settings::load(self.store.as_ref())?;
		let resolved = resolve(&settings, host.as_deref());
		let theme_id = theme.unwrap_or(resolved.theme_id);

		let Some(theme) = self.catalog.theme(&theme_id) else {
			bail!("the theme catalog is empty");
		};
		print!("{}", derive_style(&theme, blend.unwrap_or(resolved.blend)));
		Ok(())
	}

	fn apply_once(&self, host: Option<String>, out: PathBuf) -> Result<()> {
		let applicator = StyleApplicator::new(Arc::clone(&self.catalog), FileDocument::new(&out));
		let outcome = applicator.apply_from_settings(self.store.as_ref(), host.as_deref(), true)?;

		match outcome {
			ApplyOutcome::Applied(state) => println!(
				"Applied {} at {}% to {}",
				state.theme_id,
				(state.blend * 100.0).round(),
				out.display()
			),
			ApplyOutcome::Unchanged => println!("{} is already up to date", out.display()),
			ApplyOutcome::NoTheme => bail!("the theme catalog is empty"),
		}
		Ok(())
	}

	/// Run a page agent against `out` until the process is interrupted.
	fn watch(&self, host: Option<String>, out: PathBuf) -> Result<()> {
		self.store
			.reload()
			.with_context(|| format!("failed to read {}", self.store.path().display()))?;

		let events = PageEvents::new();
		let applicator = Arc::new(StyleApplicator::new(
			Arc::clone(&self.catalog),
			FileDocument::new(&out),
		));
		let store: Arc<dyn SettingsStore> = self.store.clone();
		let _agent = PageAgent::start(
			store,
			&events,
			applicator,
			AgentOptions {
				host,
				debounce: self.debounce,
			},
		);
		tracing::info!(
			store = %self.store.path().display(),
			out = %out.display(),
			"watching settings; press Ctrl-C to stop"
		);

		loop {
			thread::sleep(WATCH_POLL);
			if let Err(error) = self.store.reload() {
				tracing::warn!(error = %format!("{error:#}"), "failed to re-read settings");
			}
		}
	}

	fn surface(&self, host: Option<String>) -> Result<ControlSurface> {
		let store: Arc<dyn SettingsStore> = self.store.clone();
		Ok(ControlSurface::open(store, self.catalog.load(), host, None)?)
	}

	fn ensure_known(&self, theme_id: &str) -> Result<()> {
		if !self.catalog.load().contains(theme_id) {
			bail!("unknown theme '{theme_id}' (see `mutheme themes`)");
		}
		Ok(())
	}
}

/// Accept either a bare hostname or a page URL.
fn page_host(arg: Option<String>) -> Result<Option<String>> {
	match arg {
		Some(value) if value.contains("://") => match host_from_url(&value) {
			Some(host) => Ok(Some(host)),
			None => bail!("pages at {value} cannot be themed"),
		},
		Some(value) => Ok(Some(value.trim().to_ascii_lowercase()).filter(|host| !host.is_empty())),
		None => Ok(None),
	}
}

fn report_selection(surface: &ControlSurface) {
	let scope = match surface.host() {
		Some(host) => format!("{} scope on {host}", surface.scope().as_str()),
		None => format!("{} scope", surface.scope().as_str()),
	};
	println!(
		"{}: {} at {}",
		scope,
		surface.current_theme_id(),
		surface.blend_label()
	);
}
