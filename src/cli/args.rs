use std::fmt::Write;
use std::path::PathBuf;

use clap::{
	ArgAction, ColorChoice, Parser, Subcommand, ValueEnum,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use mutheme::ApplyScope;
use mutheme::app_dirs;

/// Produce the full version banner including config and data directories.
fn long_version() -> &'static str {
	let config_dir = match app_dirs::get_config_dir() {
		Ok(path) => path.display().to_string(),
		Err(err) => format!("unavailable ({err})"),
	};
	let data_dir = match app_dirs::get_data_dir() {
		Ok(path) => path.display().to_string(),
		Err(err) => format!("unavailable ({err})"),
	};

	let mut details = format!("mutheme {}", env!("CARGO_PKG_VERSION"));
	let _ = writeln!(details);
	let _ = writeln!(details, "config directory: {config_dir}");
	let _ = writeln!(details, "data directory: {data_dir}");

	Box::leak(details.into_boxed_str())
}

/// Create the clap styles used for custom colour output.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().effects(Effects::BOLD))
		.usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into the strongly typed [`CliArgs`] structure.
pub(crate) fn parse_cli() -> CliArgs {
	CliArgs::parse()
}

#[derive(Parser, Debug)]
#[command(
	name = "mutheme",
	version,
	long_version = long_version(),
	about = "Recolor web pages with curated themes",
	color = ColorChoice::Auto,
	styles = cli_styles()
)]
/// Command-line arguments accepted by the `mutheme` binary.
pub(crate) struct CliArgs {
	#[arg(
		short,
		long = "config",
		value_name = "FILE",
		env = "MUTHEME_CONFIG",
		action = ArgAction::Append,
		global = true,
		help = "Additional configuration file to merge (default: none)"
	)]
	pub(crate) config: Vec<PathBuf>,
	#[arg(
		short = 'n',
		long = "no-config",
		global = true,
		help = "Skip loading default configuration files (default: disabled)"
	)]
	pub(crate) no_config: bool,
	#[arg(
		long,
		value_name = "FILE",
		global = true,
		help = "Read themes from this catalog file (default: built-in catalog)"
	)]
	pub(crate) catalog: Option<PathBuf>,
	#[arg(
		long,
		value_name = "FILE",
		global = true,
		help = "Settings store to read and write (default: data directory)"
	)]
	pub(crate) store: Option<PathBuf>,
	#[arg(
		long = "log",
		value_name = "FILTER",
		global = true,
		help = "Log filter when RUST_LOG is unset (default: info)"
	)]
	pub(crate) log_filter: Option<String>,
	#[arg(
		long = "print-config",
		global = true,
		help = "Print the effective configuration before running (default: disabled)"
	)]
	pub(crate) print_config: bool,
	#[command(subcommand)]
	pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum Command {
	/// List catalog themes, favorites first.
	Themes {
		#[arg(short, long, value_name = "QUERY", help = "Only themes matching this text")]
		search: Option<String>,
		#[arg(short, long, help = "Only favorite themes")]
		favorites: bool,
		#[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
		output: OutputFormat,
	},
	/// Show which theme applies to a host.
	Resolve {
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
		#[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
		output: OutputFormat,
	},
	/// Print the style sheet for a theme.
	Css {
		#[arg(long, value_name = "ID", help = "Theme id (default: resolved from settings)")]
		theme: Option<String>,
		#[arg(long, value_name = "BLEND", help = "Blend (default: resolved from settings)")]
		blend: Option<f64>,
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
	},
	/// Install the resolved style sheet into a file.
	Apply {
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
		#[arg(short, long, value_name = "FILE")]
		out: PathBuf,
	},
	/// Keep a style sheet file in step with the settings store.
	Watch {
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
		#[arg(short, long, value_name = "FILE")]
		out: PathBuf,
	},
	/// Choose a theme for the current scope.
	Select {
		theme: String,
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
	},
	/// Set the blend for the current scope.
	Blend {
		value: f64,
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
	},
	/// Switch between global and per-site themes.
	Scope {
		#[arg(value_enum)]
		scope: ScopeArg,
		#[arg(long, value_name = "HOST")]
		host: Option<String>,
	},
	/// Add or remove a favorite theme.
	Favorite { theme: String },
	/// Remove the theme override for a site.
	ClearSite {
		#[arg(long, value_name = "HOST")]
		host: String,
	},
	/// Write default settings for any key that is not set yet.
	Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
	Plain,
	Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScopeArg {
	Global,
	Site,
}

impl From<ScopeArg> for ApplyScope {
	fn from(value: ScopeArg) -> Self {
		match value {
			ScopeArg::Global => Self::Global,
			ScopeArg::Site => Self::Site,
		}
	}
}
