mod args;
mod output;

pub(crate) use args::{CliArgs, Command, OutputFormat, parse_cli};
#[cfg(test)]
pub(crate) use args::ScopeArg;
pub(crate) use output::{
	ThemeRow, print_resolved_json, print_resolved_plain, print_themes_json, print_themes_plain,
};
