mod cli;
mod config;
mod workflow;

use anyhow::Result;
use cli::parse_cli;
use workflow::Workflow;

fn main() -> Result<()> {
	let cli = parse_cli();
	let resolved = config::load(&cli)?;
	mutheme::logging::initialize(&resolved.log_filter);

	if cli.print_config {
		resolved.print_summary();
	}

	Workflow::from_config(resolved).run(cli.command)
}
