mod cli;
mod jq_exec;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    // Diagnostics go to stdout; logs stay on stderr, filtered by RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
