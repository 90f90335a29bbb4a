use anyhow::Result;
use clap::Parser;
use sign_recognizer::cli::Cli;
use tracing_subscriber::{filter::Directive, EnvFilter};

fn main() -> Result<()> {
    let default_directive: Directive = "sign_recognizer=info".parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive))
        .init();

    let cli = Cli::parse();
    cli.run()
}
