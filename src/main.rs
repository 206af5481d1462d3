use clap::Parser;
use resultguard::cli::{Cli, Commands};
use resultguard::commands::check::{self, CheckOptions};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(false) => 0,
        Ok(true) => 1,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Check {
            path,
            format,
            output,
            config,
            success_flag,
            failure_flag,
            value_accessor,
            receiver_contains,
            severity,
        } => check::run(CheckOptions {
            path,
            format: format.into(),
            output,
            config,
            success_flag,
            failure_flag,
            value_accessor,
            receiver_contains,
            severity: severity.map(Into::into),
        }),
    }
}
