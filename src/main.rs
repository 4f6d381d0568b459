use clap::Parser;
use tracing::error;

use arbiter::cli::{Cli, Commands, RunArgs};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Run(RunArgs {
        no_banner: false,
        dry_run: false,
        log_level: None,
        json_logs: false,
    })) {
        Commands::Run(args) => arbiter::cli::run::execute(&cli.config, &args).await,
        Commands::Status => arbiter::cli::status::execute(&cli.config).await,
        Commands::Resume => arbiter::cli::resume::execute(&cli.config).await,
    };

    if let Err(e) = result {
        report_and_exit(&e);
    }
}

fn report_and_exit(err: &arbiter::error::Error) -> ! {
    error!(error = %err, "fatal error");
    eprintln!("error: {err}");
    std::process::exit(exit_code(err));
}

fn exit_code(err: &arbiter::error::Error) -> i32 {
    match err {
        arbiter::error::Error::Config(_) => 1,
        _ => 2,
    }
}
