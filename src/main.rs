use clap::Parser;
use outline::cli::commands::Cli;
use outline::cli::handlers;

fn main() {
    let cli = Cli::parse();
    outline::telemetry::init(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
