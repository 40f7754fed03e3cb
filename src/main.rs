use clap::Parser;
use petstore_e2e::cli::{run_cli, Cli};
use petstore_e2e::logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&LogConfig::from_env()) {
        eprintln!("Warning: {err:#}");
    }
    let code = run_cli(cli).await;
    std::process::exit(code);
}
