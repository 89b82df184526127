mod cli;

use std::net::SocketAddr;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,drawchat_push=debug")),
        )
        .with(fmt::layer())
        .try_init();

    let code = match cli::run() {
        cli::RunOutcome::Serve(config) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
            match drawchat_push::serve(addr, config).await {
                Ok(()) => 0,
                Err(drawchat_push::ServeError::Config(err)) => {
                    error!(error = %err, "invalid configuration");
                    2
                }
                Err(err) => {
                    error!(error = %err, "server stopped");
                    1
                }
            }
        }
        cli::RunOutcome::Client(command) => cli::run_client(command).await,
        cli::RunOutcome::Exit(code) => code,
    };
    std::process::exit(code);
}
