mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use serde_json::Value;
use workshop::app::{self, App};
use workshop::client::RequestConfig;
use workshop::config::Config;
use workshop::observability::init_tracing;
use workshop::server;
use workshop::workflow::{JobCardStatus, WorkflowEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    match cli.command {
        Commands::ServeMock(args) => {
            let registry = app::mock_registry(app::open_store(&config)?);
            server::run(args.address, registry, &args.prefix).await?;
        }
        Commands::NextStatuses(args) => {
            let status: JobCardStatus = args.status.parse()?;
            let engine = WorkflowEngine::new();
            for next in engine.next_statuses(status) {
                println!("{}", next);
            }
            if engine.is_terminal(status) {
                println!("({} is terminal)", status);
            }
        }
        Commands::Get(args) => {
            let app = App::build(&config)?;
            let request = args
                .params
                .into_iter()
                .fold(RequestConfig::default(), |request, (key, value)| request.with_param(key, value));

            let response = app.client.get::<Value>(&args.path, request).await?;
            println!("{}", serde_json::to_string_pretty(&response.data)?);
        }
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
