use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "workshop")]
#[command(about = "Workshop data-access CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the mock API over HTTP
    ServeMock(ServeMockArgs),
    /// List the statuses a job card may move to next
    NextStatuses(NextStatusesArgs),
    /// Issue a GET through the configured client and print the JSON reply
    Get(GetArgs),
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(clap::Args, Debug)]
pub struct ServeMockArgs {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub address: SocketAddr,

    /// Path prefix the routes are mounted under
    #[arg(long, default_value = "/api")]
    pub prefix: String,
}

#[derive(clap::Args, Debug)]
pub struct NextStatusesArgs {
    /// Current status, using its wire name (e.g. "In Progress")
    pub status: String,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Route path, e.g. /job-cards/42
    pub path: String,

    /// Query parameter as key=value, repeatable
    #[arg(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_params() {
        let cli = Cli::try_parse_from([
            "workshop", "get", "/job-cards", "--param", "status=In Progress", "--param", "page=2",
        ])
        .unwrap();

        let Commands::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.path, "/job-cards");
        assert_eq!(
            args.params,
            vec![
                ("status".to_string(), "In Progress".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_bad_param_rejected() {
        assert!(Cli::try_parse_from(["workshop", "get", "/leads", "--param", "oops"]).is_err());
        assert!(Cli::try_parse_from(["workshop", "get", "/leads", "--param", "=x"]).is_err());
    }

    #[test]
    fn test_serve_mock_defaults() {
        let cli = Cli::try_parse_from(["workshop", "serve-mock"]).unwrap();
        let Commands::ServeMock(args) = cli.command else {
            panic!("expected serve-mock");
        };
        assert_eq!(args.address.to_string(), "127.0.0.1:3000");
        assert_eq!(args.prefix, "/api");
    }
}
