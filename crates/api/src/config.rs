use clap::Parser;
use std::path::PathBuf;
use tracegate_tenant::TenancyConfig;

/// Tracegate tenant-isolating trace query API
#[derive(Debug, Parser)]
#[command(name = "tracegate-api", about = "Trace query API with per-tenant isolation")]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, env = "TRACEGATE_LISTEN", default_value = "0.0.0.0:16686")]
    pub listen: String,

    /// Base URL of the upstream trace query API
    #[arg(short, long, env = "TRACEGATE_UPSTREAM_URL")]
    pub upstream: Option<String>,

    /// JSON file of traces to serve from memory when no upstream is set
    #[arg(short, long, env = "TRACEGATE_FIXTURES")]
    pub fixtures: Option<PathBuf>,
}

/// Where traces are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Upstream(String),
    Fixtures(PathBuf),
    Empty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub backend: Backend,
    pub tenancy: TenancyConfig,
}

impl Config {
    pub fn from_cli(cli: Cli, tenancy: TenancyConfig) -> Self {
        let backend = match (cli.upstream.filter(|u| !u.is_empty()), cli.fixtures) {
            (Some(url), _) => Backend::Upstream(url),
            (None, Some(path)) => Backend::Fixtures(path),
            (None, None) => Backend::Empty,
        };
        Self {
            listen: cli.listen,
            backend,
            tenancy,
        }
    }

    /// Parse command line flags and read tenancy settings from the
    /// environment.
    pub fn load() -> Self {
        Self::from_cli(Cli::parse(), TenancyConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tracegate-api").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_upstream_wins_over_fixtures() {
        let config = Config::from_cli(
            cli(&["--upstream", "http://query:16686", "--fixtures", "traces.json"]),
            TenancyConfig::default(),
        );
        assert_eq!(config.backend, Backend::Upstream("http://query:16686".to_string()));
    }

    #[test]
    fn test_fixtures_backend() {
        let config = Config::from_cli(cli(&["-f", "traces.json", "-l", "127.0.0.1:9000"]), TenancyConfig::default());
        assert_eq!(config.backend, Backend::Fixtures(PathBuf::from("traces.json")));
        assert_eq!(config.listen, "127.0.0.1:9000");
    }
}
