use std::net::SocketAddr;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum, builder::BoolishValueParser};
use dgraph_store::DgraphHttpConfig;
use thiserror::Error;

const DEFAULT_DGRAPH_HOST: &str = "localhost:8080";
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// How the daemon talks to its MCP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "dgraph-mcpd", version, about = "Dgraph MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "DGRAPH_HOST", default_value = DEFAULT_DGRAPH_HOST)]
    dgraph_host: String,

    #[arg(long, env = "DGRAPH_AUTH_TOKEN")]
    dgraph_auth_token: Option<String>,

    #[arg(long, env = "DGRAPH_ACCESS_TOKEN")]
    dgraph_access_token: Option<String>,

    #[arg(
        long,
        env = "DGRAPH_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(long, env = "DGRAPH_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    #[arg(long, env = "DGRAPH_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    http_addr: SocketAddr,

    #[arg(
        long,
        env = "DGRAPH_SEED_MOVIES",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    seed_movies: bool,

    #[arg(long, env = "DGRAPH_MCP_LOG", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct DgraphMcpConfig {
    pub dgraph: DgraphHttpConfig,
    pub request_timeout: Option<Duration>,
    pub transport: Transport,
    pub http_addr: SocketAddr,
    pub seed_movies: bool,
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} value `{value}`: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl DgraphMcpConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::try_from(CliArgs::parse())
    }
}

impl TryFrom<CliArgs> for DgraphMcpConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.dgraph_host.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "DGRAPH_HOST",
                value: args.dgraph_host,
                reason: "host must not be blank".to_string(),
            });
        }
        let dgraph = DgraphHttpConfig::from_host(&args.dgraph_host)
            .map_err(|err| ConfigError::InvalidSetting {
                name: "DGRAPH_HOST",
                value: args.dgraph_host.clone(),
                reason: err.to_string(),
            })?
            .with_auth_token(non_blank(args.dgraph_auth_token))
            .with_access_token(non_blank(args.dgraph_access_token));

        let request_timeout = (args.request_timeout_secs > 0)
            .then(|| Duration::from_secs(args.request_timeout_secs));

        if args.log_level.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "DGRAPH_MCP_LOG",
                value: args.log_level,
                reason: "log level must not be blank".to_string(),
            });
        }

        Ok(Self {
            dgraph,
            request_timeout,
            transport: args.transport,
            http_addr: args.http_addr,
            seed_movies: args.seed_movies,
            log_level: args.log_level,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            dgraph_host: DEFAULT_DGRAPH_HOST.to_string(),
            dgraph_auth_token: None,
            dgraph_access_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            transport: Transport::Stdio,
            http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            seed_movies: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    #[test]
    fn host_without_scheme_defaults_to_http() {
        let config = DgraphMcpConfig::try_from(base_args()).expect("config should parse");
        assert_eq!(config.dgraph.endpoint.as_str(), "http://localhost:8080/");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.transport, Transport::Stdio);
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let mut args = base_args();
        args.dgraph_host = "https://dgraph.internal:8443".to_string();
        let config = DgraphMcpConfig::try_from(args).expect("config should parse");
        assert_eq!(config.dgraph.endpoint.as_str(), "https://dgraph.internal:8443/");
    }

    #[test]
    fn blank_host_is_rejected() {
        let mut args = base_args();
        args.dgraph_host = "   ".to_string();
        let err = DgraphMcpConfig::try_from(args).expect_err("blank host");
        assert!(matches!(err, ConfigError::InvalidSetting { name: "DGRAPH_HOST", .. }));
    }

    #[test]
    fn unparseable_host_is_rejected() {
        let mut args = base_args();
        args.dgraph_host = "http://exa mple:8080".to_string();
        let err = DgraphMcpConfig::try_from(args).expect_err("invalid host");
        assert!(matches!(err, ConfigError::InvalidSetting { name: "DGRAPH_HOST", .. }));
    }

    #[test]
    fn zero_timeout_disables_the_deadline() {
        let mut args = base_args();
        args.request_timeout_secs = 0;
        let config = DgraphMcpConfig::try_from(args).expect("config should parse");
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn blank_tokens_are_dropped() {
        let mut args = base_args();
        args.dgraph_auth_token = Some(" ".to_string());
        args.dgraph_access_token = Some("jwt".to_string());
        let config = DgraphMcpConfig::try_from(args).expect("config should parse");
        assert!(config.dgraph.auth_token.is_none());
        assert_eq!(config.dgraph.access_token.as_deref(), Some("jwt"));
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "dgraph-mcpd",
            "--dgraph-host",
            "alpha:8080",
            "--transport",
            "http",
            "--seed-movies",
            "true",
        ])
        .expect("flags should parse");
        let config = DgraphMcpConfig::try_from(args).expect("config should parse");
        assert_eq!(config.transport, Transport::Http);
        assert!(config.seed_movies);
        assert_eq!(config.dgraph.endpoint.as_str(), "http://alpha:8080/");
    }

    #[test]
    fn seed_movies_accepts_boolish_values_and_a_bare_flag() {
        let seed = |extra: &[&str]| {
            let argv = ["dgraph-mcpd"].iter().chain(extra).copied();
            CliArgs::try_parse_from(argv).expect("flags should parse").seed_movies
        };
        assert!(!seed(&[]));
        assert!(seed(&["--seed-movies"]));
        assert!(seed(&["--seed-movies", "1"]));
        assert!(seed(&["--seed-movies=yes"]));
        assert!(!seed(&["--seed-movies", "off"]));
        assert!(seed(&["--seed-movies", "--transport", "http"]));
        assert!(CliArgs::try_parse_from(["dgraph-mcpd", "--seed-movies", "maybe"]).is_err());
    }
}
