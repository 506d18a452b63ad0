use std::{
    net::Ipv4Addr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use serde::Deserialize;
use services::{
    eip4844::Carrier,
    types::{Address, DataSourceConfig},
};
use signers::KeySource;
use url::Url;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: App,
    pub eth: Option<Eth>,
    pub eip4844: Option<Eip4844>,
    pub celestia: Option<Celestia>,
    pub eigenda: Option<EigenDa>,
    pub anytrust: Option<AnyTrust>,
    pub nearda: Option<NearDa>,
    #[serde(default)]
    pub aws: Aws,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.validate_with_kms_endpoint(std::env::var(signers::ENDPOINT_ENV).ok().as_deref())
    }

    fn validate_with_kms_endpoint(&self, kms_endpoint: Option<&str>) -> Result<()> {
        if !self.any_backend() {
            return Err(Error::Other(
                "at least one backend section must be configured".to_string(),
            ));
        }

        if self.eth.is_none() {
            if self.eip4844.is_some() {
                return Err(Error::Other(
                    "the eip4844 backend requires the eth section".to_string(),
                ));
            }
            if self.celestia.is_some() {
                return Err(Error::Other(
                    "the celestia backend requires the eth section for its l1 markers".to_string(),
                ));
            }
        }

        if let (Some(eth), Some(_)) = (&self.eth, &self.celestia) {
            if self.app.request_timeout <= eth.send_tx_request_timeout {
                return Err(Error::Other(format!(
                    "app.request_timeout ({}) must exceed eth.send_tx_request_timeout ({}) to leave time for celestia",
                    humantime::format_duration(self.app.request_timeout),
                    humantime::format_duration(eth.send_tx_request_timeout)
                )));
            }
        }

        if let Some(eigenda) = &self.eigenda {
            eigenda.validate()?;
        }

        let plain_http_kms = kms_endpoint.is_some_and(|endpoint| endpoint.starts_with("http://"));
        if self.uses_kms() && plain_http_kms && !self.aws.allow_http {
            return Err(Error::Other(format!(
                "{} points to a plain http endpoint, set aws.allow_http to use it",
                signers::ENDPOINT_ENV
            )));
        }

        Ok(())
    }

    fn any_backend(&self) -> bool {
        self.eip4844.is_some()
            || self.celestia.is_some()
            || self.eigenda.is_some()
            || self.anytrust.is_some()
            || self.nearda.is_some()
    }

    fn uses_kms(&self) -> bool {
        let eth_kms = self.eth.as_ref().is_some_and(|eth| eth.key.is_kms());
        let das_kms = self
            .anytrust
            .as_ref()
            .and_then(|anytrust| anytrust.signing_key.as_ref())
            .is_some_and(KeySource::is_kms);

        eth_kms || das_kms
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    /// IPv4 address on which the servers will listen for connections
    pub host: Ipv4Addr,
    /// Port of the HTTP API
    pub port: u16,
    /// Port of the TCP RPC server, disabled when absent
    pub rpc_port: Option<u16>,
    /// Upper bound on serving a single request
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "human_readable_duration"
    )]
    pub request_timeout: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(12)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Eth {
    /// URL to an Ethereum RPC endpoint.
    #[serde(deserialize_with = "parse_url")]
    pub rpc: Url,
    /// Chain id of the ethereum network.
    pub chain_id: u64,
    /// Key of the batcher, `Private(<hex>)` or `Kms(<key id>)`.
    pub key: KeySource,
    #[serde(deserialize_with = "parse_address")]
    pub batch_inbox_address: Address,
    #[serde(deserialize_with = "parse_address")]
    pub batcher_address: Address,
    #[serde(
        default = "default_send_tx_request_timeout",
        deserialize_with = "human_readable_duration"
    )]
    pub send_tx_request_timeout: Duration,
}

impl Eth {
    pub fn data_source(&self) -> DataSourceConfig {
        DataSourceConfig {
            batch_inbox_address: self.batch_inbox_address,
            batcher_address: self.batcher_address,
        }
    }
}

fn default_send_tx_request_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Eip4844 {
    /// Carry payloads in blobs rather than in calldata.
    #[serde(default = "default_true")]
    pub use_blobs: bool,
    /// URL to a beacon node REST endpoint.
    #[serde(deserialize_with = "parse_url")]
    pub beacon: Url,
}

impl Eip4844 {
    pub fn carrier(&self) -> Carrier {
        if self.use_blobs {
            Carrier::Blobs
        } else {
            Carrier::Calldata
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Celestia {
    /// URL to a Celestia DA proxy.
    #[serde(deserialize_with = "parse_url")]
    pub rpc: Url,
    #[serde(default)]
    pub auth_token: String,
    /// Hex encoded namespace.
    pub namespace: String,
    /// Fail instead of posting the payload to L1 when Celestia is unavailable.
    #[serde(default)]
    pub eth_fallback_disabled: bool,
    /// L1 block time, bounds how long a Celestia submission may take.
    #[serde(
        default = "default_block_time",
        deserialize_with = "human_readable_duration"
    )]
    pub block_time: Duration,
}

fn default_block_time() -> Duration {
    Duration::from_secs(12)
}

#[derive(Debug, Clone, Deserialize)]
pub struct EigenDa {
    /// URL to the EigenDA disperser gRPC endpoint.
    #[serde(deserialize_with = "parse_url")]
    pub rpc: Url,
    #[serde(
        default = "default_status_query_timeout",
        deserialize_with = "human_readable_duration"
    )]
    pub status_query_timeout: Duration,
    #[serde(
        default = "default_status_query_retry_interval",
        deserialize_with = "human_readable_duration"
    )]
    pub status_query_retry_interval: Duration,
}

impl EigenDa {
    fn validate(&self) -> Result<()> {
        if self.status_query_retry_interval.is_zero() {
            return Err(Error::Other(
                "eigenda.status_query_retry_interval must be non-zero".to_string(),
            ));
        }

        if self.status_query_retry_interval > self.status_query_timeout {
            return Err(Error::Other(format!(
                "eigenda.status_query_retry_interval ({}) exceeds status_query_timeout ({})",
                humantime::format_duration(self.status_query_retry_interval),
                humantime::format_duration(self.status_query_timeout)
            )));
        }

        Ok(())
    }
}

fn default_status_query_timeout() -> Duration {
    Duration::from_secs(25 * 60)
}

fn default_status_query_retry_interval() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnyTrust {
    /// URL to the DAS JSON-RPC endpoint used for storing.
    #[serde(deserialize_with = "parse_url")]
    pub rpc: Url,
    /// URL to the DAS REST endpoint used for retrieval.
    #[serde(deserialize_with = "parse_url")]
    pub rest: Url,
    /// How long the committee is asked to keep stored data.
    #[serde(
        default = "default_data_retention",
        deserialize_with = "human_readable_duration"
    )]
    pub data_retention: Duration,
    /// Signs store requests when the committee requires it.
    #[serde(default)]
    pub signing_key: Option<KeySource>,
}

fn default_data_retention() -> Duration {
    Duration::from_secs(14 * 24 * 60 * 60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearDa {
    /// URL to a NEAR DA sidecar.
    #[serde(deserialize_with = "parse_url")]
    pub sidecar: Url,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aws {
    /// Allow a plain http KMS endpoint, for local testing.
    #[serde(default)]
    pub allow_http: bool,
}

fn parse_url<'de, D>(deserializer: D) -> std::result::Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let url_str: String = Deserialize::deserialize(deserializer)?;
    Url::from_str(&url_str).map_err(|e| {
        let msg = format!("Failed to parse URL '{url_str}': {e};");
        serde::de::Error::custom(msg)
    })
}

fn parse_address<'de, D>(deserializer: D) -> std::result::Result<Address, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let address: String = Deserialize::deserialize(deserializer)?;
    Address::from_str(&address).map_err(|e| {
        let msg = format!("Failed to parse address '{address}': {e}");
        serde::de::Error::custom(msg)
    })
}

fn human_readable_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let duration_str: String = Deserialize::deserialize(deserializer)?;
    humantime::parse_duration(&duration_str).map_err(|e| {
        let msg = format!("Failed to parse duration '{duration_str}': {e};");
        serde::de::Error::custom(msg)
    })
}

#[derive(Parser)]
#[command(
    name = "da-gateway",
    version,
    about,
    propagate_version = true,
    arg_required_else_help(true)
)]
struct Cli {
    #[arg(value_name = "FILE", help = "Path to the configuration file")]
    config_path: PathBuf,
}

pub fn parse() -> Result<Config> {
    let cli = Cli::parse();

    load(&cli.config_path)
}

fn load(path: &Path) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("DA_GATEWAY").separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn full_config() -> String {
        format!(
            r#"
            [app]
            host = "127.0.0.1"
            port = 8080
            rpc_port = 8081

            [eth]
            rpc = "http://localhost:8545"
            chain_id = 17000
            key = "Private({DEV_KEY})"
            batch_inbox_address = "0xff00000000000000000000000000000000000000"
            batcher_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

            [eip4844]
            use_blobs = false
            beacon = "http://localhost:5052"

            [celestia]
            rpc = "http://localhost:26650"
            namespace = "000000000000000000000000000000000000000000000000000000"

            [eigenda]
            rpc = "https://disperser-holesky.eigenda.xyz:443"
            status_query_retry_interval = "2s"

            [anytrust]
            rpc = "http://localhost:9876"
            rest = "http://localhost:9877"
            data_retention = "7d"
            signing_key = "Kms(das-key)"

            [nearda]
            sidecar = "http://localhost:5888"
            "#
        )
    }

    fn minimal_config() -> Config {
        let file = write_config(
            r#"
            [app]
            host = "0.0.0.0"
            port = 8080

            [nearda]
            sidecar = "http://localhost:5888"
            "#,
        );

        load(file.path()).unwrap()
    }

    #[test]
    fn loads_every_section() {
        // given
        let file = write_config(&full_config());

        // when
        let config = load(file.path()).unwrap();

        // then
        assert_eq!(config.app.rpc_port, Some(8081));
        assert_eq!(config.app.request_timeout, Duration::from_secs(12));

        let eth = config.eth.unwrap();
        assert_eq!(eth.key, KeySource::Private(DEV_KEY.to_string()));
        assert_eq!(eth.send_tx_request_timeout, Duration::from_secs(10));
        assert_eq!(
            eth.data_source().batch_inbox_address,
            Address::from_str("0xff00000000000000000000000000000000000000").unwrap()
        );

        assert_eq!(config.eip4844.unwrap().carrier(), Carrier::Calldata);

        let celestia = config.celestia.unwrap();
        assert_eq!(celestia.auth_token, "");
        assert!(!celestia.eth_fallback_disabled);
        assert_eq!(celestia.block_time, Duration::from_secs(12));

        let eigenda = config.eigenda.unwrap();
        assert_eq!(eigenda.status_query_timeout, Duration::from_secs(25 * 60));
        assert_eq!(eigenda.status_query_retry_interval, Duration::from_secs(2));

        let anytrust = config.anytrust.unwrap();
        assert_eq!(anytrust.data_retention, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(
            anytrust.signing_key,
            Some(KeySource::Kms("das-key".to_string()))
        );

        assert!(!config.aws.allow_http);
    }

    #[test]
    fn absent_sections_leave_backends_unprepared() {
        let config = minimal_config();

        assert!(config.eth.is_none());
        assert!(config.eigenda.is_none());
        assert!(config.nearda.is_some());
        assert_eq!(config.app.rpc_port, None);
        config.validate_with_kms_endpoint(None).unwrap();
    }

    #[test]
    fn malformed_duration_is_reported() {
        let file = write_config(
            r#"
            [app]
            host = "0.0.0.0"
            port = 8080
            request_timeout = "soon"
            "#,
        );

        let err = load(file.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to parse duration 'soon'"));
    }

    #[test]
    fn config_without_backends_is_rejected() {
        // given
        let mut config = minimal_config();
        config.nearda = None;

        // when
        let err = config.validate_with_kms_endpoint(None).unwrap_err();

        // then
        assert!(err.to_string().contains("at least one backend"));
    }

    #[test]
    fn l1_backends_require_the_eth_section() {
        // given
        let file = write_config(&full_config());
        let mut config = load(file.path()).unwrap();
        config.eth = None;

        // when
        let err = config.validate_with_kms_endpoint(None).unwrap_err();

        // then
        assert!(err.to_string().contains("requires the eth section"));
    }

    #[test]
    fn celestia_needs_a_request_timeout_longer_than_the_l1_send() {
        // given
        let file = write_config(&full_config());
        let mut config = load(file.path()).unwrap();
        config.app.request_timeout = Duration::from_secs(10);

        // when
        let err = config.validate_with_kms_endpoint(None).unwrap_err();

        // then
        assert!(
            err.to_string()
                .contains("must exceed eth.send_tx_request_timeout")
        );
    }

    #[test]
    fn poll_interval_must_fit_the_timeout() {
        // given
        let mut config = minimal_config();
        config.eigenda = Some(EigenDa {
            rpc: Url::parse("http://localhost:50051").unwrap(),
            status_query_timeout: Duration::from_secs(1),
            status_query_retry_interval: Duration::from_secs(5),
        });

        // when
        let err = config.validate_with_kms_endpoint(None).unwrap_err();

        // then
        assert!(err.to_string().contains("exceeds status_query_timeout"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = minimal_config();
        config.eigenda = Some(EigenDa {
            rpc: Url::parse("http://localhost:50051").unwrap(),
            status_query_timeout: Duration::from_secs(1),
            status_query_retry_interval: Duration::ZERO,
        });

        let err = config.validate_with_kms_endpoint(None).unwrap_err();

        assert!(err.to_string().contains("must be non-zero"));
    }

    #[test]
    fn plain_http_kms_needs_opt_in() {
        // given
        let file = write_config(&full_config());
        let mut config = load(file.path()).unwrap();
        let endpoint = Some("http://localhost:4566");

        // when
        let rejected = config.validate_with_kms_endpoint(endpoint);
        config.aws.allow_http = true;
        let allowed = config.validate_with_kms_endpoint(endpoint);

        // then
        assert!(rejected.unwrap_err().to_string().contains("aws.allow_http"));
        allowed.unwrap();
    }
}
