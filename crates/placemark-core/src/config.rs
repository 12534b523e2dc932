//! Connection-string parsing: `sqlite://[driver]?dsn=<path>[&cache=<opt>][&ttl=<sec>]`.

use crate::error::CoreError;
use std::time::Duration;
use url::Url;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_SWEEP_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub scheme: String,
    pub driver: Option<String>,
    pub dsn: String,
    pub cache_ttl: Duration,
    pub cache_sweep: Duration,
    pub index_alt: bool,
}

impl DatabaseConfig {
    /// Parses a connection string of the form
    /// `sqlite://[driver]?dsn=<path>[&cache_ttl=<sec>][&cache_sweep=<sec>][&index_alt=<bool>]`.
    ///
    /// `dsn` is the only required parameter; its absence is a `ConfigError`
    /// raised at construction, per the external-interfaces contract.
    pub fn parse(connection_string: &str) -> Result<Self, CoreError> {
        let url = Url::parse(connection_string)
            .map_err(|e| CoreError::Config(format!("malformed connection string: {e}")))?;

        let scheme = url.scheme().to_string();
        let driver = url.host_str().filter(|s| !s.is_empty()).map(str::to_string);

        let mut dsn: Option<String> = None;
        let mut cache_ttl = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
        let mut cache_sweep = Duration::from_secs(DEFAULT_CACHE_SWEEP_SECS);
        let mut index_alt = false;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "dsn" => dsn = Some(value.into_owned()),
                "cache_ttl" | "ttl" => {
                    cache_ttl = Duration::from_secs(
                        value
                            .parse()
                            .map_err(|_| CoreError::Config(format!("invalid cache_ttl: {value}")))?,
                    );
                }
                "cache_sweep" => {
                    cache_sweep = Duration::from_secs(
                        value
                            .parse()
                            .map_err(|_| CoreError::Config(format!("invalid cache_sweep: {value}")))?,
                    );
                }
                "index_alt" => {
                    index_alt = value == "1" || value.eq_ignore_ascii_case("true");
                }
                _ => {}
            }
        }

        let dsn = dsn.ok_or_else(|| CoreError::Config("Missing 'dsn' parameter".into()))?;

        Ok(DatabaseConfig { scheme, driver, dsn, cache_ttl, cache_sweep, index_alt })
    }
}
