//! Startup proxy loading
//!
//! Sources are tried in priority order, stopping at the first one that
//! yields at least one usable proxy:
//! 1. the proxy file (JSON array of records, e.g. a proxy-list export)
//! 2. the PROXY_LIST string (`protocol://[user:pass@]host:port,...`)
//!
//! Neither yielding anything means direct-connection mode. Bad records are
//! skipped with a warning, never fatal.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::types::{parse_port, Proxy, ProxyProtocol};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Where the active proxy list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOrigin {
    File,
    EnvList,
    /// Nothing configured: direct connection
    None,
}

/// Result of the one-shot startup load
#[derive(Debug, Clone)]
pub struct LoadedProxies {
    pub proxies: Vec<Proxy>,
    pub origin: ProxyOrigin,
}

/// One record of the proxy file. Extra fields (anonymity, score,
/// geolocation, ...) are ignored.
#[derive(Debug, Deserialize)]
struct ProxyFileEntry {
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<Value>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    https: Option<bool>,
}

impl ProxyFileEntry {
    fn into_proxy(self) -> Result<Proxy, String> {
        let host = self
            .ip
            .or(self.host)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "missing host".to_string())?;

        let port = match &self.port {
            Some(Value::Number(n)) => n.as_u64().and_then(|p| u16::try_from(p).ok()).filter(|p| *p != 0),
            Some(Value::String(s)) => parse_port(s),
            _ => None,
        }
        .ok_or_else(|| format!("missing or invalid port for {}", host))?;

        let protocol = match self.protocol.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => ProxyProtocol::parse_from_str(p).ok_or_else(|| format!("unsupported protocol '{}'", p))?,
            None if self.https == Some(true) => ProxyProtocol::Https,
            None => ProxyProtocol::Http,
        };

        Ok(Proxy::new(protocol, host, port))
    }
}

/// Parses the contents of a proxy file. Unusable records are skipped.
pub fn parse_proxy_file(content: &str) -> AppResult<Vec<Proxy>> {
    let entries: Vec<Value> = serde_json::from_str(content)?;

    let mut proxies = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<ProxyFileEntry>(entry)
            .map_err(|e| e.to_string())
            .and_then(ProxyFileEntry::into_proxy);
        match parsed {
            Ok(proxy) => proxies.push(proxy),
            Err(reason) => log::warn!("⚠️ Skipping proxy file entry #{}: {}", index, reason),
        }
    }
    Ok(proxies)
}

/// Parses a comma-separated proxy list. Unusable tokens are skipped.
pub fn parse_proxy_list(raw: &str) -> Vec<Proxy> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match Proxy::from_string(token) {
            Ok(proxy) => Some(proxy),
            Err(e) => {
                log::warn!("⚠️ Failed to parse proxy from PROXY_LIST: {}", e);
                None
            }
        })
        .collect()
}

fn read_proxy_file(path: &Path) -> AppResult<Option<Vec<Proxy>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    parse_proxy_file(&content).map(Some)
}

/// Keeps the first proxy of every host:port identity.
fn dedup_by_identity(proxies: Vec<Proxy>) -> Vec<Proxy> {
    let mut seen = HashSet::new();
    proxies
        .into_iter()
        .filter(|proxy| {
            let fresh = seen.insert(proxy.key());
            if !fresh {
                log::warn!("⚠️ Duplicate proxy {} ignored", proxy.key());
            }
            fresh
        })
        .collect()
}

/// Loads the proxy list once at startup.
pub fn load_proxies(config: &Config) -> LoadedProxies {
    match read_proxy_file(&config.proxy_file) {
        Ok(Some(proxies)) => {
            let proxies = dedup_by_identity(proxies);
            if !proxies.is_empty() {
                return LoadedProxies {
                    proxies,
                    origin: ProxyOrigin::File,
                };
            }
            log::warn!(
                "Proxy file {} contains no usable proxies",
                config.proxy_file.display()
            );
        }
        Ok(None) => {}
        Err(e) => log::warn!(
            "Failed to load proxies from {}: {}",
            config.proxy_file.display(),
            describe(&e)
        ),
    }

    if let Some(raw) = config.proxy_list.as_deref() {
        let proxies = dedup_by_identity(parse_proxy_list(raw));
        if !proxies.is_empty() {
            return LoadedProxies {
                proxies,
                origin: ProxyOrigin::EnvList,
            };
        }
        log::warn!("PROXY_LIST is set but contains no usable proxies");
    }

    LoadedProxies {
        proxies: Vec::new(),
        origin: ProxyOrigin::None,
    }
}

fn describe(e: &AppError) -> String {
    match e {
        AppError::Json(inner) => format!("not a JSON array of proxy records ({})", inner),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const EXPORT_SAMPLE: &str = r#"[
        {"proxy": "http://1.1.1.1:80", "protocol": "http", "ip": "1.1.1.1", "port": 80,
         "https": false, "anonymity": "transparent", "score": 1,
         "geolocation": {"country": "ZZ", "city": "Unknown"}},
        {"proxy": "https://2.2.2.2:443", "protocol": "https", "ip": "2.2.2.2", "port": 443,
         "https": true, "anonymity": "elite", "score": 1,
         "geolocation": {"country": "ZZ", "city": "Unknown"}}
    ]"#;

    fn config_with(proxy_file: PathBuf, proxy_list: Option<&str>) -> Config {
        Config {
            proxy_file,
            proxy_list: proxy_list.map(String::from),
            ..Config::default()
        }
    }

    fn temp_proxy_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_export_format() {
        let proxies = parse_proxy_file(EXPORT_SAMPLE).unwrap();
        assert_eq!(
            proxies,
            vec![
                Proxy::new(ProxyProtocol::Http, "1.1.1.1", 80),
                Proxy::new(ProxyProtocol::Https, "2.2.2.2", 443),
            ]
        );
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let content = r#"[
            {"ip": "1.1.1.1", "port": 8080, "protocol": "http"},
            {"ip": "", "port": 8080, "protocol": "http"},
            {"ip": "3.3.3.3", "protocol": "http"},
            {"ip": "4.4.4.4", "port": "not-a-port", "protocol": "http"},
            {"ip": "5.5.5.5", "port": 1080, "protocol": "socks5"},
            {"ip": "6.6.6.6", "port": 0},
            "garbage",
            {"host": "proxy.example.com", "port": "3128", "https": true}
        ]"#;
        let proxies = parse_proxy_file(content).unwrap();
        assert_eq!(
            proxies,
            vec![
                Proxy::new(ProxyProtocol::Http, "1.1.1.1", 8080),
                Proxy::new(ProxyProtocol::Https, "proxy.example.com", 3128),
            ]
        );
    }

    #[test]
    fn test_non_array_file_is_an_error() {
        assert!(parse_proxy_file("{\"ip\": \"1.1.1.1\"}").is_err());
        assert!(parse_proxy_file("not json").is_err());
    }

    #[test]
    fn test_parse_proxy_list() {
        let proxies = parse_proxy_list("http://user:pass@h1:8000, bogus ,, https://h2:8443,ftp://h3:21");
        assert_eq!(
            proxies,
            vec![
                Proxy::new(ProxyProtocol::Http, "h1", 8000).with_credentials("user", "pass"),
                Proxy::new(ProxyProtocol::Https, "h2", 8443),
            ]
        );
    }

    #[test]
    fn test_file_takes_priority_over_env_list() {
        let file = temp_proxy_file(EXPORT_SAMPLE);
        let loaded = load_proxies(&config_with(file.path().to_path_buf(), Some("http://9.9.9.9:9999")));
        assert_eq!(loaded.origin, ProxyOrigin::File);
        assert_eq!(loaded.proxies.len(), 2);
    }

    #[test]
    fn test_env_list_used_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("proxies.json");
        let loaded = load_proxies(&config_with(missing, Some("http://9.9.9.9:9999")));
        assert_eq!(loaded.origin, ProxyOrigin::EnvList);
        assert_eq!(loaded.proxies, vec![Proxy::new(ProxyProtocol::Http, "9.9.9.9", 9999)]);
    }

    #[test]
    fn test_env_list_used_when_file_yields_nothing() {
        let file = temp_proxy_file(r#"[{"ip": "1.1.1.1"}]"#);
        let loaded = load_proxies(&config_with(file.path().to_path_buf(), Some("http://9.9.9.9:9999")));
        assert_eq!(loaded.origin, ProxyOrigin::EnvList);
    }

    #[test]
    fn test_env_list_used_when_file_is_corrupt() {
        let file = temp_proxy_file("{{{");
        let loaded = load_proxies(&config_with(file.path().to_path_buf(), Some("http://9.9.9.9:9999")));
        assert_eq!(loaded.origin, ProxyOrigin::EnvList);
    }

    #[test]
    fn test_nothing_configured_means_direct_mode() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_proxies(&config_with(dir.path().join("none.json"), None));
        assert_eq!(loaded.origin, ProxyOrigin::None);
        assert!(loaded.proxies.is_empty());

        let loaded = load_proxies(&config_with(dir.path().join("none.json"), Some("garbage")));
        assert_eq!(loaded.origin, ProxyOrigin::None);
    }

    #[test]
    fn test_duplicate_identities_keep_first() {
        let proxies = parse_proxy_list("http://h1:80,https://u:p@h1:80,http://h2:80");
        let deduped = dedup_by_identity(proxies);
        assert_eq!(
            deduped,
            vec![
                Proxy::new(ProxyProtocol::Http, "h1", 80),
                Proxy::new(ProxyProtocol::Http, "h2", 80),
            ]
        );
    }
}
