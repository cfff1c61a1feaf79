//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the extraction/proxy configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::config::Config as AppConfig;
use crate::proxy::{LoadedProxies, ProxyOrigin};

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Maximum level written to both sinks
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Initialize a terminal-only logger
pub fn init_terminal_logger(level: LevelFilter) -> Result<()> {
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))
}

/// Logs the extraction endpoint and proxy pool state at startup
pub fn log_extraction_configuration(config: &AppConfig, loaded: &LoadedProxies) {
    match config.api_endpoint.as_deref() {
        Some(endpoint) => log::info!("✅ API_ENDPOINT: {}", endpoint),
        None => log::error!("❌ API_ENDPOINT is not set - every extraction will fail"),
    }
    log::info!("⏱  Extraction timeout: {} ms", config.request_timeout.as_millis());

    match loaded.origin {
        ProxyOrigin::File => log::info!(
            "✅ Loaded {} proxies from {}",
            loaded.proxies.len(),
            config.proxy_file.display()
        ),
        ProxyOrigin::EnvList => log::info!("✅ Loaded {} static proxies from PROXY_LIST", loaded.proxies.len()),
        ProxyOrigin::None => log::info!("ℹ️  No proxies configured - using direct connection"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_init_logger_creates_log_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        // A logger may already be installed by another test in this binary,
        // so only the file side effect is asserted.
        let _ = init_logger(path, LevelFilter::Info);
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = init_logger("/nonexistent-dir/for/sure/app.log", LevelFilter::Info);
        assert!(result.is_err());
    }
}
