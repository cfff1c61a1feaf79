//! Proxy management for outbound extraction requests
//!
//! Provides:
//! - Proxy descriptors and URL parsing (`types`)
//! - One-shot loading from the proxy file or PROXY_LIST (`source`)
//! - Round-robin rotation with transient failure marks (`pool`)

pub mod pool;
pub mod source;
pub mod types;

pub use pool::ProxyPool;
pub use source::{load_proxies, parse_proxy_file, parse_proxy_list, LoadedProxies, ProxyOrigin};
pub use types::{Proxy, ProxyCredentials, ProxyProtocol};
