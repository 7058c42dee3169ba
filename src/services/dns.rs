//! DNS policy for all outbound HTTP traffic.
//!
//! Names are looked up on a fixed list of public resolvers first; the OS
//! resolver is the last resort. Installed once on the shared `reqwest::Client`.

use std::net::{IpAddr, SocketAddr};

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

/// Port for plain DNS over UDP/TCP.
const DNS_PORT: u16 = 53;

/// Resolver that prefers explicit public DNS servers over the system resolver.
#[derive(Clone)]
pub struct FallbackResolver {
    public: Option<TokioAsyncResolver>,
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("public", &self.public.is_some())
            .finish()
    }
}

impl FallbackResolver {
    /// Build a resolver over `servers`. An empty list resolves through the OS only.
    pub fn new(servers: &[IpAddr]) -> Self {
        if servers.is_empty() {
            return Self { public: None };
        }

        let group = NameServerConfigGroup::from_ips_clear(servers, DNS_PORT, true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let mut opts = ResolverOpts::default();
        opts.timeout = std::time::Duration::from_secs(2);
        opts.attempts = 1;

        Self {
            public: Some(TokioAsyncResolver::tokio(config, opts)),
        }
    }

    async fn lookup(&self, host: &str) -> Result<Vec<SocketAddr>, std::io::Error> {
        if let Some(public) = &self.public {
            match public.lookup_ip(host).await {
                Ok(lookup) => {
                    let addrs: Vec<SocketAddr> =
                        lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
                    if !addrs.is_empty() {
                        return Ok(addrs);
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        "Public DNS lookup for {} failed, using system resolver: {}",
                        host,
                        e
                    );
                }
            }
        }

        Ok(tokio::net::lookup_host((host, 0)).await?.collect())
    }
}

impl Resolve for FallbackResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let addrs = resolver.lookup(name.as_str()).await?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}
