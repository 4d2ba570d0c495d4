use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::BehaviorConfig;
use crate::dns_cache::DnsCache;
use crate::error::ProbeError;
use crate::ping::ProbeOutcome;
use crate::status::IpStatus;

/// Issues one probe and reports its outcome.
///
/// Cancellation is honoured best-effort; an issuer that gives up because of
/// it returns [`ProbeError::Cancelled`] rather than a partial outcome.
#[async_trait]
pub trait ProbeIssuer: Send + Sync {
    async fn issue(
        &self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeOutcome, ProbeError>;
}

/// Reduce user input to a name `lookup_host` can take: any `:port` suffix is
/// dropped and only alphanumerics, dots and hyphens are kept.
fn lookup_name(target: &str) -> Option<String> {
    let host = target.split_once(':').map_or(target, |(host, _)| host);
    let name: String = host
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-'))
        .collect();
    (!name.is_empty()).then_some(name)
}

/// ICMP echo issuer backed by `surge-ping`.
pub struct IcmpProbeIssuer {
    timeout: Duration,
    payload: Vec<u8>,
    identifier: u16,
    sequence: AtomicU16,
    dns_cache: Mutex<DnsCache>,
}

impl IcmpProbeIssuer {
    pub fn new(behavior: &BehaviorConfig) -> Self {
        Self {
            timeout: behavior.probe_timeout(),
            payload: vec![0; behavior.packet_size],
            identifier: std::process::id() as u16,
            sequence: AtomicU16::new(0),
            dns_cache: Mutex::new(DnsCache::new(Duration::from_secs(behavior.dns_ttl_secs))),
        }
    }

    /// Resolve the target, reusing a cached address while it is fresh.
    async fn resolve_target(&self, target: &str) -> Result<IpAddr, ProbeError> {
        // Try parsing as IP address first
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ip);
        }

        let mut cache = self.dns_cache.lock().await;
        cache.evict_expired();
        if let Some(ip) = cache.get_valid_ip(target) {
            return Ok(ip);
        }

        let not_found = || ProbeError::Resolve {
            target: target.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        };
        let name = lookup_name(target).ok_or_else(not_found)?;
        let ip = tokio::net::lookup_host(format!("{name}:0"))
            .await
            .map_err(|source| ProbeError::Resolve {
                target: target.to_string(),
                source,
            })?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(not_found)?;

        log::debug!("Resolved {target} to {ip}");
        cache.insert(target.to_string(), ip);
        Ok(ip)
    }
}

#[async_trait]
impl ProbeIssuer for IcmpProbeIssuer {
    async fn issue(
        &self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<ProbeOutcome, ProbeError> {
        let issued_at = Utc::now();
        let target_ip = self.resolve_target(target).await?;

        let client = match target_ip {
            IpAddr::V4(_) => Client::new(&Config::default())?,
            IpAddr::V6(_) => Client::new(&Config::builder().kind(ICMP::V6).build())?,
        };
        let mut pinger = client.pinger(target_ip, PingIdentifier(self.identifier)).await;
        pinger.timeout(self.timeout);

        let sequence = PingSequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        let result = tokio::select! {
            result = pinger.ping(sequence, &self.payload) => result,
            _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
        };

        match result {
            Ok((_, duration)) => {
                let round_trip_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                Ok(ProbeOutcome::success(target_ip, issued_at, round_trip_ms))
            }
            Err(SurgeError::Timeout { .. }) => Ok(ProbeOutcome::failure(
                target_ip,
                issued_at,
                IpStatus::TimedOut,
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_name_drops_ports_and_junk() {
        assert_eq!(lookup_name("example.com:8080"), Some("example.com".to_string()));
        assert_eq!(lookup_name("exa mple.com"), Some("example.com".to_string()));
        assert_eq!(lookup_name("!!"), None);
    }

    #[tokio::test]
    async fn ip_literals_skip_resolution() {
        let issuer = IcmpProbeIssuer::new(&BehaviorConfig::default());
        let ip = issuer.resolve_target("127.0.0.1").await.unwrap();
        assert_eq!(ip, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert!(issuer.dns_cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unusable_hostname_is_a_resolve_error() {
        let issuer = IcmpProbeIssuer::new(&BehaviorConfig::default());
        let err = issuer.resolve_target("!!!").await.unwrap_err();
        assert!(matches!(err, ProbeError::Resolve { .. }));
    }
}
