use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DnsCacheEntry {
    ip_address: IpAddr,
    expires_at: Instant,
}

impl DnsCacheEntry {
    pub fn new(ip_address: IpAddr, ttl: Duration) -> Self {
        Self {
            ip_address,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn ip_address(&self) -> IpAddr {
        self.ip_address
    }
}

/// Resolved target addresses, reused until their TTL runs out.
#[derive(Debug)]
pub struct DnsCache {
    ttl: Duration,
    entries: HashMap<String, DnsCacheEntry>,
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, hostname: String, ip_address: IpAddr) {
        self.entries
            .insert(hostname, DnsCacheEntry::new(ip_address, self.ttl));
    }

    pub fn get_valid_ip(&self, hostname: &str) -> Option<IpAddr> {
        self.entries
            .get(hostname)
            .filter(|entry| !entry.is_expired())
            .map(DnsCacheEntry::ip_address)
    }

    pub fn evict_expired(&mut self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = DnsCache::new(Duration::from_secs(60));
        cache.insert("example.com".to_string(), localhost());
        assert_eq!(cache.get_valid_ip("example.com"), Some(localhost()));
        assert_eq!(cache.get_valid_ip("other.com"), None);
    }

    #[test]
    fn zero_ttl_entries_expire_immediately() {
        let mut cache = DnsCache::new(Duration::ZERO);
        cache.insert("example.com".to_string(), localhost());
        assert_eq!(cache.get_valid_ip("example.com"), None);
        cache.evict_expired();
        assert!(cache.is_empty());
    }
}
