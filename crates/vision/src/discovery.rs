//! Camera Discovery (C3): best-effort CIDR scan that fingerprints responsive
//! hosts against `vendor::VENDOR_PROFILES`, grounded on the original
//! `camera_integration_manager.py`'s `SmartCameraDetector.scan_network`.

use crate::vendor::{all_candidate_ports, VendorProfile, VENDOR_PROFILES};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;

const DEFAULT_WORKER_POOL: usize = 20;
const PER_HOST_DEADLINE: Duration = Duration::from_secs(2);
const MIN_EMIT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredCamera {
    pub ip_address: String,
    pub vendor_key: String,
    pub vendor_name: String,
    pub confidence: f32,
    pub suggested_rtsp_url: String,
    pub suggested_http_url: String,
    pub open_ports: Vec<u16>,
}

/// Enumerates every host address in `cidr` except the network and broadcast
/// addresses (for a /31 or /32 this returns the single usable address).
pub fn hosts_in_cidr(cidr: &str) -> Result<Vec<Ipv4Addr>, sentinel_core::Error> {
    let (base, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| sentinel_core::Error::new(sentinel_core::ErrorCode::ValidationFailed, "expected CIDR notation, e.g. 192.168.1.0/24"))?;
    let base: Ipv4Addr = base
        .parse()
        .map_err(|_| sentinel_core::Error::new(sentinel_core::ErrorCode::ValidationFailed, "invalid IPv4 address"))?;
    let prefix: u32 = prefix
        .parse()
        .map_err(|_| sentinel_core::Error::new(sentinel_core::ErrorCode::ValidationFailed, "invalid CIDR prefix"))?;
    if prefix > 32 {
        return Err(sentinel_core::Error::new(sentinel_core::ErrorCode::ValidationFailed, "CIDR prefix must be 0-32"));
    }

    let base_u32 = u32::from(base);
    let host_bits = 32 - prefix;
    let mask = if host_bits == 32 { 0 } else { !0u32 << host_bits };
    let network = base_u32 & mask;
    let broadcast = network | !mask;

    if host_bits == 0 {
        return Ok(vec![base]);
    }
    if host_bits == 1 {
        return Ok((network..=broadcast).map(Ipv4Addr::from).collect());
    }

    Ok(((network + 1)..broadcast).map(Ipv4Addr::from).collect())
}

/// Scans `cidr`, probing each host on the cataloged vendor ports with a
/// bounded worker pool, and returns one candidate per responsive host.
pub async fn scan(cidr: &str, worker_pool: Option<usize>) -> Result<Vec<DiscoveredCamera>, sentinel_core::Error> {
    let hosts = hosts_in_cidr(cidr)?;
    let semaphore = std::sync::Arc::new(Semaphore::new(worker_pool.unwrap_or(DEFAULT_WORKER_POOL)));
    let client = reqwest::Client::builder().timeout(Duration::from_millis(800)).build().unwrap_or_default();

    let mut handles = Vec::with_capacity(hosts.len());
    for host in hosts {
        let semaphore = semaphore.clone();
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.ok()?;
            timeout(PER_HOST_DEADLINE, probe_host(host, &client)).await.ok().flatten()
        }));
    }

    let mut found = Vec::new();
    for handle in handles {
        if let Ok(Some(candidate)) = handle.await {
            found.push(candidate);
        }
    }
    Ok(found)
}

async fn probe_host(host: Ipv4Addr, client: &reqwest::Client) -> Option<DiscoveredCamera> {
    let mut open_ports = Vec::new();
    for &port in all_candidate_ports().iter() {
        if tcp_reachable(host, port).await {
            open_ports.push(port);
        }
    }
    if open_ports.is_empty() {
        return None;
    }

    let mut best: Option<(&VendorProfile, f32)> = None;
    for profile in VENDOR_PROFILES {
        let confidence = fingerprint_confidence(profile, host, &open_ports, client).await;
        if confidence < MIN_EMIT_CONFIDENCE {
            continue;
        }
        let replace = match best {
            None => true,
            Some((best_profile, best_conf)) => {
                confidence > best_conf || (confidence == best_conf && profile.specificity() > best_profile.specificity())
            }
        };
        if replace {
            best = Some((profile, confidence));
        }
    }

    let (profile, confidence) = best?;
    let ip = host.to_string();
    Some(DiscoveredCamera {
        ip_address: ip.clone(),
        vendor_key: profile.key.to_string(),
        vendor_name: profile.name.to_string(),
        confidence,
        suggested_rtsp_url: profile.default_rtsp_url(&ip),
        suggested_http_url: profile.default_http_url(&ip),
        open_ports,
    })
}

async fn tcp_reachable(host: Ipv4Addr, port: u16) -> bool {
    timeout(Duration::from_millis(400), TcpStream::connect((IpAddr::V4(host), port))).await.map(|r| r.is_ok()).unwrap_or(false)
}

/// §4.3's confidence model: header/body vendor match 0.9, port + generic
/// path reachable 0.7, port-only reachable 0.5.
async fn fingerprint_confidence(profile: &VendorProfile, host: Ipv4Addr, open_ports: &[u16], client: &reqwest::Client) -> f32 {
    let matches_port = profile.ports.iter().any(|p| open_ports.contains(p));
    if !matches_port {
        return 0.0;
    }

    for &port in open_ports {
        if !profile.ports.contains(&port) {
            continue;
        }
        for path in profile.paths {
            let url = format!("http://{host}:{port}{path}");
            let Ok(resp) = client.get(&url).send().await else { continue };
            let headers_joined: String = resp
                .headers()
                .iter()
                .filter_map(|(_, v)| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(" ");
            if profile.header_substrings.iter().any(|s| headers_joined.contains(s)) {
                return 0.9;
            }
            if let Ok(body) = resp.text().await {
                let body_lower = body.to_lowercase();
                if profile.body_substrings.iter().any(|s| body_lower.contains(&s.to_lowercase())) {
                    return 0.9;
                }
                return 0.7;
            }
        }
    }

    0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_24_excludes_network_and_broadcast() {
        let hosts = hosts_in_cidr("192.168.1.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 0)));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 255)));
    }

    #[test]
    fn slash_30_excludes_network_and_broadcast() {
        let hosts = hosts_in_cidr("10.0.0.0/30").unwrap();
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn rejects_malformed_cidr() {
        assert!(hosts_in_cidr("not-a-cidr").is_err());
        assert!(hosts_in_cidr("10.0.0.0/33").is_err());
    }
}
