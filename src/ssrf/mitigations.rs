//! The eight protected SSRF routes, each a single check run before the
//! outbound request.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::SsrfConfig;
use crate::mitigation::Rejection;
use crate::ssrf::models::{FetchRequest, HttpMethod};
use crate::ssrf::network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protection {
    Blocklist,
    Allowlist,
    DomainValidation,
    IpBlock,
    Timeout,
    SchemeFilter,
    HeaderSanitization,
    MethodRestriction,
}

impl Protection {
    pub const ALL: [Protection; 8] = [
        Protection::Blocklist,
        Protection::Allowlist,
        Protection::DomainValidation,
        Protection::IpBlock,
        Protection::Timeout,
        Protection::SchemeFilter,
        Protection::HeaderSanitization,
        Protection::MethodRestriction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protection::Blocklist => "blocklist",
            Protection::Allowlist => "allowlist",
            Protection::DomainValidation => "domain-validation",
            Protection::IpBlock => "ip-block",
            Protection::Timeout => "timeout",
            Protection::SchemeFilter => "scheme-filter",
            Protection::HeaderSanitization => "header-sanitization",
            Protection::MethodRestriction => "method-restriction",
        }
    }

    pub fn path(&self) -> String {
        format!("/protected/{}", self.as_str())
    }
}

/// What the primitive is asked to send.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl Outbound {
    /// The request exactly as the client described it.
    pub fn unchecked(request: &FetchRequest) -> Self {
        Self {
            url: request.url.clone(),
            method: request.method,
            headers: request.headers.clone().unwrap_or_default(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SsrfPolicy {
    blocklist: Vec<String>,
    allowed_domains: Vec<String>,
    allowed_schemes: Vec<String>,
    sensitive_headers: Vec<String>,
    timeout: Duration,
}

impl SsrfPolicy {
    pub fn new(config: &SsrfConfig) -> Self {
        Self {
            blocklist: config.blocklist.iter().map(|h| h.to_ascii_lowercase()).collect(),
            allowed_domains: config.allowed_domains.iter().map(|h| h.to_ascii_lowercase()).collect(),
            allowed_schemes: config.allowed_schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
            sensitive_headers: config.sensitive_headers.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `protection` against the request. Rejections carry a
    /// `Blocked: ...` reason.
    pub async fn check(
        &self,
        protection: Protection,
        request: &FetchRequest,
    ) -> Result<Outbound, Rejection> {
        let name = protection.as_str();
        let mut outbound = Outbound::unchecked(request);

        match protection {
            Protection::Blocklist => {
                let Some((host, port)) = host_of(&request.url) else {
                    return Ok(outbound);
                };
                if self.blocklist.contains(&host) {
                    return Err(Rejection::new(name, "Blocked: Domain in blocklist"));
                }
                if let Ok(addresses) = network::resolve(&host, port).await {
                    if addresses.first().is_some_and(|ip| network::is_private(*ip)) {
                        return Err(Rejection::new(name, "Blocked: Private IP range"));
                    }
                }
            }
            Protection::Allowlist => {
                let allowed = host_of(&request.url)
                    .is_some_and(|(host, _)| self.allowed_domains.contains(&host));
                if !allowed {
                    return Err(Rejection::new(name, "Blocked: Domain not in allowlist"));
                }
            }
            Protection::DomainValidation => {
                let Some((host, port)) = host_of(&request.url) else {
                    return Ok(outbound);
                };
                if let Ok(addresses) = network::resolve(&host, port).await {
                    judge_resolution(&addresses).map_err(|reason| Rejection::new(name, reason))?;
                }
            }
            Protection::IpBlock => {
                let Some((host, port)) = host_of(&request.url) else {
                    return Ok(outbound);
                };
                if let Ok(addresses) = network::resolve(&host, port).await {
                    if addresses
                        .first()
                        .is_some_and(|ip| self.blocklist.contains(&ip.to_string()))
                    {
                        return Err(Rejection::new(name, "Blocked: IP in blocklist"));
                    }
                }
            }
            Protection::Timeout => {
                outbound.timeout = Some(self.timeout);
            }
            Protection::SchemeFilter => {
                let scheme = Url::parse(&request.url)
                    .map(|url| url.scheme().to_string())
                    .unwrap_or_default();
                if !self.allowed_schemes.contains(&scheme) {
                    return Err(Rejection::new(name, format!("Blocked: Scheme {} not allowed", scheme)));
                }
            }
            Protection::HeaderSanitization => {
                outbound.headers = self.sanitize_headers(outbound.headers);
            }
            Protection::MethodRestriction => {
                if request.method != HttpMethod::Get {
                    return Err(Rejection::new(name, "Blocked: Only GET method allowed"));
                }
            }
        }

        Ok(outbound)
    }

    /// Drop every configured sensitive header, compared case-insensitively.
    pub fn sanitize_headers(&self, headers: HashMap<String, String>) -> HashMap<String, String> {
        headers
            .into_iter()
            .filter(|(name, _)| {
                !self
                    .sensitive_headers
                    .iter()
                    .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
            })
            .collect()
    }
}

/// Lowercased host and effective port of a URL.
fn host_of(raw: &str) -> Option<(String, u16)> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let port = url.port_or_known_default().unwrap_or(80);
    Some((host, port))
}

/// Verdict of the domain-validation route on the distinct addresses a host
/// resolved to. More than one address is treated as a rebinding attempt.
pub fn judge_resolution(addresses: &[IpAddr]) -> Result<(), &'static str> {
    if addresses.len() > 1 {
        return Err("Blocked: DNS rebinding detected");
    }
    if addresses.first().is_some_and(|ip| network::is_private(*ip)) {
        return Err("Blocked: Private IP address");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SsrfPolicy {
        SsrfPolicy::new(&SsrfConfig::default())
    }

    fn request(url: &str, method: HttpMethod) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            method,
            headers: None,
        }
    }

    async fn reason(protection: Protection, url: &str) -> String {
        policy()
            .check(protection, &request(url, HttpMethod::Get))
            .await
            .unwrap_err()
            .reason
    }

    #[test]
    fn test_routes_cover_every_protection() {
        let paths: Vec<String> = Protection::ALL.iter().map(|p| p.path()).collect();
        assert_eq!(paths.len(), 8);
        assert!(paths.contains(&"/protected/domain-validation".to_string()));
    }

    #[tokio::test]
    async fn test_blocklist() {
        assert_eq!(reason(Protection::Blocklist, "http://localhost/").await, "Blocked: Domain in blocklist");
        assert_eq!(reason(Protection::Blocklist, "http://127.0.0.1:8080/x").await, "Blocked: Domain in blocklist");
        assert_eq!(reason(Protection::Blocklist, "http://169.254.169.254/").await, "Blocked: Private IP range");
        assert_eq!(reason(Protection::Blocklist, "http://10.1.2.3/").await, "Blocked: Private IP range");
    }

    #[tokio::test]
    async fn test_allowlist_ignores_method() {
        let p = policy();
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Head] {
            let err = p.check(Protection::Allowlist, &request("http://evil.test/", method)).await.unwrap_err();
            assert_eq!(err.reason, "Blocked: Domain not in allowlist");
        }
        assert!(p.check(Protection::Allowlist, &request("https://example.com/a", HttpMethod::Get)).await.is_ok());
        assert!(p.check(Protection::Allowlist, &request("not a url", HttpMethod::Get)).await.is_err());
    }

    #[test]
    fn test_judge_resolution() {
        let public: IpAddr = "93.184.216.34".parse().unwrap();
        let other: IpAddr = "93.184.216.35".parse().unwrap();
        let private: IpAddr = "10.0.0.7".parse().unwrap();

        assert_eq!(judge_resolution(&[public, other]), Err("Blocked: DNS rebinding detected"));
        assert_eq!(judge_resolution(&[public, private]), Err("Blocked: DNS rebinding detected"));
        assert_eq!(judge_resolution(&[private]), Err("Blocked: Private IP address"));
        assert_eq!(judge_resolution(&[public]), Ok(()));
        assert_eq!(judge_resolution(&[]), Ok(()));
    }

    #[tokio::test]
    async fn test_domain_validation_blocks_private_literal() {
        assert_eq!(
            reason(Protection::DomainValidation, "http://192.168.0.10/").await,
            "Blocked: Private IP address"
        );
    }

    #[tokio::test]
    async fn test_ip_block() {
        assert_eq!(reason(Protection::IpBlock, "http://127.0.0.1/").await, "Blocked: IP in blocklist");
        assert!(policy()
            .check(Protection::IpBlock, &request("http://10.0.0.1/", HttpMethod::Get))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_scheme_filter() {
        assert_eq!(reason(Protection::SchemeFilter, "file:///etc/passwd").await, "Blocked: Scheme file not allowed");
        assert_eq!(reason(Protection::SchemeFilter, "gopher://x/").await, "Blocked: Scheme gopher not allowed");
    }

    #[tokio::test]
    async fn test_method_restriction() {
        let err = policy()
            .check(Protection::MethodRestriction, &request("http://x/", HttpMethod::Post))
            .await
            .unwrap_err();
        assert_eq!(err.reason, "Blocked: Only GET method allowed");
    }

    #[tokio::test]
    async fn test_header_sanitization_and_timeout() {
        let p = policy();
        let mut req = request("http://x/", HttpMethod::Get);
        req.headers = Some(HashMap::from([
            ("cookie".to_string(), "a=b".to_string()),
            ("Authorization".to_string(), "Bearer t".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
        ]));
        let outbound = p.check(Protection::HeaderSanitization, &req).await.unwrap();
        assert_eq!(outbound.headers.len(), 1);
        assert!(outbound.headers.contains_key("Accept"));
        assert!(outbound.timeout.is_none());

        let outbound = p.check(Protection::Timeout, &req).await.unwrap();
        assert_eq!(outbound.timeout, Some(Duration::from_secs(5)));
    }
}
