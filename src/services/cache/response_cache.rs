//! In-memory server-side response cache.
//!
//! Only responses that opt in with `Cache-Control: public` are stored. Entries
//! are keyed by method + path + query, then by the request values of the
//! headers the response names in `Vary`.
//!
//! Requests carrying any credential never read or write the cache: tokens can
//! arrive in the query string, an `access_token` header or cookie, not only in
//! `Authorization`, and a per-user response must never be replayed to someone
//! else.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::Response;
use dashmap::DashMap;

use crate::config::ResponseCacheConfig;

/// Freshness used when a public response names no lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Parsed `Cache-Control` directives (request or response side).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheControl {
    pub public: bool,
    pub private: bool,
    pub no_cache: bool,
    pub no_store: bool,
    pub only_if_cached: bool,
    pub max_age: Option<u64>,
    pub s_maxage: Option<u64>,
}

impl CacheControl {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cc = Self::default();
        let directives = headers
            .get_all(header::CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','));

        for directive in directives {
            let (name, value) = match directive.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (directive.trim(), None),
            };
            match name.to_ascii_lowercase().as_str() {
                "public" => cc.public = true,
                "private" => cc.private = true,
                "no-cache" => cc.no_cache = true,
                "no-store" => cc.no_store = true,
                "only-if-cached" => cc.only_if_cached = true,
                "max-age" => cc.max_age = value.and_then(|v| v.parse().ok()),
                "s-maxage" => cc.s_maxage = value.and_then(|v| v.parse().ok()),
                _ => {}
            }
        }
        cc
    }

    /// Whether a request with these directives may be answered from the cache.
    pub fn allows_cached_answer(&self, headers: &HeaderMap) -> bool {
        !self.no_cache && self.max_age != Some(0) && !pragma_no_cache(headers)
    }
}

fn pragma_no_cache(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::PRAGMA)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("no-cache"))
}

/// Request-side eligibility: safe method, no credentials, no `no-store`.
pub fn request_is_cacheable(method: &Method, headers: &HeaderMap, has_credential: bool) -> bool {
    if method != Method::GET && method != Method::HEAD {
        return false;
    }
    if has_credential || headers.contains_key(header::AUTHORIZATION) {
        return false;
    }
    !CacheControl::from_headers(headers).no_store
}

/// Response-side eligibility. Returns the freshness lifetime when storable.
pub fn storable_ttl(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::OK || headers.contains_key(header::SET_COOKIE) {
        return None;
    }
    let cc = CacheControl::from_headers(headers);
    if !cc.public || cc.private || cc.no_store || cc.no_cache {
        return None;
    }
    if vary_headers(headers).is_none() {
        return None;
    }
    let ttl = cc
        .s_maxage
        .or(cc.max_age)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TTL);
    (!ttl.is_zero()).then_some(ttl)
}

/// Header names listed in `Vary`. `None` for `Vary: *` (never cacheable).
fn vary_headers(headers: &HeaderMap) -> Option<Vec<HeaderName>> {
    let mut names = Vec::new();
    for value in headers.get_all(header::VARY).iter() {
        let Ok(value) = value.to_str() else { continue };
        for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name == "*" {
                return None;
            }
            if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Some(names)
}

#[derive(Debug, Clone)]
struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
    ttl: Duration,
    base: String,
    // bytes counted against the size limit
    charge: usize,
}

/// `Vary` names recorded for one method + path + query, and how many stored
/// variants still use it.
#[derive(Debug, Clone)]
struct VaryRule {
    names: Vec<HeaderName>,
    variants: usize,
}

fn header_bytes(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum()
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }

    fn to_response(&self, now: Instant) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();

        let age = now.saturating_duration_since(self.stored_at).as_secs();
        if let Ok(age) = HeaderValue::from_str(&age.to_string()) {
            response.headers_mut().insert(header::AGE, age);
        }
        response
    }
}

#[derive(Debug)]
pub struct ResponseCache {
    config: ResponseCacheConfig,
    vary_rules: DashMap<String, VaryRule>,
    entries: DashMap<String, CachedResponse>,
    size: AtomicUsize,
}

impl ResponseCache {
    pub fn new(config: ResponseCacheConfig) -> Self {
        Self {
            config,
            vary_rules: DashMap::new(),
            entries: DashMap::new(),
            size: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently charged: cache keys, stored headers and bodies.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    fn base_key(method: &Method, uri: &Uri) -> String {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        format!("{}\u{1f}{}", method, path_and_query)
    }

    fn variant_key(base: &str, rules: &[HeaderName], headers: &HeaderMap) -> String {
        let mut key = base.to_string();
        for name in rules {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            key.push('\u{1e}');
            key.push_str(name.as_str());
            key.push('=');
            key.push_str(&values.join(","));
        }
        key
    }

    /// Serve a fresh stored response, if any. Stale entries are dropped.
    pub fn lookup(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        now: Instant,
    ) -> Option<Response> {
        let base = Self::base_key(method, uri);
        let rules = self.vary_rules.get(&base)?.names.clone();
        let key = Self::variant_key(&base, &rules, headers);

        let response = {
            let entry = self.entries.get(&key)?;
            entry.is_fresh(now).then(|| entry.to_response(now))
        };
        if response.is_none() {
            self.remove(&key);
        }
        response
    }

    /// Store a response body. Returns whether it was kept.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        method: &Method,
        uri: &Uri,
        request_headers: &HeaderMap,
        status: StatusCode,
        response_headers: &HeaderMap,
        body: Bytes,
        now: Instant,
    ) -> bool {
        let Some(ttl) = storable_ttl(status, response_headers) else {
            return false;
        };
        let Some(rules) = vary_headers(response_headers) else {
            return false;
        };
        if body.len() > self.config.max_body_bytes {
            return false;
        }

        let base = Self::base_key(method, uri);
        let key = Self::variant_key(&base, &rules, request_headers);
        self.remove(&key);

        let mut headers = response_headers.clone();
        headers.remove(header::AGE);
        let charge = key.len() + header_bytes(&headers) + body.len();

        if !self.reserve(charge) {
            self.purge_expired(now);
            if !self.reserve(charge) {
                tracing::debug!(key = %base, "response cache full, not storing");
                return false;
            }
        }

        self.vary_rules
            .entry(base.clone())
            .and_modify(|rule| {
                rule.names = rules.clone();
                rule.variants += 1;
            })
            .or_insert_with(|| VaryRule {
                names: rules,
                variants: 1,
            });

        let replaced = self.entries.insert(
            key,
            CachedResponse {
                status,
                headers,
                body,
                stored_at: now,
                ttl,
                base,
                charge,
            },
        );
        // a concurrent store of the same variant won the race
        if let Some(old) = replaced {
            self.release(&old);
        }
        true
    }

    /// Claim `bytes` of the size budget, or leave it untouched when they do
    /// not fit.
    fn reserve(&self, bytes: usize) -> bool {
        let limit = self.config.size_limit_bytes;
        self.size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(bytes).filter(|total| *total <= limit)
            })
            .is_ok()
    }

    fn remove(&self, key: &str) {
        if let Some((_, old)) = self.entries.remove(key) {
            self.release(&old);
        }
    }

    /// Return an evicted entry's bytes and forget its `Vary` rule once no
    /// variant uses it.
    fn release(&self, old: &CachedResponse) {
        self.size.fetch_sub(old.charge, Ordering::AcqRel);
        if let Some(mut rule) = self.vary_rules.get_mut(&old.base) {
            rule.variants = rule.variants.saturating_sub(1);
        }
        self.vary_rules.remove_if(&old.base, |_, rule| rule.variants == 0);
    }

    /// Drop every stale entry.
    pub fn purge_expired(&self, now: Instant) {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_fresh(now))
            .map(|entry| entry.key().clone())
            .collect();
        for key in stale {
            self.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn cache() -> ResponseCache {
        ResponseCache::new(ResponseCacheConfig::default())
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn parses_cache_control() {
        let cc = CacheControl::from_headers(&response_headers(&[(
            "cache-control",
            "public, max-age=60, s-maxage=\"120\"",
        )]));
        assert!(cc.public);
        assert_eq!(cc.max_age, Some(60));
        assert_eq!(cc.s_maxage, Some(120));
    }

    #[test]
    fn only_public_ok_responses_are_storable() {
        let public = response_headers(&[("cache-control", "public, max-age=30")]);
        assert_eq!(
            storable_ttl(StatusCode::OK, &public),
            Some(Duration::from_secs(30))
        );
        assert_eq!(storable_ttl(StatusCode::NOT_FOUND, &public), None);

        let private = response_headers(&[("cache-control", "private, max-age=30")]);
        assert_eq!(storable_ttl(StatusCode::OK, &private), None);

        let cookie = response_headers(&[
            ("cache-control", "public, max-age=30"),
            ("set-cookie", "a=b"),
        ]);
        assert_eq!(storable_ttl(StatusCode::OK, &cookie), None);

        let vary_all = response_headers(&[("cache-control", "public"), ("vary", "*")]);
        assert_eq!(storable_ttl(StatusCode::OK, &vary_all), None);

        let default_ttl = response_headers(&[("cache-control", "public")]);
        assert_eq!(storable_ttl(StatusCode::OK, &default_ttl), Some(DEFAULT_TTL));
    }

    #[test]
    fn requests_with_credentials_bypass_the_cache() {
        let empty = HeaderMap::new();
        assert!(request_is_cacheable(&Method::GET, &empty, false));
        assert!(!request_is_cacheable(&Method::GET, &empty, true));
        assert!(!request_is_cacheable(&Method::POST, &empty, false));

        let auth = response_headers(&[("authorization", "Bearer x")]);
        assert!(!request_is_cacheable(&Method::GET, &auth, false));

        let no_store = response_headers(&[("cache-control", "no-store")]);
        assert!(!request_is_cacheable(&Method::GET, &no_store, false));
    }

    #[test]
    fn stores_and_serves_until_expiry() {
        let cache = cache();
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=60")]);

        assert!(cache.store(
            &Method::GET,
            &uri("/api/v1/version"),
            &HeaderMap::new(),
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"{}"),
            now,
        ));
        // key (19) + cache-control header (31) + body (2)
        assert_eq!(cache.size(), 52);

        let later = now + Duration::from_secs(5);
        let hit = cache
            .lookup(&Method::GET, &uri("/api/v1/version"), &HeaderMap::new(), later)
            .unwrap();
        assert_eq!(hit.headers()[header::AGE], "5");

        assert!(
            cache
                .lookup(&Method::GET, &uri("/api/v1/version?x=1"), &HeaderMap::new(), later)
                .is_none()
        );
        assert!(
            cache
                .lookup(&Method::HEAD, &uri("/api/v1/version"), &HeaderMap::new(), later)
                .is_none()
        );

        let expired = now + Duration::from_secs(61);
        assert!(
            cache
                .lookup(&Method::GET, &uri("/api/v1/version"), &HeaderMap::new(), expired)
                .is_none()
        );
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn vary_headers_split_entries() {
        let cache = cache();
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public"), ("vary", "Accept-Language")]);
        let en = response_headers(&[("accept-language", "en")]);
        let fr = response_headers(&[("accept-language", "fr")]);

        cache.store(
            &Method::GET,
            &uri("/greeting"),
            &en,
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"hello"),
            now,
        );

        assert!(cache.lookup(&Method::GET, &uri("/greeting"), &en, now).is_some());
        assert!(cache.lookup(&Method::GET, &uri("/greeting"), &fr, now).is_none());
    }

    #[test]
    fn size_limits_are_enforced() {
        let cache = ResponseCache::new(ResponseCacheConfig {
            enabled: true,
            max_body_bytes: 4,
            // one entry below is charged 40 bytes: key, headers and body
            size_limit_bytes: 60,
        });
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=1")]);
        let empty = HeaderMap::new();

        assert!(!cache.store(
            &Method::GET,
            &uri("/big"),
            &empty,
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"12345"),
            now,
        ));
        assert!(cache.store(
            &Method::GET,
            &uri("/a"),
            &empty,
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"1234"),
            now,
        ));
        assert!(!cache.store(
            &Method::GET,
            &uri("/b"),
            &empty,
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"1234"),
            now,
        ));

        // once /a is stale the space is reclaimed
        let later = now + Duration::from_secs(2);
        assert!(cache.store(
            &Method::GET,
            &uri("/b"),
            &empty,
            StatusCode::OK,
            &headers,
            Bytes::from_static(b"1234"),
            later,
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn purging_forgets_vary_rules_and_charges() {
        let cache = cache();
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=1")]);

        for i in 0..100 {
            assert!(cache.store(
                &Method::GET,
                &uri(&format!("/api/v1/version?r={i}")),
                &HeaderMap::new(),
                StatusCode::OK,
                &headers,
                Bytes::new(),
                now,
            ));
        }
        assert_eq!(cache.vary_rules.len(), 100);
        // empty bodies still cost their key and headers
        assert!(cache.size() > 0);

        cache.purge_expired(now + Duration::from_secs(5));
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        assert!(cache.vary_rules.is_empty());
    }

    #[test]
    fn vary_rule_outlives_only_its_last_variant() {
        let cache = cache();
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=60"), ("vary", "Accept-Language")]);
        let en = response_headers(&[("accept-language", "en")]);
        let fr = response_headers(&[("accept-language", "fr")]);

        for lang in [&en, &fr] {
            cache.store(
                &Method::GET,
                &uri("/greeting"),
                lang,
                StatusCode::OK,
                &headers,
                Bytes::from_static(b"hello"),
                now,
            );
        }
        assert_eq!(cache.vary_rules.get("GET\u{1f}/greeting").unwrap().variants, 2);

        let expired = now + Duration::from_secs(61);
        assert!(cache.lookup(&Method::GET, &uri("/greeting"), &en, expired).is_none());
        assert_eq!(cache.vary_rules.len(), 1);
        assert!(cache.lookup(&Method::GET, &uri("/greeting"), &fr, expired).is_none());
        assert!(cache.vary_rules.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn replacing_a_variant_keeps_one_charge() {
        let cache = cache();
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=60")]);

        for _ in 0..3 {
            cache.store(
                &Method::GET,
                &uri("/api/v1/version"),
                &HeaderMap::new(),
                StatusCode::OK,
                &headers,
                Bytes::from_static(b"{}"),
                now,
            );
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), 52);
        assert_eq!(cache.vary_rules.get("GET\u{1f}/api/v1/version").unwrap().variants, 1);
    }

    #[test]
    fn concurrent_stores_stay_within_the_budget() {
        // each /cN entry is charged 42 bytes: key (7), headers (31), body (4)
        let cache = ResponseCache::new(ResponseCacheConfig {
            enabled: true,
            max_body_bytes: 4,
            size_limit_bytes: 3 * 42,
        });
        let now = Instant::now();
        let headers = response_headers(&[("cache-control", "public, max-age=60")]);

        let stored = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = &cache;
                    let headers = &headers;
                    scope.spawn(move || {
                        cache.store(
                            &Method::GET,
                            &uri(&format!("/c{i}")),
                            &HeaderMap::new(),
                            StatusCode::OK,
                            headers,
                            Bytes::from_static(b"1234"),
                            now,
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(stored, 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.size(), 3 * 42);
    }
}
