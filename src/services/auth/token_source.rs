//! Picks the bearer credential for a request.
//!
//! Sources are tried in a fixed order and the first usable one wins:
//!
//! 1. `?access_token=` query parameter, only on hub paths (`/hubs/...`).
//!    Browsers cannot set headers on WebSocket/EventSource connections, so
//!    long-lived hub connections pass the token in the URL. Everywhere else
//!    query tokens are ignored to keep them out of URLs and access logs.
//! 2. `access_token` request header.
//! 3. `access_token` cookie.
//!
//! [`credential`] adds the standard `Authorization: Bearer` header as a last
//! resort, which is what the documented OpenAPI bearer scheme sends.

use axum::http::{HeaderMap, Uri, header};

pub const ACCESS_TOKEN: &str = "access_token";
pub const HUB_PATH_PREFIX: &str = "/hubs/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Query,
    Header,
    Cookie,
    Authorization,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Authorization => "authorization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub value: String,
    pub source: TokenSource,
}

/// Read-only view over the parts of a request the resolver looks at.
#[derive(Debug, Clone, Copy)]
pub struct TokenRequest<'a> {
    path: &'a str,
    query: Option<&'a str>,
    headers: &'a HeaderMap,
}

impl<'a> TokenRequest<'a> {
    pub fn new(path: &'a str, query: Option<&'a str>, headers: &'a HeaderMap) -> Self {
        Self {
            path,
            query,
            headers,
        }
    }

    pub fn from_uri(uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        Self::new(uri.path(), uri.query(), headers)
    }

    pub fn is_hub_path(&self) -> bool {
        is_hub_path(self.path)
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// First value of `name` that is valid visible ASCII and non-empty.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .get_all(name)
            .iter()
            .find_map(|v| v.to_str().ok().and_then(non_empty))
    }

    pub fn cookie(&self, name: &str) -> Option<&'a str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| unquote(value.trim()))
    }

    pub fn bearer(&self) -> Option<&'a str> {
        let value = self.header(header::AUTHORIZATION.as_str())?;
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        non_empty(token.trim())
    }
}

/// Case-insensitive `/hubs/` prefix check.
pub fn is_hub_path(path: &str) -> bool {
    path.get(..HUB_PATH_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(HUB_PATH_PREFIX))
}

/// Resolve the `access_token` credential. Never fails; `None` means no token.
pub fn resolve(request: &TokenRequest<'_>) -> Option<String> {
    resolve_source(request).map(|token| token.value)
}

/// Same as [`resolve`] but also reports where the token came from.
pub fn resolve_source(request: &TokenRequest<'_>) -> Option<ResolvedToken> {
    if request.is_hub_path() {
        if let Some(value) = request.query_param(ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            return Some(ResolvedToken {
                value,
                source: TokenSource::Query,
            });
        }
    }

    if let Some(value) = request.header(ACCESS_TOKEN) {
        return Some(ResolvedToken {
            value: value.to_string(),
            source: TokenSource::Header,
        });
    }

    request
        .cookie(ACCESS_TOKEN)
        .and_then(non_empty)
        .map(|value| ResolvedToken {
            value: value.to_string(),
            source: TokenSource::Cookie,
        })
}

/// The credential handed to the validator: the `access_token` sources first,
/// then `Authorization: Bearer`.
pub fn credential(request: &TokenRequest<'_>) -> Option<ResolvedToken> {
    resolve_source(request).or_else(|| {
        request.bearer().map(|value| ResolvedToken {
            value: value.to_string(),
            source: TokenSource::Authorization,
        })
    })
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn resolve_uri(uri: &str, pairs: &[(&'static str, &'static str)]) -> Option<ResolvedToken> {
        let uri: Uri = uri.parse().unwrap();
        let headers = headers(pairs);
        resolve_source(&TokenRequest::from_uri(&uri, &headers))
    }

    #[test]
    fn hub_query_token_beats_header_and_cookie() {
        let token = resolve_uri(
            "/hubs/chat?access_token=QABC",
            &[("access_token", "HXYZ"), ("cookie", "access_token=CXYZ")],
        )
        .unwrap();
        assert_eq!(token.value, "QABC");
        assert_eq!(token.source, TokenSource::Query);
    }

    #[test]
    fn repeated_header_uses_first_usable_value() {
        let token = resolve_uri(
            "/api/orders",
            &[
                ("access_token", ""),
                ("access_token", "HXYZ"),
                ("cookie", "access_token=CXYZ"),
            ],
        )
        .unwrap();
        assert_eq!(token.value, "HXYZ");
        assert_eq!(token.source, TokenSource::Header);

        let uri: Uri = "/api/orders".parse().unwrap();
        let mut map = HeaderMap::new();
        map.append("access_token", HeaderValue::from_bytes(b"\xe9bad").unwrap());
        map.append("access_token", HeaderValue::from_static("HXYZ"));
        map.append(header::COOKIE, HeaderValue::from_static("access_token=CXYZ"));
        let token = resolve_source(&TokenRequest::from_uri(&uri, &map)).unwrap();
        assert_eq!(token.value, "HXYZ");
    }

    #[test]
    fn query_token_is_ignored_outside_hubs() {
        let token = resolve_uri("/api/orders?access_token=QABC", &[("access_token", "HXYZ")]);
        assert_eq!(token.map(|t| t.value).as_deref(), Some("HXYZ"));

        assert_eq!(resolve_uri("/api/orders?access_token=QABC", &[]), None);
        // `/hubs` without the trailing segment separator is not a hub path
        assert_eq!(resolve_uri("/hubs?access_token=QABC", &[]), None);
        assert_eq!(resolve_uri("/hubsx/chat?access_token=QABC", &[]), None);
    }

    #[test]
    fn hub_prefix_is_case_insensitive() {
        let token = resolve_uri("/Hubs/Chat?access_token=QABC", &[]);
        assert_eq!(token.map(|t| t.value).as_deref(), Some("QABC"));
    }

    #[test]
    fn empty_query_token_falls_through_to_header() {
        let token = resolve_uri("/hubs/chat?access_token=", &[("access_token", "HXYZ")]);
        assert_eq!(token.map(|t| t.source), Some(TokenSource::Header));
    }

    #[test]
    fn query_token_is_percent_decoded() {
        let token = resolve_uri("/hubs/chat?x=1&access_token=a%2Eb%2Ec", &[]);
        assert_eq!(token.map(|t| t.value).as_deref(), Some("a.b.c"));
    }

    #[test]
    fn cookie_is_the_last_access_token_source() {
        let token = resolve_uri(
            "/api/orders",
            &[("cookie", "theme=dark; access_token=CXYZ; lang=en")],
        )
        .unwrap();
        assert_eq!(token.value, "CXYZ");
        assert_eq!(token.source, TokenSource::Cookie);
    }

    #[test]
    fn empty_header_falls_through_to_cookie() {
        let token = resolve_uri(
            "/api/orders",
            &[("access_token", ""), ("cookie", "access_token=\"CXYZ\"")],
        );
        assert_eq!(token.map(|t| t.value).as_deref(), Some("CXYZ"));
    }

    #[test]
    fn nothing_resolves_to_none() {
        assert_eq!(resolve_uri("/api/orders", &[]), None);
        assert_eq!(resolve_uri("/api/orders", &[("cookie", "access_token=")]), None);
    }

    #[test]
    fn resolve_returns_plain_value() {
        let uri: Uri = "/api/orders".parse().unwrap();
        let headers = headers(&[("access_token", "HXYZ")]);
        assert_eq!(
            resolve(&TokenRequest::from_uri(&uri, &headers)).as_deref(),
            Some("HXYZ")
        );
    }

    #[test]
    fn credential_falls_back_to_authorization_bearer() {
        let uri: Uri = "/api/orders".parse().unwrap();
        let headers = headers(&[("authorization", "Bearer abc.def.ghi")]);
        let request = TokenRequest::from_uri(&uri, &headers);

        assert_eq!(resolve(&request), None);
        assert_eq!(
            credential(&request),
            Some(ResolvedToken {
                value: "abc.def.ghi".to_string(),
                source: TokenSource::Authorization,
            })
        );
    }

    #[test]
    fn access_token_sources_win_over_authorization() {
        let uri: Uri = "/api/orders".parse().unwrap();
        let headers = headers(&[
            ("authorization", "Bearer from-authorization"),
            ("cookie", "access_token=from-cookie"),
        ]);
        let token = credential(&TokenRequest::from_uri(&uri, &headers)).unwrap();
        assert_eq!(token.source, TokenSource::Cookie);
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let uri: Uri = "/api/orders".parse().unwrap();
        let headers = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(credential(&TokenRequest::from_uri(&uri, &headers)), None);
    }
}
