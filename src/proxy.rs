//! Normalized proxy representation.

use crate::error::ProxyFormatError;

use std::fmt;
use std::net::Ipv4Addr;
use url::Url;

/// Scheme of every normalized proxy.
pub const PROXY_SCHEME: &str = "http";

/// A validated HTTP proxy endpoint.
///
/// The host is always a literal IPv4 address and the port is never zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedProxy {
    host: Ipv4Addr,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    /// Percent-encoded `user:pass`, present only with credentials.
    userinfo: Option<String>,
}

impl NormalizedProxy {
    pub fn host(&self) -> Ipv4Addr {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Convert the proxy to a reqwest::Proxy covering every scheme.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.to_string())
    }
}

impl fmt::Display for NormalizedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", PROXY_SCHEME)?;
        if let Some(userinfo) = &self.userinfo {
            write!(f, "{}@", userinfo)?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Turn a raw `host:port` candidate into a [`NormalizedProxy`].
///
/// `http://` is assumed when no scheme is given; any other scheme is rejected.
/// Credentials are attached only when both `username` and `password` are
/// non-empty, replacing any userinfo present in `raw`.
pub fn normalize(
    raw: &str,
    username: &str,
    password: &str,
) -> Result<NormalizedProxy, ProxyFormatError> {
    let candidate = raw.trim();
    let rest = match candidate.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(PROXY_SCHEME) => rest,
        Some(_) => return Err(ProxyFormatError::new(raw, "unsupported scheme")),
        None => candidate,
    };

    let mut url = Url::parse(&format!("{}://{}", PROXY_SCHEME, rest))
        .map_err(|_| ProxyFormatError::new(raw, "not a valid url"))?;

    // The url parser expands shorthand forms like `127.0.0`, so the host is
    // checked against the authority exactly as written.
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or_else(|| ProxyFormatError::new(raw, "missing port"))?;
    let host: Ipv4Addr = host
        .parse()
        .map_err(|_| ProxyFormatError::new(raw, "host is not an ipv4 address"))?;
    if port.is_empty() {
        return Err(ProxyFormatError::new(raw, "missing port"));
    }
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ProxyFormatError::new(raw, "invalid port"))?;

    let (username, password, userinfo) = if !username.is_empty() && !password.is_empty() {
        url.set_username(username)
            .and_then(|_| url.set_password(Some(password)))
            .map_err(|_| ProxyFormatError::new(raw, "cannot carry credentials"))?;
        let userinfo = format!("{}:{}", url.username(), url.password().unwrap_or_default());
        (Some(username.to_string()), Some(password.to_string()), Some(userinfo))
    } else {
        (None, None, None)
    };

    Ok(NormalizedProxy {
        host,
        port,
        username,
        password,
        userinfo,
    })
}

/// Normalize every candidate, silently dropping malformed ones.
pub fn normalize_all<I, S>(raw: I, username: &str, password: &str) -> Vec<NormalizedProxy>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|candidate| normalize(candidate.as_ref(), username, password).ok())
        .collect()
}
