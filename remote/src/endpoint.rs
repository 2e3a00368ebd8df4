//! Host/port pairs used for binding and dialing.

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "4200";

/// A host and port, kept exactly as given.
///
/// Nothing is validated until [`Endpoint::resolve`], so a malformed port surfaces as a
/// bind or connect failure rather than a construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> &str {
        &self.port
    }

    fn parse_port(&self) -> std::io::Result<u16> {
        self.port.parse::<u16>().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid port {:?}: {}", self.port, err),
            )
        })
    }

    /// Resolves to socket addresses in the order the resolver returned them.
    ///
    /// An empty host stands for every local interface: the IPv6 and IPv4 unspecified
    /// addresses, in that order. Binding it listens everywhere, dialing it reaches the
    /// local machine.
    pub async fn resolve(&self) -> std::io::Result<Vec<std::net::SocketAddr>> {
        let port = self.parse_port()?;
        if self.host.is_empty() {
            return Ok(vec![
                (std::net::Ipv6Addr::UNSPECIFIED, port).into(),
                (std::net::Ipv4Addr::UNSPECIFIED, port).into(),
            ]);
        }
        // bracketed IPv6 literals are accepted for convenience
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let addrs: Vec<_> = tokio::net::lookup_host((host, port)).await?.collect();
        if addrs.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("{self} did not resolve to any address"),
            ));
        }
        tracing::debug!("{} resolved to {:?}", self, addrs);
        Ok(addrs)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_host_and_port() {
        assert_eq!(Endpoint::default().to_string(), "localhost:4200");
        assert_eq!(Endpoint::new("::1", "80").to_string(), "[::1]:80");
        assert_eq!(Endpoint::new("[::1]", "80").to_string(), "[::1]:80");
    }

    #[tokio::test]
    async fn resolves_loopback() {
        let addrs = Endpoint::new("127.0.0.1", "4200").resolve().await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:4200".parse::<std::net::SocketAddr>().unwrap()]);
        let addrs = Endpoint::new("[::1]", "4200").resolve().await.unwrap();
        assert_eq!(addrs, vec!["[::1]:4200".parse::<std::net::SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn malformed_port_is_invalid_input() {
        for port in ["a", "", "65536", "-1"] {
            let error = Endpoint::new("localhost", port).resolve().await.unwrap_err();
            assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput, "port {port:?}");
        }
    }

    #[tokio::test]
    async fn empty_host_is_every_interface() {
        let addrs = Endpoint::new("", "4200").resolve().await.unwrap();
        assert_eq!(
            addrs,
            vec![
                "[::]:4200".parse::<std::net::SocketAddr>().unwrap(),
                "0.0.0.0:4200".parse::<std::net::SocketAddr>().unwrap(),
            ]
        );
        assert_eq!(Endpoint::new("", "4200").to_string(), ":4200");
    }

    #[tokio::test]
    async fn unknown_host_fails() {
        assert!(
            Endpoint::new("nosuchhost.invalid", "4200")
                .resolve()
                .await
                .is_err()
        );
    }
}
