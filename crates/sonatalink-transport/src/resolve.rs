use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Resolve `host` and `port` to socket addresses.
///
/// Stateless: every call goes to the system resolver. An empty host name is
/// rejected without a lookup.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let fail = |source: io::Error| TransportError::Resolve {
        host: host.to_owned(),
        port,
        source,
    };

    if host.is_empty() {
        return Err(fail(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty host name",
        )));
    }

    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().map_err(fail)?.collect();
    if addrs.is_empty() {
        return Err(fail(io::Error::new(
            io::ErrorKind::NotFound,
            "host has no addresses",
        )));
    }
    debug!(host, port, count = addrs.len(), "resolved host");
    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_is_rejected() {
        let err = resolve("", 5555).unwrap_err();
        assert!(matches!(err, TransportError::Resolve { port: 5555, .. }));
    }

    #[test]
    fn numeric_address_resolves_without_dns() {
        let addrs = resolve("127.0.0.1", 8080).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse().unwrap()]);
    }
}
