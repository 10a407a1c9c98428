use crate::config::ClientConfig;
use crate::constants::{DEFAULT_KDC_PORT, DEFAULT_KDC_TIMEOUT};
use crate::error::KrbError;
use crate::KerberosTcpCodec;
use futures::{SinkExt, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, error, trace, warn};

/// A connection to one KDC. Requests and replies are whole DER messages.
pub trait KdcTransport {
    fn send(&mut self, request: &[u8]) -> Result<(), KrbError>;

    /// The next reply, or `None` when the KDC closed the stream or framed the
    /// reply in a way that can not be read.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, KrbError>;
}

/// Opens transports to the KDCs of a realm.
pub trait KdcConnector {
    type Transport: KdcTransport;

    fn connect(&self, realm: &str) -> Result<Self::Transport, KrbError>;
}

pub struct TcpTransport {
    runtime: Runtime,
    stream: Framed<TcpStream, KerberosTcpCodec>,
    timeout: Duration,
}

impl TcpTransport {
    pub fn connect(address: &str, kdc_timeout: Duration) -> Result<Self, KrbError> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(?err, "unable to build transport runtime");
                KrbError::TransportIo
            })?;

        let stream = runtime
            .block_on(async { timeout(kdc_timeout, TcpStream::connect(address)).await })
            .map_err(|_| {
                warn!(?address, "timed out connecting to KDC");
                KrbError::TransportTimeout
            })?
            .map_err(|err| {
                warn!(?err, ?address, "unable to connect to KDC");
                KrbError::TransportIo
            })?;

        debug!(?address, "connected to KDC");

        Ok(TcpTransport {
            runtime,
            stream: Framed::new(stream, KerberosTcpCodec::default()),
            timeout: kdc_timeout,
        })
    }
}

impl KdcTransport for TcpTransport {
    fn send(&mut self, request: &[u8]) -> Result<(), KrbError> {
        let (stream, deadline) = (&mut self.stream, self.timeout);
        self.runtime
            .block_on(async { timeout(deadline, stream.send(request.to_vec())).await })
            .map_err(|_| {
                error!("timed out sending request to KDC");
                KrbError::TransportTimeout
            })?
            .map_err(|err| {
                error!(?err, "unable to send request to KDC");
                match err.kind() {
                    std::io::ErrorKind::InvalidInput => KrbError::RequestTooLarge,
                    _ => KrbError::TransportIo,
                }
            })
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, KrbError> {
        let (stream, deadline) = (&mut self.stream, self.timeout);
        let next = self
            .runtime
            .block_on(async { timeout(deadline, stream.next()).await })
            .map_err(|_| {
                error!("timed out waiting for KDC reply");
                KrbError::TransportTimeout
            })?;

        match next {
            Some(Ok(reply)) => {
                trace!(reply_len = reply.len());
                Ok(Some(reply))
            }
            Some(Err(err)) => {
                warn!(?err, "unreadable KDC reply");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Connects over TCP to the KDCs configured for each realm, trying them in
/// order until one accepts.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    kdcs: BTreeMap<String, Vec<String>>,
    timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        TcpConnector {
            kdcs: BTreeMap::new(),
            timeout: DEFAULT_KDC_TIMEOUT,
        }
    }
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        TcpConnector {
            kdcs: BTreeMap::new(),
            timeout,
        }
    }

    pub fn with_kdc(mut self, realm: &str, address: &str) -> Self {
        self.kdcs
            .entry(realm.to_string())
            .or_default()
            .push(address.to_string());
        self
    }
}

impl From<&ClientConfig> for TcpConnector {
    fn from(config: &ClientConfig) -> Self {
        TcpConnector {
            kdcs: config
                .realms()
                .iter()
                .map(|(realm, realm_config)| (realm.clone(), realm_config.kdc.clone()))
                .collect(),
            timeout: config.kdc_timeout(),
        }
    }
}

/// `host` and `host:port` both name a KDC, the port defaults to 88.
fn kdc_address(kdc: &str) -> String {
    let has_port = match kdc.rsplit_once(':') {
        // A bare IPv6 address has colons but no port.
        Some((host, port)) => {
            (!host.contains(':') || host.ends_with(']')) && port.parse::<u16>().is_ok()
        }
        None => false,
    };
    if has_port {
        kdc.to_string()
    } else if kdc.contains(':') && !kdc.starts_with('[') {
        format!("[{}]:{}", kdc, DEFAULT_KDC_PORT)
    } else {
        format!("{}:{}", kdc, DEFAULT_KDC_PORT)
    }
}

impl KdcConnector for TcpConnector {
    type Transport = TcpTransport;

    fn connect(&self, realm: &str) -> Result<TcpTransport, KrbError> {
        let kdcs = match self.kdcs.get(realm) {
            Some(kdcs) if !kdcs.is_empty() => kdcs,
            _ => {
                error!(?realm, "no KDC configured for realm");
                return Err(KrbError::NoKdcForRealm);
            }
        };

        let mut last_err = KrbError::TransportIo;
        for kdc in kdcs {
            match TcpTransport::connect(&kdc_address(kdc), self.timeout) {
                Ok(transport) => return Ok(transport),
                Err(err) => {
                    debug!(?kdc, ?err, "trying next KDC");
                    last_err = err;
                }
            }
        }

        error!(?realm, "no KDC for realm could be reached");
        Err(last_err)
    }
}
