// #![deny(warnings)]

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

mod asn1;
pub(crate) mod cksum;
pub mod config;
pub(crate) mod constants;
pub(crate) mod crypto;
pub mod error;
pub mod exchange;
pub mod proto;
pub mod realm_path;
pub mod service_creds;
pub mod transport;

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{error, trace};

use crate::constants::DEFAULT_IO_MAX_SIZE;

pub use crate::service_creds::KerberosClient;

/// Kerberos over TCP, RFC4120 section 7.2.2. Each message is preceded by its
/// length as a four octet big endian integer. The high bit of the length is
/// reserved and must be zero.
pub struct KerberosTcpCodec {
    max_size: usize,
}

impl Default for KerberosTcpCodec {
    fn default() -> Self {
        KerberosTcpCodec {
            max_size: DEFAULT_IO_MAX_SIZE,
        }
    }
}

impl KerberosTcpCodec {
    pub fn new(max_size: usize) -> Self {
        KerberosTcpCodec { max_size }
    }
}

const RESERVED_LENGTH_BIT: u32 = 0x8000_0000;

impl Decoder for KerberosTcpCodec {
    type Item = Vec<u8>;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len_bytes) = buf.get(..4) else {
            return Ok(None);
        };

        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(len_bytes);
        let len = u32::from_be_bytes(len_buf);

        if len == 0 || len & RESERVED_LENGTH_BIT != 0 {
            error!(len, "invalid record length");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid record length",
            ));
        }

        let len = len as usize;
        if len > self.max_size {
            error!(len, max_size = self.max_size, "record exceeds maximum size");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "record exceeds maximum size",
            ));
        }

        if buf.len() < 4 + len {
            buf.reserve(4 + len - buf.len());
            return Ok(None);
        }

        buf.advance(4);
        let record = buf.split_to(len).to_vec();
        trace!(record_len = record.len());
        Ok(Some(record))
    }
}

impl Encoder<Vec<u8>> for KerberosTcpCodec {
    type Error = io::Error;

    fn encode(&mut self, msg: Vec<u8>, buf: &mut BytesMut) -> io::Result<()> {
        let len = u32::try_from(msg.len())
            .ok()
            .filter(|len| *len & RESERVED_LENGTH_BIT == 0 && msg.len() <= self.max_size)
            .ok_or_else(|| {
                error!(len = msg.len(), "request exceeds maximum size");
                io::Error::new(io::ErrorKind::InvalidInput, "request exceeds maximum size")
            })?;

        buf.reserve(4 + msg.len());
        buf.put_u32(len);
        buf.extend_from_slice(&msg);

        Ok(())
    }
}
