use super::kerberos_flags::{decode_flag_bits, encode_flag_bits, flag_bits_value_len};
use bitmask_enum::bitmask;
use der::{Decode, EncodeValue, Length, Reader, Result, Tagged, Writer};

// NOTE: Can't use der::Flagset because it strips all leading zeros and RFC4120
// section 5.8.2 says at least 32 bit must be sent.
#[bitmask(u32)]
pub enum ApFlags {
    Reserved = 1 << 0,
    // The USE-SESSION-KEY option indicates that the ticket the client is
    // presenting to a server is encrypted in the session key from the
    // server's TGT.  When this option is not specified, the ticket is
    // encrypted in the server's secret key.
    UseSessionKey = 1 << 1,
    // The MUTUAL-REQUIRED option tells the server that the client requires
    // mutual authentication, and that it must respond with a KRB_AP_REP
    // message.
    MutualRequired = 1 << 2,
}

pub type ApOptions = ApFlags;

impl ApFlags {
    fn from_bits(val: u32) -> Self {
        let mut tf = ApFlags::none();
        tf.bits = val;
        tf
    }
}

impl<'a> Decode<'a> for ApFlags {
    type Error = der::Error;

    fn decode<R: Reader<'a>>(decoder: &mut R) -> Result<Self> {
        decode_flag_bits(decoder).map(ApFlags::from_bits)
    }
}

impl Tagged for ApFlags {
    fn tag(&self) -> der::Tag {
        der::Tag::BitString
    }
}

impl EncodeValue for ApFlags {
    fn value_len(&self) -> Result<Length> {
        flag_bits_value_len(self.bits())
    }

    fn encode_value(&self, encoder: &mut impl Writer) -> Result<()> {
        encode_flag_bits(self.bits(), encoder)
    }
}
