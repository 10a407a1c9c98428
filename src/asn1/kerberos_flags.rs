use bitmask_enum::bitmask;
use der::asn1::BitStringRef;
use der::{Decode, EncodeValue, Length, Reader, Result, Tagged, Writer};

/// ```text
/// KerberosFlags   ::= BIT STRING (SIZE (32..MAX))
///                     -- minimum number of bits shall be sent,
///                     -- but no fewer than 32
/// ````
// NOTE: Can't use der::Flagset because it strips all leading zeros and RFC4120
// section 5.8.2 says at least 32 bit must be sent.
#[bitmask(u32)]
pub enum KerberosFlags {
    Reserved = 1 << 0,
    Forwardable = 1 << 1,
    Forwarded = 1 << 2,
    Proxiable = 1 << 3,
    Proxy = 1 << 4,
    AllowPostdate = 1 << 5,
    Postdated = 1 << 6,
    Unused7 = 1 << 7,
    Renewable = 1 << 8,
    Unused9 = 1 << 9,
    Unused10 = 1 << 10,
    OptHardwareAuth = 1 << 11,
    Unused12 = 1 << 12,
    Unused13 = 1 << 13,
    CnameInAddlTkt = 1 << 14,
    Canonicalize = 1 << 15,
    Unused16 = 1 << 16,
    Unused17 = 1 << 17,
    Unused18 = 1 << 18,
    Unused19 = 1 << 19,
    Unused20 = 1 << 20,
    Unused21 = 1 << 21,
    Unused22 = 1 << 22,
    Unused23 = 1 << 23,
    Unused24 = 1 << 24,
    Unused25 = 1 << 25,
    // -- 26 was unused in 1510
    DisableTransitedCheck = 1 << 26,
    RenewableOk = 1 << 27,
    EncTktInSkey = 1 << 28,
    Unused29 = 1 << 29,
    Renew = 1 << 30,
    Validate = 1 << 31,
}

impl KerberosFlags {
    fn from_bits(val: u32) -> Self {
        let mut tf = KerberosFlags::none();
        tf.bits = val;
        tf
    }
}

/// RFC4120 numbers the flags from the most significant bit of the first octet,
/// so bit `n` of the wire value is bit `31 - n` of the in memory mask.
fn reverse_bits(bits: u32) -> u32 {
    let mut reversed = 0u32;
    for i in 0..32 {
        let on = bits & (1 << i);
        reversed |= on >> i << (32 - i - 1);
    }
    reversed
}

/// Decode a BIT STRING of exactly 32 bits into a flag mask.
pub(crate) fn decode_flag_bits<'a, R: Reader<'a>>(decoder: &mut R) -> Result<u32> {
    let bs = BitStringRef::decode(decoder)?;
    let bytes: [u8; 4] = bs.raw_bytes().try_into().map_err(|_| {
        der::Error::new(
            der::ErrorKind::Incomplete {
                expected_len: Length::new(4),
                actual_len: decoder.position(),
            },
            decoder.position(),
        )
    })?;
    Ok(reverse_bits(u32::from_be_bytes(bytes)))
}

pub(crate) fn flag_bits_value_len(bits: u32) -> Result<Length> {
    let buff = &reverse_bits(bits).to_be_bytes();
    let bs = BitStringRef::from_bytes(buff)?;
    bs.value_len()
}

pub(crate) fn encode_flag_bits(bits: u32, encoder: &mut impl Writer) -> Result<()> {
    let buff = &reverse_bits(bits).to_be_bytes();
    let bs = BitStringRef::from_bytes(buff)?;
    bs.encode_value(encoder)
}

impl<'a> Decode<'a> for KerberosFlags {
    type Error = der::Error;

    fn decode<R: Reader<'a>>(decoder: &mut R) -> Result<Self> {
        decode_flag_bits(decoder).map(KerberosFlags::from_bits)
    }
}

impl Tagged for KerberosFlags {
    fn tag(&self) -> der::Tag {
        der::Tag::BitString
    }
}

impl EncodeValue for KerberosFlags {
    fn value_len(&self) -> Result<Length> {
        flag_bits_value_len(self.bits())
    }

    fn encode_value(&self, encoder: &mut impl Writer) -> Result<()> {
        encode_flag_bits(self.bits(), encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::KerberosFlags;
    use der::{Decode, Encode};

    #[test]
    fn kdc_options_tgs_s4u2proxy_encoding() {
        let flags = KerberosFlags::Forwardable
            | KerberosFlags::Renewable
            | KerberosFlags::CnameInAddlTkt
            | KerberosFlags::Canonicalize;
        let der_bytes = flags.to_der().expect("Failed to encode");
        assert_eq!(der_bytes, [0x03, 0x05, 0x00, 0x40, 0x83, 0x00, 0x00]);

        let decoded = KerberosFlags::from_der(&der_bytes).expect("Failed to decode");
        assert_eq!(decoded, flags);
        assert!(decoded.contains(KerberosFlags::CnameInAddlTkt));
    }

    #[test]
    fn kerberos_flags_short_bitstring_rejected() {
        // Only 8 bits are sent, but at least 32 are required.
        let der_bytes = [0x03, 0x02, 0x00, 0x40];
        assert!(KerberosFlags::from_der(&der_bytes).is_err());
    }
}
