use super::kerberos_flags::{decode_flag_bits, encode_flag_bits, flag_bits_value_len};
use bitmask_enum::bitmask;
use der::{Decode, EncodeValue, Length, Reader, Result, Sequence, Tagged, Writer};

/// ```text
/// PA-PAC-OPTIONS ::= SEQUENCE {
///         -- PA TYPE 167
///         options         [0] PACOptionFlags
/// }
///
/// PACOptionFlags ::= KerberosFlags
///         -- Claims (0)
///         -- Branch Aware (1)
///         -- Forward to Full DC (2)
///         -- Resource Based Constrained Delegation (3)
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub(crate) struct PaPacOptions {
    #[asn1(context_specific = "0")]
    pub(crate) options: PacOptionFlags,
}

#[bitmask(u32)]
pub(crate) enum PacOptionFlags {
    Claims = 1 << 0,
    BranchAware = 1 << 1,
    ForwardToFullDc = 1 << 2,
    ResourceBasedConstrainedDelegation = 1 << 3,
}

impl PacOptionFlags {
    fn from_bits(val: u32) -> Self {
        let mut pf = PacOptionFlags::none();
        pf.bits = val;
        pf
    }
}

impl<'a> Decode<'a> for PacOptionFlags {
    type Error = der::Error;

    fn decode<R: Reader<'a>>(decoder: &mut R) -> Result<Self> {
        decode_flag_bits(decoder).map(PacOptionFlags::from_bits)
    }
}

impl Tagged for PacOptionFlags {
    fn tag(&self) -> der::Tag {
        der::Tag::BitString
    }
}

impl EncodeValue for PacOptionFlags {
    fn value_len(&self) -> Result<Length> {
        flag_bits_value_len(self.bits())
    }

    fn encode_value(&self, encoder: &mut impl Writer) -> Result<()> {
        encode_flag_bits(self.bits(), encoder)
    }
}
