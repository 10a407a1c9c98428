use super::kdc_rep::KdcRep;
use super::krb_error::KrbError;
use der::{Tag, TagNumber, Writer};

const TGS_REP_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(13),
};

const KRB_ERROR_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(30),
};

/// ```text
/// TGS-REP         ::= [APPLICATION 13] KDC-REP
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE { ... }
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
// For clarity and keeping to the rfc, we allow this warning.
// Normally clippy likes to say "no" because each variant ends
// with 'rep'.
#[allow(clippy::enum_variant_names)]
pub(crate) enum KrbKdcRep {
    TgsRep(KdcRep),
    ErrRep(KrbError),
}

impl<'a> ::der::Decode<'a> for KrbKdcRep {
    type Error = der::Error;

    fn decode<R: der::Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: der::Tag = decoder.decode()?;
        let _len: der::Length = decoder.decode()?;

        match tag {
            TGS_REP_TAG => {
                let kdc_rep: KdcRep = decoder.decode()?;
                Ok(KrbKdcRep::TgsRep(kdc_rep))
            }
            KRB_ERROR_TAG => {
                let err_rep: KrbError = decoder.decode()?;
                Ok(KrbKdcRep::ErrRep(err_rep))
            }
            _ => Err(der::Error::from(der::ErrorKind::TagUnexpected {
                expected: None,
                actual: tag,
            })),
        }
    }
}

impl ::der::Encode for KrbKdcRep {
    fn encoded_len(&self) -> Result<der::Length, der::Error> {
        let (tag, inner_len) = match self {
            KrbKdcRep::TgsRep(tgsrep) => (TGS_REP_TAG, tgsrep.encoded_len()?),
            KrbKdcRep::ErrRep(err_rep) => (KRB_ERROR_TAG, err_rep.encoded_len()?),
        };
        tag.encoded_len()? + inner_len.encoded_len()? + inner_len
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        match self {
            KrbKdcRep::TgsRep(tgsrep) => {
                TGS_REP_TAG.encode(writer)?;
                tgsrep.encoded_len()?.encode(writer)?;
                tgsrep.encode(writer)
            }
            KrbKdcRep::ErrRep(err_rep) => {
                KRB_ERROR_TAG.encode(writer)?;
                err_rep.encoded_len()?.encode(writer)?;
                err_rep.encode(writer)
            }
        }
    }
}
