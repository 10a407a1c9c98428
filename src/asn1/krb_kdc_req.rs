use super::kdc_req::KdcReq;
use der::{Tag, TagNumber, Writer};

const TGS_REQ_TAG: Tag = Tag::Application {
    constructed: true,
    number: TagNumber(12),
};

/// ```text
/// TGS-REQ         ::= [APPLICATION 12] KDC-REQ
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum KrbKdcReq {
    TgsReq(KdcReq),
}

impl<'a> ::der::Decode<'a> for KrbKdcReq {
    type Error = der::Error;

    fn decode<R: der::Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: der::Tag = decoder.decode()?;
        let _len: der::Length = decoder.decode()?;

        match tag {
            TGS_REQ_TAG => {
                let kdc_req: KdcReq = decoder.decode()?;
                Ok(KrbKdcReq::TgsReq(kdc_req))
            }
            _ => Err(der::Error::from(der::ErrorKind::TagUnexpected {
                expected: Some(TGS_REQ_TAG),
                actual: tag,
            })),
        }
    }
}

impl ::der::Encode for KrbKdcReq {
    fn encoded_len(&self) -> Result<der::Length, der::Error> {
        let KrbKdcReq::TgsReq(tgsreq) = self;
        let tgs_req_len = tgsreq.encoded_len()?;
        tracing::trace!(?tgs_req_len);
        TGS_REQ_TAG.encoded_len()? + tgs_req_len.encoded_len()? + tgs_req_len
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        let KrbKdcReq::TgsReq(tgsreq) = self;
        TGS_REQ_TAG.encode(writer)?;
        tgsreq.encoded_len()?.encode(writer)?;
        tgsreq.encode(writer)
    }
}
