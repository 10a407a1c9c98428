mod error_rep;
mod preauth;
mod tgs_rep;

use crate::asn1::krb_kdc_rep::KrbKdcRep;
use crate::error::KrbError;
use der::{Decode, Encode};
use tracing::error;

pub use error_rep::{ErrorChecksum, ErrorReply};
pub use preauth::{MethodDataPolicy, PreauthHints, SaltEntry};
pub use tgs_rep::TicketGrantReply;

#[derive(Debug)]
pub enum KerberosReply {
    TGS(TicketGrantReply),
    ERR(Box<ErrorReply>),
}

impl KerberosReply {
    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        let rep = KrbKdcRep::from_der(bytes).map_err(|err| {
            error!(?err, "unable to decode KDC reply");
            KrbError::MalformedEncoding
        })?;
        KerberosReply::try_from(rep)
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let rep = match self {
            KerberosReply::TGS(tgs_rep) => KrbKdcRep::TgsRep(tgs_rep.try_into()?),
            KerberosReply::ERR(err_rep) => KrbKdcRep::ErrRep(err_rep.as_ref().try_into()?),
        };
        rep.to_der().map_err(|err| {
            error!(?err, "unable to encode KDC reply");
            KrbError::MalformedEncoding
        })
    }
}

impl TryFrom<KrbKdcRep> for KerberosReply {
    type Error = KrbError;

    fn try_from(rep: KrbKdcRep) -> Result<Self, KrbError> {
        match rep {
            KrbKdcRep::TgsRep(kdc_rep) => TicketGrantReply::try_from(kdc_rep).map(KerberosReply::TGS),
            KrbKdcRep::ErrRep(err_rep) => {
                ErrorReply::try_from(err_rep).map(|err| KerberosReply::ERR(Box::new(err)))
            }
        }
    }
}
