use crate::asn1::{
    checksum::Checksum as Asn1Checksum, constants::message_types::KrbMessageType,
    kerberos_string::KerberosString, krb_error::KrbError as KdcKrbError,
    krb_kdc_rep::KrbKdcRep, principal_name::PrincipalName, realm::Realm, OctetString,
};
use crate::error::KrbError;
use crate::proto::{KerberosTime, KrbErrorCode, Name};
use der::{Decode, Encode};
use std::str::FromStr;
use tracing::error;

/// The e-cksum of a KRB-ERROR. It is carried through untouched, a client
/// has no key to verify it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorChecksum {
    pub checksum_type: i32,
    pub checksum: Vec<u8>,
}

/// A decoded KRB-ERROR. The e-data is kept as raw bytes, how it is read is
/// decided by [crate::proto::PreauthHints::interpret].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReply {
    code: KrbErrorCode,
    client_time: Option<KerberosTime>,
    server_time: KerberosTime,
    client_realm: Option<String>,
    client: Option<Name>,
    service: Name,
    error_text: Option<String>,
    error_data: Option<Vec<u8>>,
    error_checksum: Option<ErrorChecksum>,
}

impl ErrorReply {
    pub fn new(code: KrbErrorCode, service: Name, server_time: KerberosTime) -> Self {
        ErrorReply {
            code,
            client_time: None,
            server_time,
            client_realm: None,
            client: None,
            service,
            error_text: None,
            error_data: None,
            error_checksum: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.error_text = Some(text.to_string());
        self
    }

    pub fn with_error_data(mut self, data: Vec<u8>) -> Self {
        self.error_data = Some(data);
        self
    }

    pub fn with_client_time(mut self, client_time: KerberosTime) -> Self {
        self.client_time = Some(client_time);
        self
    }

    pub fn with_client(mut self, client: Name) -> Self {
        self.client_realm = Some(client.realm().to_string());
        self.client = Some(client);
        self
    }

    pub fn with_checksum(mut self, checksum: ErrorChecksum) -> Self {
        self.error_checksum = Some(checksum);
        self
    }

    pub fn code(&self) -> KrbErrorCode {
        self.code
    }

    pub fn client_time(&self) -> Option<KerberosTime> {
        self.client_time
    }

    pub fn server_time(&self) -> KerberosTime {
        self.server_time
    }

    pub fn client_realm(&self) -> Option<&str> {
        self.client_realm.as_deref()
    }

    pub fn client(&self) -> Option<&Name> {
        self.client.as_ref()
    }

    pub fn service(&self) -> &Name {
        &self.service
    }

    pub fn text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    pub fn error_data(&self) -> Option<&[u8]> {
        self.error_data.as_deref()
    }

    pub fn error_checksum(&self) -> Option<&ErrorChecksum> {
        self.error_checksum.as_ref()
    }

    /// Decode a bare KRB-ERROR, `[APPLICATION 30]` included.
    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        match KrbKdcRep::from_der(bytes) {
            Ok(KrbKdcRep::ErrRep(krb_error)) => ErrorReply::try_from(krb_error),
            Ok(KrbKdcRep::TgsRep(_)) => {
                error!("expected a KRB-ERROR but found a TGS-REP");
                Err(KrbError::InvalidMessageType)
            }
            Err(err) => {
                error!(?err, "unable to decode KRB-ERROR");
                Err(KrbError::MalformedEncoding)
            }
        }
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let krb_error = KdcKrbError::try_from(self)?;
        KrbKdcRep::ErrRep(krb_error).to_der().map_err(|err| {
            error!(?err, "unable to encode KRB-ERROR");
            KrbError::DerEncodeKrbError
        })
    }
}

impl TryFrom<KdcKrbError> for ErrorReply {
    type Error = KrbError;

    fn try_from(rep: KdcKrbError) -> Result<Self, KrbError> {
        if rep.pvno != 5 {
            error!(pvno = rep.pvno, "unsupported KRB-ERROR version");
            return Err(KrbError::InvalidPvno);
        }

        let msg_type =
            KrbMessageType::try_from(rep.msg_type).map_err(|_| KrbError::InvalidMessageType)?;

        if !matches!(msg_type, KrbMessageType::KrbError) {
            return Err(KrbError::InvalidMessageDirection);
        }

        let service = Name::try_from((&rep.service_name, &rep.service_realm))?;

        let client_time = rep
            .ctime
            .as_ref()
            .map(|ctime| KerberosTime::from_wire_parts(ctime, rep.cusec.unwrap_or(0)))
            .transpose()?;

        let server_time = KerberosTime::from_wire_parts(&rep.stime, rep.susec)?;

        let client_realm = rep.crealm.as_ref().map(String::from);

        // Without a crealm the client is taken to be in the realm of the service.
        let client = rep
            .cname
            .as_ref()
            .map(|cname| {
                let realm = rep.crealm.as_ref().unwrap_or(&rep.service_realm);
                Name::try_from((cname, realm))
            })
            .transpose()?;

        Ok(ErrorReply {
            code: KrbErrorCode::from(rep.error_code),
            client_time,
            server_time,
            client_realm,
            client,
            service,
            error_text: rep.error_text.as_ref().map(String::from),
            error_data: rep.error_data.map(OctetString::into_bytes),
            error_checksum: rep.error_checksum.map(|cksum| ErrorChecksum {
                checksum_type: cksum.checksum_type,
                checksum: cksum.checksum.into_bytes(),
            }),
        })
    }
}

impl TryFrom<&ErrorReply> for KdcKrbError {
    type Error = KrbError;

    fn try_from(rep: &ErrorReply) -> Result<Self, KrbError> {
        let (service_name, service_realm): (PrincipalName, Realm) = (&rep.service).try_into()?;

        let crealm = rep
            .client_realm
            .as_deref()
            .map(KerberosString::from_str)
            .transpose()?;
        let cname = rep.client.as_ref().map(PrincipalName::try_from).transpose()?;

        let error_text = rep
            .error_text
            .as_deref()
            .map(KerberosString::from_str)
            .transpose()?;

        let error_data = rep
            .error_data
            .as_ref()
            .map(|data| OctetString::new(data.clone()))
            .transpose()
            .map_err(|_| KrbError::DerEncodeOctetString)?;

        let error_checksum = rep
            .error_checksum
            .as_ref()
            .map(|cksum| {
                OctetString::new(cksum.checksum.clone()).map(|checksum| Asn1Checksum {
                    checksum_type: cksum.checksum_type,
                    checksum,
                })
            })
            .transpose()
            .map_err(|_| KrbError::DerEncodeOctetString)?;

        Ok(KdcKrbError {
            pvno: 5,
            msg_type: KrbMessageType::KrbError.into(),
            ctime: rep.client_time.map(KerberosTime::to_wire).transpose()?,
            cusec: rep.client_time.map(|t| t.microseconds()),
            stime: rep.server_time.to_wire()?,
            susec: rep.server_time.microseconds(),
            error_code: rep.code.into(),
            crealm,
            cname,
            service_realm,
            service_name,
            error_text,
            error_data,
            error_checksum,
        })
    }
}
