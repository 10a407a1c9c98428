mod padata;
mod reply;
pub(crate) mod request;
mod time;

pub use self::padata::{ETypeInfo2Entry, ETypeInfoEntry, PaData};
pub use self::reply::{
    ErrorChecksum, ErrorReply, KerberosReply, MethodDataPolicy, PreauthHints, SaltEntry,
    TicketGrantReply,
};
pub use self::request::{KerberosRequest, TicketGrantRequest, TicketGrantRequestBuilder};
pub use self::time::{
    is_within_allowed_skew, maximum_clock_skew, ClockSource, KerberosClock, KerberosTime,
    SystemClockSource,
};
pub use crate::asn1::constants::{EncryptionType, KrbErrorCode, PaDataType};
pub use crate::asn1::ticket_flags::TicketFlags;

use crate::asn1::{
    constants::PrincipalNameType,
    enc_kdc_rep_part::EncKdcRepPart as Asn1EncKdcRepPart,
    encrypted_data::EncryptedData as KdcEncryptedData,
    encryption_key::EncryptionKey as KdcEncryptionKey,
    kerberos_string::KerberosString,
    principal_name::PrincipalName,
    realm::Realm,
    tagged_ticket::{TaggedTicket as Asn1Ticket, Ticket as Asn1TicketInner},
    OctetString,
};
use crate::constants::AES_256_KEY_LEN;
use crate::crypto::{checksum_aes256, checksum_hmac_md5, seal_aes256, unseal_aes256};
use crate::error::KrbError;
use der::{Decode, Encode};
use std::fmt;
use std::str::FromStr;
use tracing::{error, trace};

#[derive(Clone, PartialEq, Eq)]
pub enum SessionKey {
    Aes256CtsHmacSha196 { k: [u8; AES_256_KEY_LEN] },
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("SessionKey");
        match self {
            SessionKey::Aes256CtsHmacSha196 { .. } => builder.field("k", &"Aes256"),
        }
        .finish()
    }
}

impl TryFrom<&SessionKey> for KdcEncryptionKey {
    type Error = KrbError;

    fn try_from(key: &SessionKey) -> Result<KdcEncryptionKey, KrbError> {
        match key {
            SessionKey::Aes256CtsHmacSha196 { k } => {
                let key_value = OctetString::new(*k).map_err(|_| KrbError::DerEncodeOctetString)?;

                Ok(KdcEncryptionKey {
                    key_type: EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32,
                    key_value,
                })
            }
        }
    }
}

impl TryFrom<KdcEncryptionKey> for SessionKey {
    type Error = KrbError;

    fn try_from(kdc_enc_key: KdcEncryptionKey) -> Result<SessionKey, KrbError> {
        let etype: EncryptionType = EncryptionType::try_from(kdc_enc_key.key_type)
            .map_err(|_| KrbError::UnsupportedEncryption)?;

        match etype {
            EncryptionType::AES256_CTS_HMAC_SHA1_96 => {
                let k: [u8; AES_256_KEY_LEN] =
                    kdc_enc_key.key_value.as_bytes().try_into().map_err(|_| {
                        error!(
                            key_len = kdc_enc_key.key_value.as_bytes().len(),
                            "session key has the wrong length"
                        );
                        KrbError::InvalidEncryptionKey
                    })?;

                Ok(SessionKey::Aes256CtsHmacSha196 { k })
            }
            _ => {
                error!(?etype, "session key encryption type is not supported");
                Err(KrbError::UnsupportedEncryption)
            }
        }
    }
}

impl SessionKey {
    pub fn from_aes256(k: [u8; AES_256_KEY_LEN]) -> Self {
        SessionKey::Aes256CtsHmacSha196 { k }
    }

    pub fn etype(&self) -> EncryptionType {
        match self {
            SessionKey::Aes256CtsHmacSha196 { .. } => EncryptionType::AES256_CTS_HMAC_SHA1_96,
        }
    }

    /// The RFC3961 checksum type that [SessionKey::checksum] produces.
    pub(crate) fn checksum_type(&self) -> i32 {
        match self {
            // hmac-sha1-96-aes256
            SessionKey::Aes256CtsHmacSha196 { .. } => 16,
        }
    }

    pub(crate) fn checksum(&self, data: &[u8], key_usage: i32) -> Result<Vec<u8>, KrbError> {
        match self {
            SessionKey::Aes256CtsHmacSha196 { k } => checksum_aes256(data, k, key_usage),
        }
    }

    /// The keyed HMAC-MD5 checksum carried by PA-FOR-USER. Windows KDCs
    /// require this type regardless of the session key encryption type.
    pub(crate) fn checksum_hmac_md5(&self, data: &[u8], key_usage: i32) -> Result<Vec<u8>, KrbError> {
        match self {
            SessionKey::Aes256CtsHmacSha196 { k } => checksum_hmac_md5(data, k, key_usage),
        }
    }

    pub(crate) fn encrypt(&self, data: &[u8], key_usage: i32) -> Result<EncryptedData, KrbError> {
        match self {
            SessionKey::Aes256CtsHmacSha196 { k } => seal_aes256(k, data, key_usage)
                .map(|data| EncryptedData::Aes256CtsHmacSha196 { kvno: None, data }),
        }
    }

    pub(crate) fn decrypt(
        &self,
        enc_data: &EncryptedData,
        key_usage: i32,
    ) -> Result<Vec<u8>, KrbError> {
        match (enc_data, self) {
            (
                EncryptedData::Aes256CtsHmacSha196 { kvno: _, data },
                SessionKey::Aes256CtsHmacSha196 { k },
            ) => unseal_aes256(k, data, key_usage),
            (EncryptedData::Opaque { etype, .. }, SessionKey::Aes256CtsHmacSha196 { .. }) => {
                error!(?etype, "encrypted data does not match the session key type");
                Err(KrbError::UnsupportedEncryption)
            }
        }
    }
}

/// Encrypted data as carried on the wire. Only AES256-CTS-HMAC-SHA1-96 can be
/// decrypted, every other type is carried through opaquely, which is the
/// normal case for service tickets encrypted in a key we never hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedData {
    Aes256CtsHmacSha196 {
        kvno: Option<u32>,
        data: Vec<u8>,
    },
    Opaque {
        etype: i32,
        kvno: Option<u32>,
        data: Vec<u8>,
    },
}

impl EncryptedData {
    pub fn etype(&self) -> i32 {
        match self {
            EncryptedData::Aes256CtsHmacSha196 { .. } => {
                EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32
            }
            EncryptedData::Opaque { etype, .. } => *etype,
        }
    }
}

impl From<KdcEncryptedData> for EncryptedData {
    fn from(enc_data: KdcEncryptedData) -> Self {
        let kvno = enc_data.kvno;
        let data = enc_data.cipher.into_bytes();

        match EncryptionType::try_from(enc_data.etype) {
            Ok(EncryptionType::AES256_CTS_HMAC_SHA1_96) => {
                EncryptedData::Aes256CtsHmacSha196 { kvno, data }
            }
            _ => EncryptedData::Opaque {
                etype: enc_data.etype,
                kvno,
                data,
            },
        }
    }
}

impl TryFrom<EncryptedData> for KdcEncryptedData {
    type Error = KrbError;

    fn try_from(value: EncryptedData) -> Result<KdcEncryptedData, KrbError> {
        let etype = value.etype();
        let (kvno, data) = match value {
            EncryptedData::Aes256CtsHmacSha196 { kvno, data }
            | EncryptedData::Opaque { kvno, data, .. } => (kvno, data),
        };

        let cipher = OctetString::new(data).map_err(|err| {
            error!(?err, "unable to encode cipher text");
            KrbError::DerEncodeOctetString
        })?;

        Ok(KdcEncryptedData {
            etype,
            kvno,
            cipher,
        })
    }
}

/// A ticket as it is handed to a KDC or a service. Apart from the realm and
/// the service name it names, it is an opaque blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncTicket {
    tkt_vno: i8,
    service: Name,
    enc_part: EncryptedData,
}

impl EncTicket {
    pub fn new(service: Name, enc_part: EncryptedData) -> Self {
        EncTicket {
            tkt_vno: 5,
            service,
            enc_part,
        }
    }

    pub fn service(&self) -> &Name {
        &self.service
    }

    /// The realm of the KDC that issued this ticket.
    pub fn realm(&self) -> &str {
        self.service.realm()
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        let tkt = Asn1Ticket::from_der(bytes).map_err(|err| {
            error!(?err, "unable to decode ticket");
            KrbError::DerDecodeTicket
        })?;
        EncTicket::try_from(tkt)
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let tkt: Asn1Ticket = self.clone().try_into()?;
        tkt.to_der().map_err(|err| {
            error!(?err, "unable to encode ticket");
            KrbError::DerEncodeTicket
        })
    }
}

impl TryFrom<Asn1Ticket> for EncTicket {
    type Error = KrbError;

    fn try_from(tkt: Asn1Ticket) -> Result<Self, Self::Error> {
        let tkt: Asn1TicketInner = tkt.into();

        if tkt.tkt_vno != 5 {
            error!(tkt_vno = tkt.tkt_vno, "unsupported ticket version");
            return Err(KrbError::InvalidPvno);
        }

        let service = Name::try_from((tkt.sname, tkt.realm))?;
        let enc_part = EncryptedData::from(tkt.enc_part);

        Ok(EncTicket {
            tkt_vno: tkt.tkt_vno,
            service,
            enc_part,
        })
    }
}

impl TryFrom<EncTicket> for Asn1Ticket {
    type Error = KrbError;

    fn try_from(value: EncTicket) -> Result<Asn1Ticket, KrbError> {
        let (sname, realm): (PrincipalName, Realm) = (&value.service).try_into()?;
        let t = Asn1TicketInner {
            tkt_vno: value.tkt_vno,
            realm,
            sname,
            enc_part: value.enc_part.try_into()?,
        };
        Ok(Asn1Ticket::new(t))
    }
}

/// The validity times of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketTimes {
    pub auth_time: KerberosTime,
    pub start_time: Option<KerberosTime>,
    pub end_time: KerberosTime,
    pub renew_until: Option<KerberosTime>,
}

/// The decrypted part of a TGS-REP.
#[derive(Debug, Clone)]
pub struct KdcReplyPart {
    pub(crate) key: SessionKey,
    pub(crate) nonce: i32,
    pub(crate) flags: TicketFlags,
    pub(crate) times: TicketTimes,
    pub(crate) server: Name,
}

impl TryFrom<Asn1EncKdcRepPart> for KdcReplyPart {
    type Error = KrbError;

    fn try_from(enc_kdc_rep_part: Asn1EncKdcRepPart) -> Result<Self, Self::Error> {
        trace!(?enc_kdc_rep_part);

        let key = SessionKey::try_from(enc_kdc_rep_part.key)?;
        let server = Name::try_from((enc_kdc_rep_part.server_name, enc_kdc_rep_part.server_realm))?;

        let times = TicketTimes {
            auth_time: KerberosTime::from(enc_kdc_rep_part.auth_time),
            start_time: enc_kdc_rep_part.start_time.map(KerberosTime::from),
            end_time: KerberosTime::from(enc_kdc_rep_part.end_time),
            renew_until: enc_kdc_rep_part.renew_till.map(KerberosTime::from),
        };

        Ok(KdcReplyPart {
            key,
            nonce: enc_kdc_rep_part.nonce,
            flags: enc_kdc_rep_part.flags,
            times,
            server,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum Name {
    Principal {
        name: String,
        realm: String,
    },
    // Thanks to MIT KRB, it incorrectly sometimes uses name type 1 and 3 for
    // these two. So we have to store them as separate things, but they also need
    // to compare the same :(
    SrvPrincipal {
        service: String,
        host: String,
        realm: String,
    },
    SrvHst {
        service: String,
        host: String,
        realm: String,
    },
    SrvInst {
        service: String,
        instance: Vec<String>,
        realm: String,
    },
}

const KRBTGT: &str = "krbtgt";

impl Name {
    pub fn principal(name: &str, realm: &str) -> Self {
        Self::Principal {
            name: name.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service(srvname: &str, hostname: &str, realm: &str) -> Self {
        Self::SrvHst {
            service: srvname.to_string(),
            host: hostname.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service_krbtgt(realm: &str) -> Self {
        Self::cross_realm_krbtgt(realm, realm)
    }

    /*
     * RFC4120, section 7.3, Name of the TGS
     *
     * A TGT issued by the ATHENA.MIT.EDU realm to be used to get tickets from the
     * MIT.EDU realm has a principal identifier of "ATHENA.MIT.EDU" (realm),
     * ("krbtgt", "MIT.EDU") (name).
     */
    pub fn cross_realm_krbtgt(target_realm: &str, issuing_realm: &str) -> Self {
        Self::SrvInst {
            service: KRBTGT.to_string(),
            instance: vec![target_realm.to_string()],
            realm: issuing_realm.to_string(),
        }
    }

    pub fn realm(&self) -> &str {
        match self {
            Name::Principal { realm, .. }
            | Name::SrvPrincipal { realm, .. }
            | Name::SrvHst { realm, .. }
            | Name::SrvInst { realm, .. } => realm.as_str(),
        }
    }

    /// If this names a ticket granting service, the realm that accepts its
    /// tickets.
    pub fn krbtgt_instance(&self) -> Option<&str> {
        match self {
            Name::SrvInst {
                service, instance, ..
            } if service == KRBTGT => match instance.as_slice() {
                [target] => Some(target.as_str()),
                _ => None,
            },
            // Heimdal and MIT will both send this with a name type of 1 or 3.
            Name::SrvPrincipal { service, host, .. } | Name::SrvHst { service, host, .. }
                if service == KRBTGT =>
            {
                Some(host.as_str())
            }
            _ => None,
        }
    }

    /// MIT KRB often confuses SrvHst and SrvPrincipal (name types 1 and 3). This
    /// normalises SrvHst to SrvPrincipal to assist with name matching.
    ///
    /// MS Windows uses SrvInst instead of SrvHst in TGS-REQ. This normalises
    /// SrvInst to SrvPrincipal if there is only one instance component.
    pub fn service_hst_normalise(self) -> Self {
        match self {
            Self::SrvHst {
                service,
                host,
                realm,
            } => Self::SrvPrincipal {
                service,
                host,
                realm,
            },
            Self::SrvInst {
                service,
                mut instance,
                realm,
            } if instance.len() == 1 => Self::SrvPrincipal {
                service,
                host: instance.remove(0),
                realm,
            },
            ignore => ignore,
        }
    }

    /// True when both names identify the same principal, ignoring the name
    /// type hints that implementations disagree on.
    pub fn same_principal(&self, other: &Name) -> bool {
        self.clone().service_hst_normalise() == other.clone().service_hst_normalise()
    }

    fn components(&self) -> (PrincipalNameType, Vec<&str>) {
        match self {
            Name::Principal { name, .. } => (PrincipalNameType::NtPrincipal, vec![name.as_str()]),
            Name::SrvPrincipal { service, host, .. } => (
                PrincipalNameType::NtPrincipal,
                vec![service.as_str(), host.as_str()],
            ),
            Name::SrvHst { service, host, .. } => (
                PrincipalNameType::NtSrvHst,
                vec![service.as_str(), host.as_str()],
            ),
            Name::SrvInst {
                service, instance, ..
            } => (
                PrincipalNameType::NtSrvInst,
                std::iter::once(service.as_str())
                    .chain(instance.iter().map(String::as_str))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, components) = self.components();
        write!(f, "{}@{}", components.join("/"), self.realm())
    }
}

impl From<&Name> for String {
    fn from(val: &Name) -> Self {
        val.to_string()
    }
}

/// Parses `name@REALM`, `service/host@REALM` and `krbtgt/TARGET@REALM`.
impl FromStr for Name {
    type Err = KrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, realm)) = s.rsplit_once('@') else {
            error!(name = %s, "principal name has no realm");
            return Err(KrbError::MissingRealm);
        };

        if realm.is_empty() {
            error!(name = %s, "principal name has an empty realm");
            return Err(KrbError::MissingRealm);
        }

        let components: Vec<&str> = name.split('/').collect();
        if components.iter().any(|c| c.is_empty()) {
            error!(name = %s, "principal name has an empty component");
            return Err(KrbError::PrincipalNameInvalidComponents);
        }

        match components.as_slice() {
            [name] => Ok(Name::principal(name, realm)),
            [service, instance @ ..] if *service == KRBTGT => Ok(Name::SrvInst {
                service: service.to_string(),
                instance: instance.iter().map(|i| i.to_string()).collect(),
                realm: realm.to_string(),
            }),
            [service, host] => Ok(Name::service(service, host, realm)),
            [service, instance @ ..] => Ok(Name::SrvInst {
                service: service.to_string(),
                instance: instance.iter().map(|i| i.to_string()).collect(),
                realm: realm.to_string(),
            }),
            [] => Err(KrbError::NameNumberOfComponents),
        }
    }
}

impl TryFrom<&Name> for Realm {
    type Error = KrbError;

    fn try_from(name: &Name) -> Result<Realm, KrbError> {
        KerberosString::from_str(name.realm())
    }
}

impl TryFrom<&Name> for PrincipalName {
    type Error = KrbError;

    fn try_from(name: &Name) -> Result<PrincipalName, KrbError> {
        let (name_type, components) = name.components();

        let name_string = components
            .into_iter()
            .map(KerberosString::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PrincipalName {
            name_type: name_type as i32,
            name_string,
        })
    }
}

impl TryFrom<&Name> for (PrincipalName, Realm) {
    type Error = KrbError;

    fn try_from(name: &Name) -> Result<(PrincipalName, Realm), KrbError> {
        Ok((PrincipalName::try_from(name)?, Realm::try_from(name)?))
    }
}

impl TryFrom<(&PrincipalName, &Realm)> for Name {
    type Error = KrbError;

    fn try_from((princ, realm): (&PrincipalName, &Realm)) -> Result<Self, Self::Error> {
        let PrincipalName {
            name_type,
            name_string,
        } = princ;

        let name_type: PrincipalNameType = (*name_type).try_into().map_err(|err| {
            error!(?err, ?name_type, "invalid principal name type");
            KrbError::PrincipalNameInvalidType
        })?;

        trace!(?name_type, ?name_string);

        // IMPORTANT!!!!!
        // MIT KRB5 has a bug in it's KVNO tool that causes it to send NtSrvHst as
        // NtPrinc instead. We need to detect this by checking how many elements are in the
        // name string and working around it!
        match name_type {
            PrincipalNameType::NtPrincipal
            | PrincipalNameType::NtUnknown
            | PrincipalNameType::NtEnterprise => match name_string.as_slice() {
                [name] => Ok(Name::Principal {
                    name: name.to_string(),
                    realm: realm.into(),
                }),
                [service, host] => Ok(Name::SrvPrincipal {
                    service: service.to_string(),
                    host: host.to_string(),
                    realm: realm.into(),
                }),
                _ => Err(KrbError::NameNumberOfComponents),
            },
            PrincipalNameType::NtSrvInst => {
                let (service, instance) = name_string
                    .split_first()
                    .ok_or(KrbError::NameNumberOfComponents)?;
                Ok(Name::SrvInst {
                    service: service.into(),
                    instance: instance.iter().map(|x| x.into()).collect(),
                    realm: realm.into(),
                })
            }
            PrincipalNameType::NtSrvHst => match name_string.as_slice() {
                [service, host] => Ok(Name::SrvHst {
                    service: service.to_string(),
                    host: host.to_string(),
                    realm: realm.into(),
                }),
                _ => Err(KrbError::NameNumberOfComponents),
            },
            _ => Err(KrbError::PrincipalNameInvalidType),
        }
    }
}

impl TryFrom<(PrincipalName, Realm)> for Name {
    type Error = KrbError;

    fn try_from((princ, realm): (PrincipalName, Realm)) -> Result<Self, Self::Error> {
        Self::try_from((&princ, &realm))
    }
}

/// A ticket together with the session key and the metadata needed to use it.
/// Values are never changed once built; [KerberosCredentials::reset_delegate]
/// returns a new value.
#[derive(Debug, Clone)]
pub struct KerberosCredentials {
    client: Name,
    server: Name,
    session_key: SessionKey,
    ticket: EncTicket,
    flags: TicketFlags,
    times: TicketTimes,
}

impl KerberosCredentials {
    pub fn new(
        client: Name,
        server: Name,
        session_key: SessionKey,
        ticket: EncTicket,
        flags: TicketFlags,
        times: TicketTimes,
    ) -> Self {
        KerberosCredentials {
            client,
            server,
            session_key,
            ticket,
            flags,
            times,
        }
    }

    pub(crate) fn from_reply(client: Name, ticket: EncTicket, kdc_reply: KdcReplyPart) -> Self {
        KerberosCredentials {
            client,
            server: kdc_reply.server,
            session_key: kdc_reply.key,
            ticket,
            flags: kdc_reply.flags,
            times: kdc_reply.times,
        }
    }

    pub fn client(&self) -> &Name {
        &self.client
    }

    pub fn server(&self) -> &Name {
        &self.server
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    pub fn ticket(&self) -> &EncTicket {
        &self.ticket
    }

    pub fn flags(&self) -> TicketFlags {
        self.flags
    }

    pub fn times(&self) -> &TicketTimes {
        &self.times
    }

    pub fn is_forwardable(&self) -> bool {
        self.flags.contains(TicketFlags::Forwardable)
    }

    pub fn ok_as_delegate(&self) -> bool {
        self.flags.contains(TicketFlags::OkAsDelegate)
    }

    /// The realm whose KDC accepts this credential. For a ticket granting
    /// ticket `krbtgt/B@A` this is `B`, for anything else it is the realm of
    /// the server.
    pub fn target_realm(&self) -> &str {
        self.server
            .krbtgt_instance()
            .unwrap_or_else(|| self.server.realm())
    }

    /// A copy of these credentials with OK-AS-DELEGATE cleared.
    pub fn reset_delegate(&self) -> Self {
        let mut creds = self.clone();
        creds.flags &= !TicketFlags::OkAsDelegate;
        creds
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_SESSION_KEY: [u8; AES_256_KEY_LEN] = [
        0x16, 0x73, 0x91, 0xF6, 0x4D, 0xA0, 0x6D, 0xDE, 0x35, 0x75, 0x2A, 0xFC, 0x11, 0x0D, 0xCF,
        0x6B, 0xFD, 0x79, 0x7B, 0xF2, 0xB6, 0x40, 0x27, 0xC9, 0x89, 0x41, 0xAC, 0xDB, 0xDE, 0x3C,
        0x35, 0x6B,
    ];

    pub(crate) fn test_times() -> TicketTimes {
        let auth_time = KerberosTime::new(1_728_592_703_000, 0).expect("valid time");
        TicketTimes {
            auth_time,
            start_time: Some(auth_time),
            end_time: KerberosTime::new(1_728_679_103_000, 0).expect("valid time"),
            renew_until: None,
        }
    }

    pub(crate) fn test_ticket(service: &Name) -> EncTicket {
        EncTicket::new(
            service.clone(),
            EncryptedData::Opaque {
                etype: EncryptionType::RC4_HMAC as i32,
                kvno: Some(2),
                data: vec![0xAB; 48],
            },
        )
    }

    pub(crate) fn test_creds(client: &str, server: &str, flags: TicketFlags) -> KerberosCredentials {
        let client = Name::from_str(client).expect("valid client");
        let server = Name::from_str(server).expect("valid server");
        let ticket = test_ticket(&server);
        KerberosCredentials::new(
            client,
            server,
            SessionKey::from_aes256(TEST_SESSION_KEY),
            ticket,
            flags,
            test_times(),
        )
    }

    #[test]
    fn name_from_str() {
        assert_eq!(
            Name::from_str("alice@EXAMPLE.COM").expect("valid"),
            Name::principal("alice", "EXAMPLE.COM")
        );
        assert_eq!(
            Name::from_str("HTTP/www.example.com@EXAMPLE.COM").expect("valid"),
            Name::service("HTTP", "www.example.com", "EXAMPLE.COM")
        );
        assert_eq!(
            Name::from_str("krbtgt/OTHER.ORG@EXAMPLE.COM").expect("valid"),
            Name::cross_realm_krbtgt("OTHER.ORG", "EXAMPLE.COM")
        );
        assert!(matches!(
            Name::from_str("alice"),
            Err(KrbError::MissingRealm)
        ));
        assert!(matches!(
            Name::from_str("alice@"),
            Err(KrbError::MissingRealm)
        ));
        assert!(matches!(
            Name::from_str("HTTP//host@EXAMPLE.COM"),
            Err(KrbError::PrincipalNameInvalidComponents)
        ));
    }

    #[test]
    fn name_display_round_trip() {
        for s in [
            "alice@EXAMPLE.COM",
            "HTTP/www.example.com@EXAMPLE.COM",
            "krbtgt/OTHER.ORG@EXAMPLE.COM",
            "ldap/dc1.example.com/example.com@EXAMPLE.COM",
        ] {
            let name = Name::from_str(s).expect("valid");
            assert_eq!(name.to_string(), s);
        }
    }

    #[test]
    fn name_krbtgt_instance() {
        let name = Name::cross_realm_krbtgt("B.ORG", "A.ORG");
        assert_eq!(name.krbtgt_instance(), Some("B.ORG"));
        assert_eq!(name.realm(), "A.ORG");

        let mit = Name::SrvPrincipal {
            service: "krbtgt".to_string(),
            host: "B.ORG".to_string(),
            realm: "A.ORG".to_string(),
        };
        assert_eq!(mit.krbtgt_instance(), Some("B.ORG"));

        assert_eq!(
            Name::service("HTTP", "www", "A.ORG").krbtgt_instance(),
            None
        );
        assert_eq!(Name::principal("krbtgt", "A.ORG").krbtgt_instance(), None);
    }

    #[test]
    fn name_same_principal_ignores_name_type() {
        let hst = Name::service("HTTP", "www.example.com", "EXAMPLE.COM");
        let prn = Name::SrvPrincipal {
            service: "HTTP".to_string(),
            host: "www.example.com".to_string(),
            realm: "EXAMPLE.COM".to_string(),
        };
        let inst = Name::SrvInst {
            service: "HTTP".to_string(),
            instance: vec!["www.example.com".to_string()],
            realm: "EXAMPLE.COM".to_string(),
        };
        assert!(hst.same_principal(&prn));
        assert!(hst.same_principal(&inst));
        assert!(!hst.same_principal(&Name::service("HTTP", "www.example.com", "OTHER.ORG")));
    }

    #[test]
    fn name_principal_name_conversion() {
        let name = Name::cross_realm_krbtgt("B.ORG", "A.ORG");
        let (pn, realm): (PrincipalName, Realm) = (&name).try_into().expect("encodable");
        assert_eq!(pn.name_type, PrincipalNameType::NtSrvInst as i32);
        assert_eq!(realm.as_str(), "A.ORG");
        let back = Name::try_from((&pn, &realm)).expect("decodable");
        assert_eq!(back, name);

        // MIT style service principal with NT-PRINCIPAL
        let pn = PrincipalName::try_from((1, "host/localhost")).expect("valid");
        let back = Name::try_from((&pn, &realm)).expect("decodable");
        assert!(back.same_principal(&Name::service("host", "localhost", "A.ORG")));
    }

    #[test]
    fn enc_ticket_der_round_trip() {
        let service = Name::service("HTTP", "www.example.com", "EXAMPLE.COM");
        let ticket = test_ticket(&service);
        let der_bytes = ticket.to_der().expect("encodable");
        // [APPLICATION 1]
        assert_eq!(der_bytes[0], 0x61);
        let decoded = EncTicket::from_der(&der_bytes).expect("decodable");
        assert_eq!(decoded, ticket);
        assert_eq!(decoded.realm(), "EXAMPLE.COM");
    }

    #[test]
    fn session_key_encrypt_decrypt() {
        let key = SessionKey::from_aes256(TEST_SESSION_KEY);
        let enc = key.encrypt(b"some ticket bytes", 8).expect("encrypts");
        assert_eq!(enc.etype(), EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32);
        let dec = key.decrypt(&enc, 8).expect("decrypts");
        assert_eq!(dec, b"some ticket bytes");
        assert!(matches!(
            key.decrypt(&enc, 9),
            Err(KrbError::MessageAuthenticationFailed)
        ));
    }

    #[test]
    fn session_key_from_wrong_length() {
        let short = KdcEncryptionKey {
            key_type: EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32,
            key_value: OctetString::new(vec![0u8; 16]).expect("octets"),
        };
        assert!(matches!(
            SessionKey::try_from(short),
            Err(KrbError::InvalidEncryptionKey)
        ));

        let rc4 = KdcEncryptionKey {
            key_type: EncryptionType::RC4_HMAC as i32,
            key_value: OctetString::new(vec![0u8; 16]).expect("octets"),
        };
        assert!(matches!(
            SessionKey::try_from(rc4),
            Err(KrbError::UnsupportedEncryption)
        ));
    }

    #[test]
    fn credentials_reset_delegate() {
        let creds = test_creds(
            "alice@A.ORG",
            "krbtgt/B.ORG@A.ORG",
            TicketFlags::OkAsDelegate | TicketFlags::Forwardable,
        );
        assert!(creds.ok_as_delegate());
        assert_eq!(creds.target_realm(), "B.ORG");

        let reset = creds.reset_delegate();
        assert!(!reset.ok_as_delegate());
        assert!(reset.is_forwardable());
        assert_eq!(reset.client(), creds.client());
        assert_eq!(reset.server(), creds.server());
        assert_eq!(reset.ticket(), creds.ticket());
        assert_eq!(reset.times(), creds.times());
        // The original is untouched.
        assert!(creds.ok_as_delegate());
    }
}
