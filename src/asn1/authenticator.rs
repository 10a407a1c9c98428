use super::{
    authorization_data::AuthorizationData, checksum::Checksum, encryption_key::EncryptionKey,
    kerberos_time::KerberosTime, microseconds::Microseconds, principal_name::PrincipalName,
    realm::Realm,
};
use der::{Decode, DecodeValue, Encode, EncodeValue, FixedTag, Sequence, Tag, TagNumber};

/// ```text
/// Authenticator   ::= [APPLICATION 2] SEQUENCE  {
///        authenticator-vno       [0] INTEGER (5),
///        crealm                  [1] Realm,
///        cname                   [2] PrincipalName,
///        cksum                   [3] Checksum OPTIONAL,
///        cusec                   [4] Microseconds,
///        ctime                   [5] KerberosTime,
///        subkey                  [6] EncryptionKey OPTIONAL,
///        seq-number              [7] UInt32 OPTIONAL,
///        authorization-data      [8] AuthorizationData OPTIONAL
/// }
///```
#[derive(Debug, Eq, PartialEq, Sequence)]
pub(crate) struct AuthenticatorInner {
    #[asn1(context_specific = "0")]
    pub(crate) authenticator_vno: u8,
    #[asn1(context_specific = "1")]
    pub(crate) crealm: Realm,
    #[asn1(context_specific = "2")]
    pub(crate) cname: PrincipalName,
    // Key usage 6 over the TGS-REQ body when carried in PA-TGS-REQ.
    #[asn1(context_specific = "3", optional = "true")]
    pub(crate) cksum: Option<Checksum>,
    #[asn1(context_specific = "4")]
    pub(crate) cusec: Microseconds,
    #[asn1(context_specific = "5")]
    pub(crate) ctime: KerberosTime,
    #[asn1(context_specific = "6", optional = "true")]
    pub(crate) subkey: Option<EncryptionKey>,
    #[asn1(context_specific = "7", optional = "true")]
    pub(crate) seq_number: Option<u32>,
    #[asn1(context_specific = "8", optional = "true")]
    pub(crate) authorization_data: Option<AuthorizationData>,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Authenticator(AuthenticatorInner);

impl Authenticator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        client_name: PrincipalName,
        client_realm: Realm,
        ctime: KerberosTime,
        cusec: Microseconds,
        checksum: Option<Checksum>,
        subkey: Option<EncryptionKey>,
        sequence_number: Option<u32>,
        authorization_data: Option<AuthorizationData>,
    ) -> Self {
        Self(AuthenticatorInner {
            authenticator_vno: 5,
            crealm: client_realm,
            cname: client_name,
            cksum: checksum,
            cusec,
            ctime,
            subkey,
            seq_number: sequence_number,
            authorization_data,
        })
    }
}

impl FixedTag for Authenticator {
    const TAG: Tag = Tag::Application {
        constructed: true,
        number: TagNumber(2),
    };
}

impl<'a> DecodeValue<'a> for Authenticator {
    type Error = der::Error;

    fn decode_value<R: der::Reader<'a>>(reader: &mut R, _header: der::Header) -> der::Result<Self> {
        let inner: AuthenticatorInner = AuthenticatorInner::decode(reader)?;
        Ok(Self(inner))
    }
}

impl EncodeValue for Authenticator {
    fn value_len(&self) -> der::Result<der::Length> {
        self.0.encoded_len()
    }

    fn encode_value(&self, encoder: &mut impl der::Writer) -> der::Result<()> {
        self.0.encode(encoder)
    }
}

impl From<Authenticator> for AuthenticatorInner {
    fn from(value: Authenticator) -> AuthenticatorInner {
        value.0
    }
}
