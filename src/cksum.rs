use crate::asn1::checksum::Checksum as Asn1Checksum;
use crate::asn1::pa_for_user::PaForUser;
use crate::asn1::principal_name::PrincipalName;
use crate::asn1::realm::Realm;
use crate::asn1::OctetString;
use crate::constants::{
    KERB_CHECKSUM_HMAC_MD5, KERB_NON_KERB_CKSUM_SALT, KEY_USAGE_TGS_REQ_AUTH_CKSUM,
};
use crate::error::KrbError;
use crate::proto::SessionKey;
use der::{asn1::Any, Encode};
use tracing::error;

pub(crate) enum ChecksumBuilder {
    //Crc32,
    //RsaMd4,
    //RsaMd5,
    HmacSha196Aes256(SessionKey),
    /// KERB_CHECKSUM_HMAC_MD5 from MS-SFU, keyed with the session key bytes.
    HmacMd5(SessionKey),
}

impl ChecksumBuilder {
    fn value(&self) -> i32 {
        match self {
            //Self::Crc32 => 1,
            //Self::RsaMd4 => 2,
            //Self::RsaMd5 => 7,
            Self::HmacSha196Aes256(k) => k.checksum_type(),
            Self::HmacMd5(_) => KERB_CHECKSUM_HMAC_MD5,
        }
    }

    fn compute(&self, data: &[u8], key_usage: i32) -> Result<Asn1Checksum, KrbError> {
        let checksum = match self {
            Self::HmacSha196Aes256(k) => k.checksum(data, key_usage)?,
            Self::HmacMd5(k) => k.checksum_hmac_md5(data, key_usage)?,
        };

        let checksum = OctetString::new(checksum).map_err(|_| KrbError::DerEncodeOctetString)?;

        Ok(Asn1Checksum {
            checksum_type: self.value(),
            checksum,
        })
    }

    /// The checksum over the DER of the KDC-REQ-BODY that the PA-TGS-REQ
    /// authenticator carries.
    pub(crate) fn compute_kdc_req_body(&self, req_body: &Any) -> Result<Asn1Checksum, KrbError> {
        let req_body = req_body.to_der().map_err(|err| {
            error!(?err, "unable to encode KDC-REQ-BODY");
            KrbError::DerEncodeKdcReqBody
        })?;

        self.compute(req_body.as_slice(), KEY_USAGE_TGS_REQ_AUTH_CKSUM)
    }

    pub(crate) fn compute_pa_for_user(
        &self,
        user_name: &PrincipalName,
        user_realm: &Realm,
        auth_package: &str,
    ) -> Result<Asn1Checksum, KrbError> {
        let data = PaForUser::checksum_input(user_name, user_realm, auth_package);
        self.compute(&data, KERB_NON_KERB_CKSUM_SALT)
    }
}

impl From<SessionKey> for ChecksumBuilder {
    fn from(key: SessionKey) -> Self {
        match key {
            SessionKey::Aes256CtsHmacSha196 { k: _ } => ChecksumBuilder::HmacSha196Aes256(key),
        }
    }
}
