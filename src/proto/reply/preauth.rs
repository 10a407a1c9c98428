use super::ErrorReply;
use crate::constants::RFC_PBKDF2_SHA1_ITER;
use crate::crypto::string_to_key_aes256;
use crate::error::KrbError;
use crate::proto::{
    ETypeInfo2Entry, ETypeInfoEntry, EncryptionType, KrbErrorCode, Name, PaData, PaDataType,
    SessionKey,
};
use std::collections::BTreeSet;
use tracing::{debug, error, trace, warn};

/// The error codes whose e-data is a METHOD-DATA. For every other code the
/// e-data is implementation defined and is never parsed as PA-DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDataPolicy {
    codes: BTreeSet<i32>,
}

impl Default for MethodDataPolicy {
    fn default() -> Self {
        MethodDataPolicy::new([
            KrbErrorCode::KdcErrPreauthFailed,
            KrbErrorCode::KdcErrPreauthRequired,
        ])
    }
}

impl MethodDataPolicy {
    pub fn new<I, C>(codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<i32>,
    {
        MethodDataPolicy {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn carries_method_data(&self, code: KrbErrorCode) -> bool {
        self.codes.contains(&i32::from(code))
    }

    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.codes.iter().copied()
    }
}

/// A salt offered by the KDC for one encryption type. ETYPE-INFO salts are
/// octets and ETYPE-INFO2 salts are strings, both are kept as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltEntry {
    pub etype: i32,
    pub salt: Option<Vec<u8>>,
    pub s2kparams: Option<Vec<u8>>,
}

/// What a KRB-ERROR tells a client about how to pre-authenticate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreauthHints {
    salts: Vec<SaltEntry>,
    preferred_etype: Option<i32>,
}

impl PreauthHints {
    /// Read the pre-authentication hints out of a KRB-ERROR. Only the error
    /// code decides whether the e-data is read: for codes outside `policy`
    /// the result is empty hints, not an error.
    pub fn interpret(err: &ErrorReply, policy: &MethodDataPolicy) -> Result<Self, KrbError> {
        let mut hints = PreauthHints::default();

        if !policy.carries_method_data(err.code()) {
            trace!(code = ?err.code(), "e-data is not METHOD-DATA for this error code");
            return Ok(hints);
        }

        let Some(edata) = err.error_data() else {
            debug!(code = ?err.code(), "KRB-ERROR carries no e-data");
            return Ok(hints);
        };

        let method_data = PaData::decode_method_data(edata).map_err(|_| {
            error!(code = ?err.code(), "e-data is not a valid METHOD-DATA");
            KrbError::PreAuthDataMalformed
        })?;

        for pa in method_data.iter() {
            match PaDataType::try_from(pa.padata_type) {
                Ok(PaDataType::PaEtypeInfo) => {
                    let entries = ETypeInfoEntry::decode_sequence(&pa.padata_value)
                        .map_err(|_| KrbError::PreAuthDataMalformed)?;
                    for entry in entries {
                        hints.record(entry.etype, entry.salt, None);
                    }
                }
                Ok(PaDataType::PaEtypeInfo2) => {
                    let entries = ETypeInfo2Entry::decode_sequence(&pa.padata_value)
                        .map_err(|_| KrbError::PreAuthDataMalformed)?;
                    for entry in entries {
                        hints.record(
                            entry.etype,
                            entry.salt.map(String::into_bytes),
                            entry.s2kparams,
                        );
                    }
                }
                _ => {
                    trace!(padata_type = pa.padata_type, "ignoring padata");
                }
            }
        }

        debug!(salts = hints.salts.len(), preferred_etype = ?hints.preferred_etype);
        Ok(hints)
    }

    /// As [PreauthHints::interpret], but a malformed METHOD-DATA only yields
    /// empty hints.
    pub fn interpret_lossy(err: &ErrorReply, policy: &MethodDataPolicy) -> Self {
        PreauthHints::interpret(err, policy).unwrap_or_else(|e| {
            warn!(?e, code = ?err.code(), "unable to read pre-authentication hints");
            PreauthHints::default()
        })
    }

    fn record(&mut self, etype: i32, salt: Option<Vec<u8>>, s2kparams: Option<Vec<u8>>) {
        if self.preferred_etype.is_none() && etype != 0 {
            self.preferred_etype = Some(etype);
        }
        self.salts.push(SaltEntry {
            etype,
            salt,
            s2kparams,
        });
    }

    pub fn salts(&self) -> &[SaltEntry] {
        &self.salts
    }

    pub fn preferred_etype(&self) -> Option<i32> {
        self.preferred_etype
    }

    pub fn is_empty(&self) -> bool {
        self.salts.is_empty() && self.preferred_etype.is_none()
    }

    /// Derive the long term key of `client` from a passphrase, using the salt
    /// and iteration count the KDC offered for AES256-CTS-HMAC-SHA1-96. With
    /// no hints at all the RFC default salt (realm then name components) and
    /// iteration count are used.
    pub fn derive_key(&self, passphrase: &[u8], client: &Name) -> Result<SessionKey, KrbError> {
        let aes256 = EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32;

        let entry = self.salts.iter().find(|entry| entry.etype == aes256);

        if entry.is_none() && !self.salts.is_empty() {
            error!(
                preferred_etype = ?self.preferred_etype,
                "KDC offered no salt for a supported encryption type"
            );
            return Err(KrbError::UnsupportedEncryption);
        }

        let salt = match entry.and_then(|e| e.salt.clone()) {
            Some(salt) => salt,
            None => Self::default_salt(client),
        };

        let iter_count = match entry.and_then(|e| e.s2kparams.as_deref()) {
            Some(params) => {
                let params: [u8; 4] = params.try_into().map_err(|_| {
                    error!(len = params.len(), "s2kparams must be four octets");
                    KrbError::PreauthInvalidS2KParams
                })?;
                u32::from_be_bytes(params)
            }
            None => RFC_PBKDF2_SHA1_ITER,
        };

        string_to_key_aes256(passphrase, &salt, iter_count)
            .map(SessionKey::from_aes256)
    }

    // RFC4120 section 4: the realm followed by the name components, with no
    // separators.
    fn default_salt(client: &Name) -> Vec<u8> {
        let display = client.to_string();
        let name = display
            .rsplit_once('@')
            .map(|(name, _)| name)
            .unwrap_or(display.as_str());
        let mut salt = client.realm().as_bytes().to_vec();
        for component in name.split('/') {
            salt.extend_from_slice(component.as_bytes());
        }
        salt
    }
}

#[cfg(test)]
mod tests {
    use super::{MethodDataPolicy, PreauthHints, SaltEntry};
    use crate::error::KrbError;
    use crate::proto::reply::error_rep::tests::AD_PREAUTH_REQUIRED;
    use crate::proto::{
        ETypeInfo2Entry, ETypeInfoEntry, ErrorReply, KerberosTime, KrbErrorCode, Name, PaData,
        PaDataType, SessionKey,
    };

    fn error_with_edata(code: KrbErrorCode, edata: Vec<u8>) -> ErrorReply {
        ErrorReply::new(
            code,
            Name::service_krbtgt("EXAMPLE.COM"),
            KerberosTime::new(1_728_592_703_000, 0).expect("valid time"),
        )
        .with_error_data(edata)
    }

    fn method_data(padata: &[PaData]) -> Vec<u8> {
        PaData::encode_method_data(padata).expect("Failed to encode")
    }

    #[test]
    fn interpret_active_directory_preauth_required() {
        let blob = hex::decode(AD_PREAUTH_REQUIRED).expect("Failed to decode sample");
        let err = ErrorReply::from_der(&blob).expect("Failed to decode");

        let hints =
            PreauthHints::interpret(&err, &MethodDataPolicy::default()).expect("valid hints");
        assert_eq!(hints.preferred_etype(), Some(18));
        assert_eq!(
            hints.salts(),
            &[SaltEntry {
                etype: 18,
                salt: Some(b"AFOREST.ADuser1".to_vec()),
                s2kparams: None,
            }]
        );
    }

    #[test]
    fn interpret_principal_unknown_with_opaque_edata() {
        let err = error_with_edata(
            KrbErrorCode::KdcErrCPrincipalUnknown,
            vec![0xDE, 0xAD, 0xBE, 0xEF],
        );
        let err = ErrorReply::from_der(&err.to_der().expect("Failed to encode"))
            .expect("Failed to decode");
        assert_eq!(err.code(), KrbErrorCode::KdcErrCPrincipalUnknown);
        assert_eq!(i32::from(err.code()), 6);
        assert_eq!(err.error_data(), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));

        // Not a METHOD-DATA code, the e-data is left alone.
        let policy = MethodDataPolicy::default();
        let hints = PreauthHints::interpret_lossy(&err, &policy);
        assert!(hints.is_empty());
        assert_eq!(hints.preferred_etype(), None);
        assert!(PreauthHints::interpret(&err, &policy)
            .expect("e-data is not parsed")
            .is_empty());
    }

    #[test]
    fn interpret_first_nonzero_etype_wins() {
        let etype_info = ETypeInfoEntry::encode_sequence(&[
            ETypeInfoEntry {
                etype: 0,
                salt: None,
            },
            ETypeInfoEntry {
                etype: 23,
                salt: Some(b"EXAMPLE.COMalice".to_vec()),
            },
        ])
        .expect("Failed to encode");
        let etype_info2 = ETypeInfo2Entry::encode_sequence(&[ETypeInfo2Entry {
            etype: 18,
            salt: Some("EXAMPLE.COMalice".to_string()),
            s2kparams: Some(vec![0, 0, 0x10, 0]),
        }])
        .expect("Failed to encode");

        let edata = method_data(&[
            PaData::new(PaDataType::PaEncTimestamp, Vec::new()),
            PaData::new(PaDataType::PaEtypeInfo, etype_info),
            PaData::new(PaDataType::PaEtypeInfo2, etype_info2),
        ]);
        let err = error_with_edata(KrbErrorCode::KdcErrPreauthFailed, edata);

        let hints =
            PreauthHints::interpret(&err, &MethodDataPolicy::default()).expect("valid hints");
        assert_eq!(hints.preferred_etype(), Some(23));
        let etypes: Vec<i32> = hints.salts().iter().map(|s| s.etype).collect();
        assert_eq!(etypes, vec![0, 23, 18]);
    }

    #[test]
    fn interpret_other_codes_leave_edata_alone() {
        // Valid METHOD-DATA, but the code is not in the table.
        let etype_info2 = ETypeInfo2Entry::encode_sequence(&[ETypeInfo2Entry {
            etype: 18,
            salt: None,
            s2kparams: None,
        }])
        .expect("Failed to encode");
        let edata = method_data(&[PaData::new(PaDataType::PaEtypeInfo2, etype_info2)]);
        let err = error_with_edata(KrbErrorCode::KdcErrSPrincipalUnknown, edata.clone());

        let hints =
            PreauthHints::interpret(&err, &MethodDataPolicy::default()).expect("no failure");
        assert!(hints.is_empty());

        // Garbage e-data is never looked at either.
        let err = error_with_edata(KrbErrorCode::KrbApErrSkew, vec![0xde, 0xad]);
        let hints =
            PreauthHints::interpret(&err, &MethodDataPolicy::default()).expect("no failure");
        assert!(hints.is_empty());

        // Extending the table makes the same reply readable.
        let policy = MethodDataPolicy::new([
            KrbErrorCode::KdcErrPreauthRequired,
            KrbErrorCode::KdcErrSPrincipalUnknown,
        ]);
        let err = error_with_edata(KrbErrorCode::KdcErrSPrincipalUnknown, edata);
        let hints = PreauthHints::interpret(&err, &policy).expect("valid hints");
        assert_eq!(hints.preferred_etype(), Some(18));
    }

    #[test]
    fn interpret_malformed_method_data() {
        let err = error_with_edata(KrbErrorCode::KdcErrPreauthRequired, vec![0x30, 0x03, 0x02]);
        assert!(matches!(
            PreauthHints::interpret(&err, &MethodDataPolicy::default()),
            Err(KrbError::PreAuthDataMalformed)
        ));
        assert!(PreauthHints::interpret_lossy(&err, &MethodDataPolicy::default()).is_empty());

        // A well formed METHOD-DATA with a broken ETYPE-INFO2 inside.
        let edata = method_data(&[PaData::new(PaDataType::PaEtypeInfo2, vec![0x04, 0x00])]);
        let err = error_with_edata(KrbErrorCode::KdcErrPreauthRequired, edata);
        assert!(matches!(
            PreauthHints::interpret(&err, &MethodDataPolicy::default()),
            Err(KrbError::PreAuthDataMalformed)
        ));
    }

    #[test]
    fn derive_key_uses_hints() {
        let client = Name::principal("alice", "EXAMPLE.COM");
        let no_hints = PreauthHints::default()
            .derive_key(b"password", &client)
            .expect("Failed to derive key");

        let edata = method_data(&[PaData::new(
            PaDataType::PaEtypeInfo2,
            ETypeInfo2Entry::encode_sequence(&[ETypeInfo2Entry {
                etype: 18,
                salt: Some("EXAMPLE.COMalice".to_string()),
                s2kparams: Some(vec![0, 0, 0x10, 0]),
            }])
            .expect("Failed to encode"),
        )]);
        let err = error_with_edata(KrbErrorCode::KdcErrPreauthRequired, edata);
        let hinted = PreauthHints::interpret(&err, &MethodDataPolicy::default())
            .expect("valid hints")
            .derive_key(b"password", &client)
            .expect("Failed to derive key");

        // The default salt and iteration count are what the KDC sent.
        assert_eq!(no_hints, hinted);

        let other_salt = PreauthHints {
            salts: vec![SaltEntry {
                etype: 18,
                salt: Some(b"EXAMPLE.COMbob".to_vec()),
                s2kparams: None,
            }],
            preferred_etype: Some(18),
        }
        .derive_key(b"password", &client)
        .expect("Failed to derive key");
        assert_ne!(other_salt, hinted);
    }

    #[test]
    fn derive_key_rfc3962_vector() {
        // RFC3962 appendix B, iteration count 1200.
        let hints = PreauthHints {
            salts: vec![SaltEntry {
                etype: 18,
                salt: Some(b"ATHENA.MIT.EDUraeburn".to_vec()),
                s2kparams: Some(1200u32.to_be_bytes().to_vec()),
            }],
            preferred_etype: Some(18),
        };
        let key = hints
            .derive_key(b"password", &Name::principal("raeburn", "ATHENA.MIT.EDU"))
            .expect("Failed to derive key");
        let expect = hex::decode("55a6ac740ad17b4846941051e1e8b0a7548d93b0ab30a8bc3ff16280382b8c2a")
            .expect("Failed to decode sample");
        let expect: [u8; 32] = expect.try_into().expect("Invalid key length");
        assert_eq!(key, SessionKey::from_aes256(expect));
    }

    #[test]
    fn derive_key_bad_hints() {
        let client = Name::principal("alice", "EXAMPLE.COM");
        let rc4_only = PreauthHints {
            salts: vec![SaltEntry {
                etype: 23,
                salt: None,
                s2kparams: None,
            }],
            preferred_etype: Some(23),
        };
        assert!(matches!(
            rc4_only.derive_key(b"password", &client),
            Err(KrbError::UnsupportedEncryption)
        ));

        let short_params = PreauthHints {
            salts: vec![SaltEntry {
                etype: 18,
                salt: None,
                s2kparams: Some(vec![0x10, 0x00]),
            }],
            preferred_etype: Some(18),
        };
        assert!(matches!(
            short_params.derive_key(b"password", &client),
            Err(KrbError::PreauthInvalidS2KParams)
        ));
    }
}
