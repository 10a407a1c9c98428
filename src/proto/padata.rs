use crate::asn1::{
    etype_info::{ETypeInfo as KdcETypeInfo, ETypeInfoEntry as KdcETypeInfoEntry},
    etype_info2::{ETypeInfo2 as KdcETypeInfo2, ETypeInfo2Entry as KdcETypeInfo2Entry},
    kerberos_string::KerberosString,
    krb_error::MethodData as KdcMethodData,
    pa_data::PaData as KdcPaData,
    OctetString,
};
use crate::error::KrbError;
use der::{Decode, Encode};
use std::str::FromStr;
use tracing::error;

/// A single PA-DATA element. The value is left as raw bytes, its meaning
/// depends on the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaData {
    pub padata_type: i32,
    pub padata_value: Vec<u8>,
}

impl PaData {
    pub fn new(padata_type: impl Into<i32>, padata_value: Vec<u8>) -> Self {
        PaData {
            padata_type: padata_type.into(),
            padata_value,
        }
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        KdcPaData::from_der(bytes)
            .map(PaData::from)
            .map_err(|err| {
                error!(?err, "unable to decode PA-DATA");
                KrbError::MalformedEncoding
            })
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        KdcPaData::try_from(self)?.to_der().map_err(|err| {
            error!(?err, "unable to encode PA-DATA");
            KrbError::MalformedEncoding
        })
    }

    /// Decode a METHOD-DATA, the SEQUENCE OF PA-DATA carried in the e-data of
    /// some errors.
    pub fn decode_method_data(bytes: &[u8]) -> Result<Vec<Self>, KrbError> {
        KdcMethodData::from_der(bytes)
            .map(|pavec| pavec.into_iter().map(PaData::from).collect())
            .map_err(|err| {
                error!(?err, "unable to decode METHOD-DATA");
                KrbError::MalformedEncoding
            })
    }

    pub fn encode_method_data(padata: &[Self]) -> Result<Vec<u8>, KrbError> {
        padata
            .iter()
            .map(KdcPaData::try_from)
            .collect::<Result<KdcMethodData, _>>()?
            .to_der()
            .map_err(|err| {
                error!(?err, "unable to encode METHOD-DATA");
                KrbError::MalformedEncoding
            })
    }
}

impl From<KdcPaData> for PaData {
    fn from(value: KdcPaData) -> Self {
        PaData {
            padata_type: value.padata_type,
            padata_value: value.padata_value.into_bytes(),
        }
    }
}

impl TryFrom<&PaData> for KdcPaData {
    type Error = KrbError;

    fn try_from(value: &PaData) -> Result<Self, Self::Error> {
        Ok(KdcPaData {
            padata_type: value.padata_type,
            padata_value: OctetString::new(value.padata_value.clone())
                .map_err(|_| KrbError::DerEncodeOctetString)?,
        })
    }
}

/// An ETYPE-INFO-ENTRY. The salt is raw octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETypeInfoEntry {
    pub etype: i32,
    pub salt: Option<Vec<u8>>,
}

impl ETypeInfoEntry {
    /// Decode the value of a PA-ETYPE-INFO, which is a sequence of entries.
    pub fn decode_sequence(bytes: &[u8]) -> Result<Vec<Self>, KrbError> {
        KdcETypeInfo::from_der(bytes)
            .map(|entries| entries.into_iter().map(ETypeInfoEntry::from).collect())
            .map_err(|err| {
                error!(?err, "unable to decode ETYPE-INFO");
                KrbError::DerDecodeEtypeInfo
            })
    }

    pub fn encode_sequence(entries: &[Self]) -> Result<Vec<u8>, KrbError> {
        entries
            .iter()
            .map(KdcETypeInfoEntry::try_from)
            .collect::<Result<KdcETypeInfo, _>>()?
            .to_der()
            .map_err(|err| {
                error!(?err, "unable to encode ETYPE-INFO");
                KrbError::MalformedEncoding
            })
    }
}

impl From<KdcETypeInfoEntry> for ETypeInfoEntry {
    fn from(value: KdcETypeInfoEntry) -> Self {
        ETypeInfoEntry {
            etype: value.etype,
            salt: value.salt.map(|s| s.into_bytes()),
        }
    }
}

impl TryFrom<&ETypeInfoEntry> for KdcETypeInfoEntry {
    type Error = KrbError;

    fn try_from(value: &ETypeInfoEntry) -> Result<Self, Self::Error> {
        let salt = value
            .salt
            .as_ref()
            .map(|s| OctetString::new(s.clone()))
            .transpose()
            .map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(KdcETypeInfoEntry {
            etype: value.etype,
            salt,
        })
    }
}

/// An ETYPE-INFO2-ENTRY. The salt is a KerberosString, and s2kparams holds
/// the string to key parameters of the etype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETypeInfo2Entry {
    pub etype: i32,
    pub salt: Option<String>,
    //   For AES HMAC SHA1:
    //   The number of iterations is specified by the string-to-key parameters
    //   supplied.  The parameter string is four octets indicating an unsigned
    //   number in big-endian order.  This is the number of iterations to be
    //   performed.
    pub s2kparams: Option<Vec<u8>>,
}

impl ETypeInfo2Entry {
    /// Decode the value of a PA-ETYPE-INFO2, which is a sequence of entries.
    pub fn decode_sequence(bytes: &[u8]) -> Result<Vec<Self>, KrbError> {
        KdcETypeInfo2::from_der(bytes)
            .map(|entries| entries.into_iter().map(ETypeInfo2Entry::from).collect())
            .map_err(|err| {
                error!(?err, "unable to decode ETYPE-INFO2");
                KrbError::DerDecodeEtypeInfo2
            })
    }

    pub fn encode_sequence(entries: &[Self]) -> Result<Vec<u8>, KrbError> {
        entries
            .iter()
            .map(KdcETypeInfo2Entry::try_from)
            .collect::<Result<KdcETypeInfo2, _>>()?
            .to_der()
            .map_err(|err| {
                error!(?err, "unable to encode ETYPE-INFO2");
                KrbError::MalformedEncoding
            })
    }
}

impl From<KdcETypeInfo2Entry> for ETypeInfo2Entry {
    fn from(value: KdcETypeInfo2Entry) -> Self {
        ETypeInfo2Entry {
            etype: value.etype,
            salt: value.salt.as_ref().map(String::from),
            s2kparams: value.s2kparams.map(|v| v.into_bytes()),
        }
    }
}

impl TryFrom<&ETypeInfo2Entry> for KdcETypeInfo2Entry {
    type Error = KrbError;

    fn try_from(value: &ETypeInfo2Entry) -> Result<Self, Self::Error> {
        let salt = value
            .salt
            .as_deref()
            .map(KerberosString::from_str)
            .transpose()?;
        let s2kparams = value
            .s2kparams
            .as_ref()
            .map(|data| OctetString::new(data.clone()))
            .transpose()
            .map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(KdcETypeInfo2Entry {
            etype: value.etype,
            salt,
            s2kparams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ETypeInfo2Entry, ETypeInfoEntry, PaData};
    use crate::asn1::constants::{EncryptionType, PaDataType};
    use crate::error::KrbError;
    use assert_hex::assert_eq_hex;

    #[test]
    fn pa_data_der() {
        let blob = hex::decode("3009a103020113a2020400").expect("Failed to decode sample");
        let pa = PaData::from_der(&blob).expect("Failed to decode");
        assert_eq!(pa.padata_type, PaDataType::PaEtypeInfo2 as i32);
        assert!(pa.padata_value.is_empty());
        assert_eq_hex!(pa.to_der().expect("Failed to encode"), blob);
    }

    #[test]
    fn pa_data_mandatory_tag_mismatch() {
        // padata-type sent under [0] instead of [1]
        let blob = hex::decode("3009a003020113a2020400").expect("Failed to decode sample");
        assert!(matches!(
            PaData::from_der(&blob),
            Err(KrbError::MalformedEncoding)
        ));
    }

    #[test]
    fn pa_data_trailing_bytes() {
        let blob = hex::decode("3009a103020113a2020400ff").expect("Failed to decode sample");
        assert!(matches!(
            PaData::from_der(&blob),
            Err(KrbError::MalformedEncoding)
        ));
    }

    #[test]
    fn pa_data_negative_type() {
        let pa = PaData::new(-128, vec![0x01, 0x02]);
        let der_bytes = pa.to_der().expect("Failed to encode");
        assert_eq!(PaData::from_der(&der_bytes).expect("Failed to decode"), pa);
    }

    #[test]
    fn method_data_encode() {
        let padata = vec![
            PaData::new(PaDataType::PaEncTimestamp, Vec::new()),
            PaData::new(PaDataType::PaPacRequest, vec![0x30, 0x05, 0xa0, 0x03, 0x01, 0x01, 0xff]),
        ];
        let der_bytes = PaData::encode_method_data(&padata).expect("Failed to encode");
        assert_eq!(
            PaData::decode_method_data(&der_bytes).expect("Failed to decode"),
            padata
        );
    }

    #[test]
    fn etype_info_sequence() {
        let entries = vec![
            ETypeInfoEntry {
                etype: EncryptionType::RC4_HMAC as i32,
                salt: Some(b"EXAMPLE.COMuser".to_vec()),
            },
            ETypeInfoEntry {
                etype: EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32,
                salt: None,
            },
        ];
        let der_bytes = ETypeInfoEntry::encode_sequence(&entries).expect("Failed to encode");
        let expect = hex::decode(
            "30213018a003020117a111040f4558414d504c452e434f4d757365723005a003020112",
        )
        .expect("Failed to decode sample");
        assert_eq_hex!(der_bytes, expect);
        assert_eq!(
            ETypeInfoEntry::decode_sequence(&der_bytes).expect("Failed to decode"),
            entries
        );
    }

    #[test]
    fn etype_info2_sequence() {
        let blob = hex::decode("301a3018a003020112a1111b0f41464f524553542e41447573657231")
            .expect("Failed to decode sample");
        let entries = ETypeInfo2Entry::decode_sequence(&blob).expect("Failed to decode");
        assert_eq!(
            entries,
            vec![ETypeInfo2Entry {
                etype: EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32,
                salt: Some("AFOREST.ADuser1".to_string()),
                s2kparams: None,
            }]
        );
        assert_eq_hex!(
            ETypeInfo2Entry::encode_sequence(&entries).expect("Failed to encode"),
            blob
        );
    }

    #[test]
    fn etype_info2_garbage() {
        assert!(matches!(
            ETypeInfo2Entry::decode_sequence(&[0x04, 0x01, 0x00]),
            Err(KrbError::DerDecodeEtypeInfo2)
        ));
    }
}
