use super::encrypted_data::EncryptedData;
use super::host_addresses::HostAddresses;
use super::kdc_options::KdcOptions;
use super::kerberos_time::KerberosTime;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use super::tagged_ticket::TaggedTicket;
use der::Sequence;

/// ```text
/// KDC-REQ-BODY    ::= SEQUENCE {
///         kdc-options             [0] KDCOptions,
///         cname                   [1] PrincipalName OPTIONAL
///                                     -- Used only in AS-REQ --,
///         realm                   [2] Realm
///                                     -- Server's realm
///                                     -- Also client's in AS-REQ --,
///         sname                   [3] PrincipalName OPTIONAL,
///         from                    [4] KerberosTime OPTIONAL,
///         till                    [5] KerberosTime,
///         rtime                   [6] KerberosTime OPTIONAL,
///         nonce                   [7] UInt32,
///         etype                   [8] SEQUENCE OF Int32 -- EncryptionType
///                                     -- in preference order --,
///         addresses               [9] HostAddresses OPTIONAL,
///         enc-authorization-data  [10] EncryptedData OPTIONAL
///                                     -- AuthorizationData --,
///         additional-tickets      [11] SEQUENCE OF Ticket OPTIONAL
///                                         -- NOTE: not empty
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub(crate) struct KdcReqBody {
    #[asn1(context_specific = "0")]
    pub(crate) kdc_options: KdcOptions,
    #[asn1(context_specific = "1", optional = "true")]
    pub(crate) cname: Option<PrincipalName>,
    #[asn1(context_specific = "2")]
    pub(crate) realm: Realm,
    #[asn1(context_specific = "3", optional = "true")]
    pub(crate) sname: Option<PrincipalName>,
    #[asn1(context_specific = "4", optional = "true")]
    pub(crate) from: Option<KerberosTime>,
    #[asn1(context_specific = "5")]
    pub(crate) till: KerberosTime,
    #[asn1(context_specific = "6", optional = "true")]
    pub(crate) rtime: Option<KerberosTime>,
    #[asn1(context_specific = "7")]
    pub(crate) nonce: i32,
    #[asn1(context_specific = "8")]
    pub(crate) etype: Vec<i32>,
    #[asn1(context_specific = "9", optional = "true")]
    pub(crate) addresses: Option<HostAddresses>,
    #[asn1(context_specific = "10", optional = "true")]
    pub(crate) enc_authorization_data: Option<EncryptedData>,
    #[asn1(context_specific = "11", optional = "true")]
    pub(crate) additional_tickets: Option<Vec<TaggedTicket>>,
}

#[cfg(test)]
mod tests {
    use super::KdcReqBody;
    use crate::asn1::constants::EncryptionType;
    use crate::asn1::encrypted_data::EncryptedData;
    use crate::asn1::kerberos_flags::KerberosFlags;
    use crate::asn1::kerberos_string::KerberosString;
    use crate::asn1::kerberos_time::KerberosTime;
    use crate::asn1::principal_name::PrincipalName;
    use crate::asn1::tagged_ticket::{TaggedTicket, Ticket};
    use der::asn1::{Any, OctetString};
    use der::{DateTime, Decode, Encode};
    use std::str::FromStr;

    #[test]
    fn kdc_req_body_negative_nonce() {
        let _ = tracing_subscriber::fmt::try_init();
        // Heimdal sends the nonce as a signed value, MIT treats it as u31.
        let req_body_bytes = hex::decode(concat!(
            "3079",
            "a007",
            "03050000000000",
            "a215",
            "1b134445562e4649525354594541522e49442e4155",
            "a32c",
            "302a",
            "a003",
            "020101",
            "a123",
            "3021",
            "1b04",
            "63696673",
            "1b19",
            "66696c65732e6465762e6669727374796561722e69642e6175",
            "a511",
            "180f31393730303130313030303030305a",
            "a706",
            "0204",
            "cd5c0274",
            "a80e",
            "300c",
            "020112",
            "020111",
            "020110",
            "020117",
        ))
        .expect("Failed to decode sample");

        let req_body = Any::from_der(&req_body_bytes).expect("Failed to decode Any");
        let req_body = req_body
            .decode_as::<KdcReqBody>()
            .expect("Failed to decode req body");
        tracing::trace!(?req_body);

        assert!(req_body.nonce < 0);
        assert_eq!(req_body.realm.as_str(), "DEV.FIRSTYEAR.ID.AU");
        assert!(req_body.additional_tickets.is_none());
    }

    #[test]
    fn kdc_req_body_additional_tickets() {
        let ticket = TaggedTicket::new(Ticket {
            tkt_vno: 5,
            realm: KerberosString::from_str("EXAMPLE.COM").expect("Invalid realm"),
            sname: PrincipalName::try_from((1, "web")).expect("Invalid name"),
            enc_part: EncryptedData {
                etype: EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32,
                kvno: Some(2),
                cipher: OctetString::new(vec![0x42; 48]).expect("Invalid cipher"),
            },
        });

        let till = KerberosTime::from_date_time(
            DateTime::new(2024, 10, 11, 20, 38, 23).expect("Failed to build datetime"),
        );

        let req_body = KdcReqBody {
            kdc_options: KerberosFlags::Forwardable
                | KerberosFlags::CnameInAddlTkt
                | KerberosFlags::Canonicalize,
            cname: None,
            realm: KerberosString::from_str("EXAMPLE.COM").expect("Invalid realm"),
            sname: Some(PrincipalName::try_from((2, "cifs/files.example.com")).expect("Invalid name")),
            from: None,
            till,
            rtime: None,
            nonce: 12345,
            etype: vec![EncryptionType::AES256_CTS_HMAC_SHA1_96 as i32],
            addresses: None,
            enc_authorization_data: None,
            additional_tickets: Some(vec![ticket.clone()]),
        };

        let der_bytes = req_body.to_der().expect("Failed to encode");
        let decoded = KdcReqBody::from_der(&der_bytes).expect("Failed to decode");

        assert_eq!(decoded, req_body);
        assert!(decoded
            .kdc_options
            .contains(KerberosFlags::CnameInAddlTkt));
        let tickets = decoded.additional_tickets.expect("missing tickets");
        assert_eq!(tickets, vec![ticket]);
    }
}
