mod tgs_req;

use crate::asn1::{constants::message_types::KrbMessageType, kdc_req::KdcReq, krb_kdc_req::KrbKdcReq};
use crate::error::KrbError;
use der::Encode;
use std::time::SystemTime;
use tracing::error;

pub use tgs_req::{TicketGrantRequest, TicketGrantRequestBuilder};

use super::{KerberosTime, Name};

#[derive(Debug)]
pub enum KerberosRequest {
    TGS(Box<TicketGrantRequest>),
}

impl KerberosRequest {
    pub fn build_tgs(
        service_name: Name,
        now: KerberosTime,
        until: SystemTime,
    ) -> TicketGrantRequestBuilder {
        TicketGrantRequestBuilder::new(service_name, now, until)
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let krb_kdc_req: KrbKdcReq = self.into();
        krb_kdc_req.to_der().map_err(|err| {
            error!(?err, "unable to encode KDC-REQ");
            KrbError::DerEncodeKdcReq
        })
    }
}

impl From<&KerberosRequest> for KrbKdcReq {
    fn from(req: &KerberosRequest) -> KrbKdcReq {
        match req {
            KerberosRequest::TGS(tgs_req) => KrbKdcReq::TgsReq(KdcReq {
                pvno: 5,
                msg_type: KrbMessageType::KrbTgsReq.into(),
                padata: Some(tgs_req.padata.clone()),
                req_body: tgs_req.req_body.clone(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ReceivedTgsReq;
    use super::KerberosRequest;
    use crate::asn1::{
        kerberos_flags::KerberosFlags, pa_for_user::PaForUser, pa_pac_options::PaPacOptions,
        pa_pac_options::PacOptionFlags,
    };
    use crate::cksum::ChecksumBuilder;
    use crate::constants::KERB_CHECKSUM_HMAC_MD5;
    use crate::error::KrbError;
    use crate::proto::tests::{test_ticket, TEST_SESSION_KEY};
    use crate::proto::{EncTicket, KerberosTime, Name, PaDataType, SessionKey};
    use der::Decode;
    use std::str::FromStr;
    use std::time::{Duration, SystemTime};

    fn now() -> KerberosTime {
        KerberosTime::new(1_728_592_703_250, 125).expect("valid time")
    }

    fn tgt() -> EncTicket {
        test_ticket(&Name::service_krbtgt("EXAMPLE.COM"))
    }

    fn build(
        service: &str,
        extend: impl FnOnce(super::TicketGrantRequestBuilder) -> super::TicketGrantRequestBuilder,
    ) -> (KerberosRequest, ReceivedTgsReq) {
        let client = Name::principal("alice", "EXAMPLE.COM");
        let until = SystemTime::UNIX_EPOCH + Duration::from_secs(1_728_679_103);
        let builder = KerberosRequest::build_tgs(
            Name::from_str(service).expect("valid service"),
            now(),
            until,
        )
        .preauth_ap_req(&client, &tgt(), &SessionKey::from_aes256(TEST_SESSION_KEY));

        let req = extend(builder).build().expect("Failed to build TGS-REQ");
        let der_bytes = req.to_der().expect("Failed to encode TGS-REQ");
        // [APPLICATION 12]
        assert_eq!(der_bytes[0], 0x6c);
        let received = ReceivedTgsReq::from_der(&der_bytes);
        (req, received)
    }

    #[test]
    fn tgs_req_layout() {
        let (req, received) = build("HTTP/www.example.com@EXAMPLE.COM", |b| b);
        let KerberosRequest::TGS(tgs_req) = req;

        assert_eq!(received.padata.len(), 1);
        assert_eq!(received.padata[0].padata_type, PaDataType::PaTgsReq as i32);

        let body = &received.req_body;
        assert_eq!(body.nonce, tgs_req.nonce());
        assert!(body.nonce > 0);
        assert_eq!(body.realm.as_str(), "EXAMPLE.COM");
        assert_eq!(body.etype, vec![18]);
        assert!(body.cname.is_none());
        assert!(body.from.is_none());
        assert!(body.additional_tickets.is_none());
        assert_eq!(
            body.kdc_options,
            KerberosFlags::Renewable | KerberosFlags::Canonicalize
        );
        assert!(tgs_req.canonicalize());

        assert_eq!(received.tgt(), tgt());
    }

    #[test]
    fn tgs_req_authenticator() {
        let (_, received) = build("HTTP/www.example.com@EXAMPLE.COM", |b| b.forwardable(true));
        assert!(received
            .req_body
            .kdc_options
            .contains(KerberosFlags::Forwardable));

        let session_key = SessionKey::from_aes256(TEST_SESSION_KEY);
        let authenticator = received.authenticator(&session_key);

        assert_eq!(authenticator.crealm.as_str(), "EXAMPLE.COM");
        assert_eq!(authenticator.cusec, 250_125);
        assert_eq!(KerberosTime::from(&authenticator.ctime), now().truncate_to_seconds());

        let expect = ChecksumBuilder::from(session_key)
            .compute_kdc_req_body(&received.raw_req_body)
            .expect("Failed to compute checksum");
        assert_eq!(authenticator.cksum, Some(expect));
    }

    #[test]
    fn tgs_req_s4u2self() {
        let client = Name::principal("bob", "EXAMPLE.COM");
        let (_, received) = build("HTTP/www.example.com@EXAMPLE.COM", |b| b.s4u2self(&client));

        assert_eq!(received.padata.len(), 2);
        assert_eq!(received.padata[0].padata_type, PaDataType::PaTgsReq as i32);

        let pa_for_user = received
            .padata(PaDataType::PaForUser)
            .expect("PA-FOR-USER missing");
        let pa_for_user = PaForUser::from_der(pa_for_user).expect("Failed to decode");
        assert_eq!(pa_for_user.user_realm.as_str(), "EXAMPLE.COM");
        assert_eq!(pa_for_user.user_name.name_string[0].as_str(), "bob");
        assert_eq!(pa_for_user.auth_package.as_str(), "Kerberos");
        assert_eq!(pa_for_user.cksum.checksum_type, KERB_CHECKSUM_HMAC_MD5);

        let expect = ChecksumBuilder::HmacMd5(SessionKey::from_aes256(TEST_SESSION_KEY))
            .compute_pa_for_user(&pa_for_user.user_name, &pa_for_user.user_realm, "Kerberos")
            .expect("Failed to compute checksum");
        assert_eq!(pa_for_user.cksum, expect);

        assert!(received.req_body.additional_tickets.is_none());
        assert!(!received
            .req_body
            .kdc_options
            .contains(KerberosFlags::CnameInAddlTkt));
    }

    #[test]
    fn tgs_req_s4u2proxy() {
        let evidence = test_ticket(&Name::service("HTTP", "front.example.com", "EXAMPLE.COM"));
        let (_, received) = build("cifs/files.example.com@EXAMPLE.COM", |b| {
            b.s4u2proxy(&evidence)
        });

        assert!(received
            .req_body
            .kdc_options
            .contains(KerberosFlags::CnameInAddlTkt));

        let additional = received
            .req_body
            .additional_tickets
            .clone()
            .expect("additional tickets missing");
        assert_eq!(additional.len(), 1);
        let additional = EncTicket::try_from(additional[0].clone()).expect("valid ticket");
        assert_eq!(additional, evidence);

        let pac_options = received
            .padata(PaDataType::PaPacOptions)
            .expect("PA-PAC-OPTIONS missing");
        let pac_options = PaPacOptions::from_der(pac_options).expect("Failed to decode");
        assert!(pac_options
            .options
            .contains(PacOptionFlags::ResourceBasedConstrainedDelegation));
        assert!(received.padata(PaDataType::PaForUser).is_none());
    }

    #[test]
    fn tgs_req_requested_start() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_728_600_000);
        let (req, received) = build("HTTP/www.example.com@EXAMPLE.COM", |b| b.from(Some(start)));
        let KerberosRequest::TGS(tgs_req) = req;
        assert!(tgs_req.requested_start_time().is_some());
        assert!(received.req_body.from.is_some());
    }

    #[test]
    fn tgs_req_needs_tgt() {
        let result = KerberosRequest::build_tgs(
            Name::service("HTTP", "www.example.com", "EXAMPLE.COM"),
            now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_728_679_103),
        )
        .build();
        assert!(matches!(result, Err(KrbError::MissingPaData)));
    }
}
