use crate::asn1::{
    ap_options::ApFlags,
    ap_req::ApReq,
    authenticator::Authenticator,
    authorization_data::AuthorizationData,
    encrypted_data::EncryptedData as KdcEncryptedData,
    encryption_key::EncryptionKey,
    kdc_req_body::KdcReqBody as Asn1KdcReqBody,
    kerberos_flags::KerberosFlags,
    kerberos_string::KerberosString,
    pa_data::PaData as KdcPaData,
    pa_for_user::PaForUser,
    pa_pac_options::{PaPacOptions, PacOptionFlags},
    principal_name::PrincipalName,
    realm::Realm,
    tagged_ticket::TaggedTicket,
    OctetString,
};
use crate::cksum::ChecksumBuilder;
use crate::constants::{KEY_USAGE_TGS_REQ_AUTH, PA_FOR_USER_AUTH_PACKAGE};
use crate::error::KrbError;
use crate::proto::{
    EncTicket, EncryptionType, KerberosRequest, KerberosTime, Name, PaDataType, SessionKey,
};
use der::{asn1::Any, Encode};
use rand::{rng, Rng};
use std::str::FromStr;
use std::time::SystemTime;
use tracing::{error, trace};

/// A TGS-REQ ready to be sent, together with what is needed to check the
/// reply against it.
#[derive(Debug)]
pub struct TicketGrantRequest {
    pub(crate) nonce: i32,
    pub(crate) service_name: Name,
    pub(crate) kdc_options: KerberosFlags,
    pub(crate) from: Option<KerberosTime>,
    pub(crate) padata: Vec<KdcPaData>,
    pub(crate) req_body: Any,
}

#[derive(Debug)]
struct ApReqBuilder {
    client_name: Name,
    ticket: EncTicket,
    session_key: SessionKey,
}

#[derive(Debug)]
enum S4uExtension {
    /// S4U2Self on behalf of this client.
    ForUser(Name),
    /// S4U2Proxy with the client's evidence ticket.
    Proxy(EncTicket),
}

#[derive(Debug)]
pub struct TicketGrantRequestBuilder {
    service_name: Name,
    client_time: KerberosTime,
    from: Option<SystemTime>,
    until: SystemTime,
    renew: Option<SystemTime>,
    etypes: Vec<EncryptionType>,
    forwardable: bool,
    ap_req_builder: Option<ApReqBuilder>,
    s4u: Option<S4uExtension>,
}

impl TicketGrantRequest {
    pub fn nonce(&self) -> i32 {
        self.nonce
    }

    pub fn service_name(&self) -> &Name {
        &self.service_name
    }

    /// The start time the client asked for, if any. When absent the KDC
    /// chooses "now" and the reply start time is checked against the local
    /// clock.
    pub fn requested_start_time(&self) -> Option<KerberosTime> {
        self.from
    }

    /// The KDC may answer with a referral instead of the requested service.
    pub fn canonicalize(&self) -> bool {
        self.kdc_options.contains(KerberosFlags::Canonicalize)
    }

    pub fn kdc_options(&self) -> KerberosFlags {
        self.kdc_options
    }
}

fn wire_time(t: SystemTime) -> Result<crate::asn1::kerberos_time::KerberosTime, KrbError> {
    KerberosTime::from_system_time(t)?.to_wire()
}

impl TicketGrantRequestBuilder {
    pub(crate) fn new(service_name: Name, now: KerberosTime, until: SystemTime) -> Self {
        TicketGrantRequestBuilder {
            service_name,
            client_time: now,
            from: None,
            until,
            renew: None,
            etypes: vec![EncryptionType::AES256_CTS_HMAC_SHA1_96],
            forwardable: false,
            ap_req_builder: None,
            s4u: None,
        }
    }

    pub fn from(mut self, from: Option<SystemTime>) -> Self {
        self.from = from;
        self
    }

    pub fn renew_until(mut self, renew: Option<SystemTime>) -> Self {
        self.renew = renew;
        self
    }

    pub fn forwardable(mut self, forwardable: bool) -> Self {
        self.forwardable = forwardable;
        self
    }

    pub fn preauth_ap_req(
        mut self,
        client: &Name,
        ticket: &EncTicket,
        session_key: &SessionKey,
    ) -> Self {
        self.ap_req_builder = Some(ApReqBuilder {
            client_name: client.clone(),
            ticket: ticket.clone(),
            session_key: session_key.clone(),
        });
        self
    }

    /// Ask for a ticket to ourself on behalf of `client` (MS-SFU S4U2Self).
    pub fn s4u2self(mut self, client: &Name) -> Self {
        self.s4u = Some(S4uExtension::ForUser(client.clone()));
        self
    }

    /// Ask for a ticket to the service on behalf of the client named in the
    /// evidence ticket (MS-SFU S4U2Proxy).
    pub fn s4u2proxy(mut self, evidence: &EncTicket) -> Self {
        self.s4u = Some(S4uExtension::Proxy(evidence.clone()));
        self
    }

    pub fn build(self) -> Result<KerberosRequest, KrbError> {
        let TicketGrantRequestBuilder {
            service_name,
            client_time,
            from,
            until,
            renew,
            etypes,
            forwardable,
            ap_req_builder,
            s4u,
        } = self;

        let Some(ap_req_builder) = ap_req_builder else {
            error!("a TGS-REQ needs a ticket granting ticket to authenticate with");
            return Err(KrbError::MissingPaData);
        };

        // BUG IN MIT KRB5 - If the value is greater than i32 max you get:
        // krb5kdc[1](Error): ASN.1 value too large - while dispatching (tcp)
        let nonce: i32 = rng().random_range(1..i32::MAX);

        let mut kdc_options = KerberosFlags::Renewable | KerberosFlags::Canonicalize;
        if forwardable {
            kdc_options |= KerberosFlags::Forwardable;
        }

        let additional_tickets = match &s4u {
            Some(S4uExtension::Proxy(evidence)) => {
                kdc_options |= KerberosFlags::CnameInAddlTkt;
                let evidence: TaggedTicket = evidence.clone().try_into()?;
                Some(vec![evidence])
            }
            _ => None,
        };

        let (sname, realm): (PrincipalName, Realm) = (&service_name).try_into()?;

        let from = from.map(KerberosTime::from_system_time).transpose()?;

        let req_body = Asn1KdcReqBody {
            kdc_options,
            cname: None,
            realm,
            sname: Some(sname),
            from: from.map(KerberosTime::to_wire).transpose()?,
            till: wire_time(until)?,
            rtime: renew.map(wire_time).transpose()?,
            nonce,
            etype: etypes.iter().map(|e| *e as i32).collect(),
            addresses: None,
            enc_authorization_data: None,
            additional_tickets,
        };

        trace!(?req_body);

        let req_body = Any::encode_from(&req_body).map_err(|err| {
            error!(?err, "unable to encode KDC-REQ-BODY");
            KrbError::DerEncodeAny
        })?;

        let session_key = &ap_req_builder.session_key;

        // The PA-TGS-REQ must be the first padata, Windows KDCs reject the
        // request otherwise.
        let mut padata = Vec::with_capacity(2);
        padata.push(Self::pa_tgs_req(&ap_req_builder, client_time, &req_body)?);

        match s4u {
            Some(S4uExtension::ForUser(client)) => {
                padata.push(Self::pa_for_user(&client, session_key)?);
            }
            Some(S4uExtension::Proxy(_)) => {
                padata.push(Self::pa_pac_options_rbcd()?);
            }
            None => {}
        }

        Ok(KerberosRequest::TGS(Box::new(TicketGrantRequest {
            nonce,
            service_name,
            kdc_options,
            from,
            padata,
            req_body,
        })))
    }

    fn pa_tgs_req(
        ap_req_builder: &ApReqBuilder,
        client_time: KerberosTime,
        req_body: &Any,
    ) -> Result<KdcPaData, KrbError> {
        //  The checksum in the authenticator is to be computed over the KDC-REQ-BODY encoding.
        let checksum = ChecksumBuilder::from(ap_req_builder.session_key.clone())
            .compute_kdc_req_body(req_body)?;

        let (client_name, client_realm): (PrincipalName, Realm) =
            (&ap_req_builder.client_name).try_into()?;
        let subkey: Option<EncryptionKey> = None;
        let sequence_number: Option<u32> = None;
        let authorization_data: Option<AuthorizationData> = None;

        let authenticator = Authenticator::new(
            client_name,
            client_realm,
            client_time.to_wire()?,
            client_time.microseconds(),
            Some(checksum),
            subkey,
            sequence_number,
            authorization_data,
        );

        let authenticator = authenticator.to_der().map_err(|err| {
            error!(?err, "unable to encode authenticator");
            KrbError::DerEncodeAuthenticator
        })?;

        // It is encrypted in the ticket's session key, with a key usage value
        // of 7 when used as the PA-TGS-REQ PA-DATA field of a TGS-REQ.
        let authenticator: KdcEncryptedData = ap_req_builder
            .session_key
            .encrypt(&authenticator, KEY_USAGE_TGS_REQ_AUTH)?
            .try_into()?;

        let ticket: TaggedTicket = ap_req_builder.ticket.clone().try_into()?;
        let ap_req = ApReq::new(ApFlags::none(), ticket, authenticator);

        let padata_value = ap_req
            .to_der()
            .and_then(OctetString::new)
            .map_err(|err| {
                error!(?err, "unable to encode AP-REQ");
                KrbError::DerEncodeApReq
            })?;

        Ok(KdcPaData {
            padata_type: PaDataType::PaTgsReq.into(),
            padata_value,
        })
    }

    fn pa_for_user(client: &Name, session_key: &SessionKey) -> Result<KdcPaData, KrbError> {
        let (user_name, user_realm): (PrincipalName, Realm) = client.try_into()?;

        let cksum = ChecksumBuilder::HmacMd5(session_key.clone()).compute_pa_for_user(
            &user_name,
            &user_realm,
            PA_FOR_USER_AUTH_PACKAGE,
        )?;

        let pa_for_user = PaForUser {
            user_name,
            user_realm,
            cksum,
            auth_package: KerberosString::from_str(PA_FOR_USER_AUTH_PACKAGE)?,
        };

        let padata_value = pa_for_user
            .to_der()
            .and_then(OctetString::new)
            .map_err(|err| {
                error!(?err, "unable to encode PA-FOR-USER");
                KrbError::DerEncodePaForUser
            })?;

        Ok(KdcPaData {
            padata_type: PaDataType::PaForUser.into(),
            padata_value,
        })
    }

    fn pa_pac_options_rbcd() -> Result<KdcPaData, KrbError> {
        let pac_options = PaPacOptions {
            options: PacOptionFlags::ResourceBasedConstrainedDelegation,
        };

        let padata_value = pac_options
            .to_der()
            .and_then(OctetString::new)
            .map_err(|err| {
                error!(?err, "unable to encode PA-PAC-OPTIONS");
                KrbError::DerEncodePaPacOptions
            })?;

        Ok(KdcPaData {
            padata_type: PaDataType::PaPacOptions.into(),
            padata_value,
        })
    }
}
