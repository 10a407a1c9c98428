use crate::error::KrbError;
use crate::proto::{
    is_within_allowed_skew, KerberosClock, KerberosCredentials, KerberosReply, KerberosRequest,
    MethodDataPolicy, Name, PreauthHints, TicketGrantReply, TicketGrantRequest,
};
use crate::transport::{KdcConnector, KdcTransport};
use std::time::Duration;
use tracing::{debug, error, trace};

use crate::constants::DEFAULT_CLOCK_SKEW;

/// Who the requested ticket is for.
#[derive(Debug, Clone, Copy)]
pub enum Impersonation<'a> {
    /// The client of the ticket granting ticket.
    None,
    /// S4U2Self, a ticket to ourself on behalf of this client.
    S4u2Self(&'a Name),
    /// S4U2Proxy, a ticket to another service on behalf of the client of
    /// these evidence credentials.
    S4u2Proxy(&'a KerberosCredentials),
}

impl Impersonation<'_> {
    fn expected_client<'b>(&'b self, creds: &'b KerberosCredentials) -> &'b Name {
        match *self {
            Impersonation::None => creds.client(),
            Impersonation::S4u2Self(client) => client,
            Impersonation::S4u2Proxy(evidence) => evidence.client(),
        }
    }
}

/// One TGS-REQ / TGS-REP round trip.
pub trait TgsExchange {
    fn send_and_get_creds(
        &self,
        creds: &KerberosCredentials,
        service: &Name,
        impersonation: Impersonation<'_>,
    ) -> Result<KerberosCredentials, KrbError>;
}

/// A [TgsExchange] that talks to the KDC of the realm the presented ticket
/// granting ticket is valid for.
pub struct KdcTgsExchange<C> {
    connector: C,
    clock: KerberosClock,
    clock_skew: Duration,
    policy: MethodDataPolicy,
}

impl<C: KdcConnector> KdcTgsExchange<C> {
    pub fn new(connector: C) -> Self {
        KdcTgsExchange {
            connector,
            clock: KerberosClock::new(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            policy: MethodDataPolicy::default(),
        }
    }

    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn with_method_data_policy(mut self, policy: MethodDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn round_trip(&self, realm: &str, request: &[u8]) -> Result<Vec<u8>, KrbError> {
        let mut transport = self.connector.connect(realm)?;
        transport.send(request)?;
        transport.receive()?.ok_or_else(|| {
            error!(?realm, "KDC sent no usable reply");
            KrbError::TransportNoReply
        })
    }

    fn validate(
        &self,
        tgs_req: &TicketGrantRequest,
        creds: &KerberosCredentials,
        impersonation: Impersonation<'_>,
        reply: TicketGrantReply,
    ) -> Result<KerberosCredentials, KrbError> {
        let part = reply.decrypt_enc_part(creds.session_key())?;
        trace!(?part);

        if part.nonce != tgs_req.nonce() {
            error!(
                expected = tgs_req.nonce(),
                received = part.nonce,
                "TGS-REP nonce mismatch"
            );
            return Err(KrbError::TgsReplyNonceMismatch);
        }

        let service = tgs_req.service_name();
        if !part.server.same_principal(service) {
            // Asked for a krbtgt, a KDC that canonicalizes may refer us to
            // another realm instead. Any other service must match exactly.
            let is_referral = tgs_req.canonicalize()
                && service.krbtgt_instance().is_some()
                && part.server.krbtgt_instance().is_some()
                && part.server.realm() == service.realm();
            if !is_referral {
                error!(requested = %service, received = %part.server, "TGS-REP server mismatch");
                return Err(KrbError::TgsReplyServerMismatch);
            }
            debug!(referral = %part.server, "KDC returned a referral");
        }

        if !reply.ticket.service().same_principal(&part.server) {
            error!(
                ticket = %reply.ticket.service(),
                reply = %part.server,
                "TGS-REP ticket is for a different server"
            );
            return Err(KrbError::TgsReplyServerMismatch);
        }

        if tgs_req.requested_start_time().is_none() {
            if let Some(start_time) = part.times.start_time {
                let now = self.clock.now_system_time();
                if !is_within_allowed_skew(now, start_time.to_system_time(), self.clock_skew) {
                    error!(?start_time, "TGS-REP start time is outside the clock skew");
                    return Err(KrbError::TgsReplyClockSkew);
                }
            }
        }

        let expected_client = impersonation.expected_client(creds);
        if !reply.client_name.same_principal(expected_client) {
            error!(
                expected = %expected_client,
                received = %reply.client_name,
                "TGS-REP client mismatch"
            );
            return Err(match impersonation {
                Impersonation::None => KrbError::TgsReplyClientMismatch,
                _ => KrbError::ImpersonationNotHonored,
            });
        }

        Ok(KerberosCredentials::from_reply(
            reply.client_name,
            reply.ticket,
            part,
        ))
    }
}

impl<C: KdcConnector> TgsExchange for KdcTgsExchange<C> {
    #[tracing::instrument(level = "debug", skip_all, fields(service = %service))]
    fn send_and_get_creds(
        &self,
        creds: &KerberosCredentials,
        service: &Name,
        impersonation: Impersonation<'_>,
    ) -> Result<KerberosCredentials, KrbError> {
        let now = self.clock.now()?;
        let until = creds.times().end_time.to_system_time();

        let mut builder = KerberosRequest::build_tgs(service.clone(), now, until)
            .forwardable(creds.is_forwardable())
            .preauth_ap_req(creds.client(), creds.ticket(), creds.session_key());

        builder = match impersonation {
            Impersonation::None => builder,
            Impersonation::S4u2Self(client) => builder.s4u2self(client),
            Impersonation::S4u2Proxy(evidence) => builder.s4u2proxy(evidence.ticket()),
        };

        let request = builder.build()?;
        let KerberosRequest::TGS(tgs_req) = &request;
        let realm = creds.target_realm();

        debug!(?realm, nonce = tgs_req.nonce(), "sending TGS-REQ");
        let reply_bytes = self.round_trip(realm, &request.to_der()?)?;

        match KerberosReply::from_der(&reply_bytes)? {
            KerberosReply::TGS(reply) => self.validate(tgs_req, creds, impersonation, reply),
            KerberosReply::ERR(err) => {
                let hints = PreauthHints::interpret_lossy(&err, &self.policy);
                error!(
                    code = ?err.code(),
                    text = err.text(),
                    preferred_etype = ?hints.preferred_etype(),
                    "KDC rejected the TGS-REQ"
                );
                Err(KrbError::KdcReply(err.code()))
            }
        }
    }
}
