use crate::config::{ClientConfig, RealmHierarchy};
use crate::error::KrbError;
use crate::exchange::{Impersonation, KdcTgsExchange, TgsExchange};
use crate::proto::{maximum_clock_skew, KerberosCredentials, Name};
use crate::realm_path::RealmPathResolver;
use crate::transport::TcpConnector;
use tracing::{debug, error};

/// Obtains service tickets from a ticket granting ticket, crossing realms
/// when the service lives elsewhere.
pub struct KerberosClient<E = KdcTgsExchange<TcpConnector>, H = ClientConfig> {
    exchange: E,
    hierarchy: H,
}

impl KerberosClient {
    pub fn from_config(config: ClientConfig) -> Self {
        let exchange = KdcTgsExchange::new(TcpConnector::from(&config))
            .with_clock_skew(maximum_clock_skew(&config))
            .with_method_data_policy(config.method_data_policy());
        KerberosClient {
            exchange,
            hierarchy: config,
        }
    }
}

impl<E: TgsExchange, H: RealmHierarchy> KerberosClient<E, H> {
    pub fn new(exchange: E, hierarchy: H) -> Self {
        KerberosClient {
            exchange,
            hierarchy,
        }
    }

    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    #[tracing::instrument(level = "debug", skip_all, fields(service = %service))]
    pub fn acquire_service_creds(
        &self,
        service: &Name,
        tgt: &KerberosCredentials,
    ) -> Result<KerberosCredentials, KrbError> {
        let service_realm = service.realm();

        if tgt.target_realm() == service_realm {
            debug!("service is in the realm of the ticket granting ticket");
            let creds = self
                .exchange
                .send_and_get_creds(tgt, service, Impersonation::None)
                .map_err(|err| match err {
                    KrbError::TgsReplyServerMismatch => KrbError::GeneralCredentialFailure,
                    err => err,
                })?;
            return issued_for(creds, service);
        }

        let (service_tgt, ok_as_delegate) =
            RealmPathResolver::new(&self.exchange, &self.hierarchy).resolve(tgt, service_realm)?;

        let creds = self
            .exchange
            .send_and_get_creds(&service_tgt, service, Impersonation::None)
            .map_err(|err| {
                error!(?err, "service ticket unavailable with the cross realm ticket");
                KrbError::GeneralCredentialFailure
            })?;
        let creds = issued_for(creds, service)?;

        if ok_as_delegate {
            Ok(creds)
        } else {
            debug!("a realm on the path is not trusted for delegation");
            Ok(creds.reset_delegate())
        }
    }

    /// A ticket to ourself on behalf of `client`. The result is evidence for
    /// [Self::acquire_s4u2proxy_creds].
    #[tracing::instrument(level = "debug", skip_all, fields(client = %client))]
    pub fn acquire_s4u2self_creds(
        &self,
        client: &Name,
        tgt: &KerberosCredentials,
    ) -> Result<KerberosCredentials, KrbError> {
        let realm = tgt.target_realm();
        if client.realm() != realm || tgt.client().realm() != realm {
            error!(?realm, "impersonation across realms is not supported");
            return Err(KrbError::CrossRealmUnsupported);
        }

        if !tgt.is_forwardable() {
            error!("S4U2Self needs a forwardable ticket granting ticket");
            return Err(KrbError::S4uTicketNotForwardable);
        }

        self.exchange
            .send_and_get_creds(tgt, tgt.client(), Impersonation::S4u2Self(client))
    }

    /// A ticket to `service` on behalf of the client of `evidence`.
    #[tracing::instrument(level = "debug", skip_all, fields(service = %service))]
    pub fn acquire_s4u2proxy_creds(
        &self,
        service: &Name,
        evidence: &KerberosCredentials,
        tgt: &KerberosCredentials,
    ) -> Result<KerberosCredentials, KrbError> {
        let realm = tgt.target_realm();
        if service.realm() != realm || evidence.client().realm() != realm {
            error!(?realm, "impersonation across realms is not supported");
            return Err(KrbError::CrossRealmUnsupported);
        }

        self.exchange
            .send_and_get_creds(tgt, service, Impersonation::S4u2Proxy(evidence))
    }
}

/// The final ticket must be for the service that was asked for. A referral
/// is never a service ticket.
fn issued_for(creds: KerberosCredentials, service: &Name) -> Result<KerberosCredentials, KrbError> {
    if creds.server().same_principal(service) {
        Ok(creds)
    } else {
        error!(requested = %service, received = %creds.server(), "not a ticket for the service");
        Err(KrbError::GeneralCredentialFailure)
    }
}
