use crate::config::RealmHierarchy;
use crate::error::KrbError;
use crate::exchange::{Impersonation, TgsExchange};
use crate::proto::{KerberosCredentials, Name};
use tracing::{debug, error, info};

/// Acquires the chain of cross realm ticket granting tickets from the realm a
/// TGT is valid for to a service realm.
pub struct RealmPathResolver<'a, E: ?Sized, H: ?Sized> {
    exchange: &'a E,
    hierarchy: &'a H,
}

impl<'a, E, H> RealmPathResolver<'a, E, H>
where
    E: TgsExchange + ?Sized,
    H: RealmHierarchy + ?Sized,
{
    pub fn new(exchange: &'a E, hierarchy: &'a H) -> Self {
        RealmPathResolver {
            exchange,
            hierarchy,
        }
    }

    /// Returns a TGT for `service_realm` and whether every hop on the way
    /// was marked OK-AS-DELEGATE.
    #[tracing::instrument(level = "debug", skip_all, fields(service_realm = %service_realm))]
    pub fn resolve(
        &self,
        tgt: &KerberosCredentials,
        service_realm: &str,
    ) -> Result<(KerberosCredentials, bool), KrbError> {
        let local = tgt.target_realm();
        if local == service_realm {
            return Ok((tgt.clone(), true));
        }

        let realms = self.hierarchy.realms_list(local, service_realm);
        debug!(?realms);

        match (realms.first(), realms.last()) {
            (Some(first), Some(last)) if first == local && last == service_realm => {}
            _ => {
                error!(?realms, ?local, "realm list does not join the client and service realms");
                return Err(KrbError::NoPathFound);
            }
        }

        let mut state = (tgt.clone(), true);
        let mut at = 0;

        loop {
            let (current, ok_as_delegate) = state;

            let Some(next) = self
                .direct_hop(&current, &realms[at], service_realm)
                .or_else(|| self.capath_hop(&current, &realms, at))
            else {
                error!(realm = %realms[at], "no cross realm ticket from realm");
                return Err(KrbError::NoPathFound);
            };

            let ok_as_delegate = ok_as_delegate && next.ok_as_delegate();
            let reached = next.target_realm();

            if reached == service_realm {
                info!(hops = at + 1, "reached service realm");
                return Ok((next, ok_as_delegate));
            }

            match realms
                .iter()
                .skip(at + 1)
                .position(|realm| realm == reached)
            {
                Some(offset) => {
                    at += 1 + offset;
                    debug!(realm = %realms[at], "moved along the realm path");
                    state = (next, ok_as_delegate);
                }
                None => {
                    error!(?reached, "issued ticket is for a realm outside the path");
                    return Err(KrbError::NoPathFound);
                }
            }
        }
    }

    fn direct_hop(
        &self,
        current: &KerberosCredentials,
        realm: &str,
        service_realm: &str,
    ) -> Option<KerberosCredentials> {
        self.hop(current, &Name::cross_realm_krbtgt(service_realm, realm))
    }

    /// Try each later realm of the path in turn. The service realm itself is
    /// left out, the direct hop already asked for krbtgt/SERVICE and a second
    /// identical request would only fail again.
    fn capath_hop(
        &self,
        current: &KerberosCredentials,
        realms: &[String],
        at: usize,
    ) -> Option<KerberosCredentials> {
        let last = realms.len().saturating_sub(1);
        realms
            .get(at + 1..last)
            .unwrap_or_default()
            .iter()
            .find_map(|target| self.hop(current, &Name::cross_realm_krbtgt(target, &realms[at])))
    }

    fn hop(&self, current: &KerberosCredentials, krbtgt: &Name) -> Option<KerberosCredentials> {
        match self
            .exchange
            .send_and_get_creds(current, krbtgt, Impersonation::None)
        {
            Ok(creds) => {
                debug!(requested = %krbtgt, received = %creds.server(), "cross realm ticket");
                Some(creds)
            }
            Err(err) => {
                debug!(requested = %krbtgt, ?err, "cross realm ticket unavailable");
                None
            }
        }
    }
}
