use crate::asn1::{
    constants::message_types::KrbMessageType, kdc_rep::KdcRep,
    tagged_enc_kdc_rep_part::TaggedEncKdcRepPart,
};
use crate::constants::KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY;
use crate::error::KrbError;
use crate::proto::{EncTicket, EncryptedData, KdcReplyPart, Name, SessionKey};
use der::Decode;
use tracing::{error, trace};

#[derive(Debug, Clone)]
pub struct TicketGrantReply {
    pub client_name: Name,
    pub enc_part: EncryptedData,
    pub ticket: EncTicket,
}

impl TicketGrantReply {
    /// Decrypt the EncTGSRepPart with the session key of the ticket that
    /// authenticated the request.
    pub fn decrypt_enc_part(&self, session_key: &SessionKey) -> Result<KdcReplyPart, KrbError> {
        let data = session_key.decrypt(&self.enc_part, KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY)?;

        // Some KDCs tag the reply part as an EncASRepPart even in a TGS-REP.
        let tagged = TaggedEncKdcRepPart::from_der(&data).map_err(|err| {
            error!(?err, "unable to decode EncTGSRepPart");
            KrbError::DerDecodeEncKdcRepPart
        })?;

        trace!(?tagged);

        KdcReplyPart::try_from(crate::asn1::enc_kdc_rep_part::EncKdcRepPart::from(tagged))
    }
}

impl TryFrom<KdcRep> for TicketGrantReply {
    type Error = KrbError;

    fn try_from(rep: KdcRep) -> Result<Self, KrbError> {
        if rep.pvno != 5 {
            error!(pvno = rep.pvno, "unsupported KDC-REP version");
            return Err(KrbError::InvalidPvno);
        }

        let msg_type =
            KrbMessageType::try_from(rep.msg_type).map_err(|_| KrbError::InvalidMessageType)?;

        if !matches!(msg_type, KrbMessageType::KrbTgsRep) {
            error!(?msg_type, "expected a TGS-REP");
            return Err(KrbError::InvalidMessageDirection);
        }

        let enc_part = EncryptedData::from(rep.enc_part);
        trace!(?enc_part);

        let client_name = Name::try_from((rep.cname, rep.crealm))?;
        let ticket = EncTicket::try_from(rep.ticket)?;

        Ok(TicketGrantReply {
            client_name,
            enc_part,
            ticket,
        })
    }
}

impl TryFrom<&TicketGrantReply> for KdcRep {
    type Error = KrbError;

    fn try_from(rep: &TicketGrantReply) -> Result<Self, KrbError> {
        Ok(KdcRep {
            pvno: 5,
            msg_type: KrbMessageType::KrbTgsRep.into(),
            padata: None,
            crealm: (&rep.client_name).try_into()?,
            cname: (&rep.client_name).try_into()?,
            ticket: rep.ticket.clone().try_into()?,
            enc_part: rep.enc_part.clone().try_into()?,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::TicketGrantReply;
    use crate::error::KrbError;
    use crate::proto::tests::{test_ticket, test_times, TEST_SESSION_KEY};
    use crate::proto::{KdcReplyPart, Name, SessionKey, TicketFlags};

    fn reply_part(nonce: i32) -> KdcReplyPart {
        KdcReplyPart {
            key: SessionKey::from_aes256([0x11; 32]),
            nonce,
            flags: TicketFlags::Forwardable | TicketFlags::OkAsDelegate,
            times: test_times(),
            server: Name::service("HTTP", "www.example.com", "EXAMPLE.COM"),
        }
    }

    #[test]
    fn tgs_rep_decrypt() {
        let tgt_key = SessionKey::from_aes256(TEST_SESSION_KEY);
        let server = Name::service("HTTP", "www.example.com", "EXAMPLE.COM");
        let reply = TicketGrantReply::seal(
            Name::principal("alice", "EXAMPLE.COM"),
            test_ticket(&server),
            &reply_part(42),
            &tgt_key,
        );

        let part = reply.decrypt_enc_part(&tgt_key).expect("Failed to decrypt");
        assert_eq!(part.nonce, 42);
        assert_eq!(part.key, SessionKey::from_aes256([0x11; 32]));
        assert!(part.server.same_principal(&server));
        assert!(part.flags.contains(TicketFlags::OkAsDelegate));
        assert_eq!(part.times, test_times());
    }

    #[test]
    fn tgs_rep_wrong_key() {
        let reply = TicketGrantReply::seal(
            Name::principal("alice", "EXAMPLE.COM"),
            test_ticket(&Name::service_krbtgt("EXAMPLE.COM")),
            &reply_part(7),
            &SessionKey::from_aes256(TEST_SESSION_KEY),
        );
        assert!(matches!(
            reply.decrypt_enc_part(&SessionKey::from_aes256([0x22; 32])),
            Err(KrbError::MessageAuthenticationFailed)
        ));
    }
}
