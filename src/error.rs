use crate::asn1::constants::errors::KrbErrorCode;

#[derive(Debug)]
pub enum KrbError {
    // =========================================================================================
    // IMPORTANT: Don't add variables to variants in this  enum - it's a potential security risk
    // as you can leak internal state in an error as these can end up in userfacing contexts!!!
    //
    // In other words, any extra information you add here is a potential CVE.
    //
    // If you want to debug the error, then use the error! macro at the error raise site to
    // report relevant information.
    //
    // Lastly, the whole reason we have so many error variants is so that just from the error
    // variant alone, we already have a large amount of anonymised detail about the potential
    // cause the error.
    //
    // The single exception is KdcReply, which carries the error code the KDC sent us on the
    // wire. That value is already public and callers need it to decide on a retry.
    // =========================================================================================
    InvalidHmacSha1Key,
    InvalidHmacMd5Key,
    MessageAuthenticationFailed,
    MessageEmpty,
    InsufficientData,
    PlaintextEmpty,
    CtsCiphertextInvalid,
    UnsupportedEncryption,
    UnsupportedChecksumType,
    MissingPaData,
    MissingRealm,

    /// The wire bytes do not follow the expected ASN.1 structure.
    MalformedEncoding,
    /// The e-data of a KRB-ERROR was expected to hold METHOD-DATA but does not.
    PreAuthDataMalformed,

    DerDecodeEtypeInfo,
    DerDecodeEtypeInfo2,
    DerDecodeEncKdcRepPart,
    DerEncodeOctetString,
    DerEncodeAny,
    DerEncodeAuthenticator,
    DerEncodeApReq,
    DerEncodeKdcReqBody,
    DerEncodeKdcReq,
    DerEncodeKrbError,
    DerEncodeTicket,
    DerDecodeTicket,
    DerEncodePaForUser,
    DerEncodePaPacOptions,
    DerEncodeKerberosString,
    DerEncodeKerberosTime,

    PreauthInvalidS2KParams,

    NameNotPrincipal,
    NameNumberOfComponents,
    PrincipalNameInvalidComponents,
    PrincipalNameInvalidType,

    InvalidMessageType,
    InvalidMessageDirection,
    InvalidPvno,
    InvalidEncryptionKey,
    InvalidMicroseconds,

    /// The KDC answered with a KRB-ERROR.
    KdcReply(KrbErrorCode),

    TgsReplyNonceMismatch,
    TgsReplyServerMismatch,
    TgsReplyClientMismatch,
    TgsReplyClockSkew,

    /// The KDC issued credentials for someone other than the impersonated client.
    ImpersonationNotHonored,
    /// Impersonation of a client from another realm was requested.
    CrossRealmUnsupported,
    /// S4U2Self needs the service's own ticket to be forwardable.
    S4uTicketNotForwardable,

    /// No chain of cross realm tickets reaches the service realm.
    NoPathFound,
    /// A usable ticket granting ticket was obtained but the service ticket was not.
    GeneralCredentialFailure,

    NoKdcForRealm,
    TransportIo,
    TransportTimeout,
    TransportNoReply,
    RequestTooLarge,

    ConfigIo,
    ConfigParse,

    /// No really, do you have a time machine? How did you go back to before 1970?
    DoYouHaveATimeMachine,
}

impl KrbError {
    /// The protocol error code that describes this failure, if any.
    pub fn error_code(&self) -> Option<KrbErrorCode> {
        match self {
            KrbError::KdcReply(code) => Some(*code),
            KrbError::NoPathFound | KrbError::GeneralCredentialFailure => {
                Some(KrbErrorCode::KrbApErrGenCred)
            }
            KrbError::TgsReplyClockSkew => Some(KrbErrorCode::KrbApErrSkew),
            KrbError::TgsReplyNonceMismatch
            | KrbError::TgsReplyServerMismatch
            | KrbError::TgsReplyClientMismatch => Some(KrbErrorCode::KrbApErrModified),
            _ => None,
        }
    }
}
