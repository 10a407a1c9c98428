/// ```text
/// KerberosTime    ::= GeneralizedTime -- with no fractional seconds
/// ```
pub(crate) type KerberosTime = der::asn1::GeneralizedTime;
