use super::checksum::Checksum;
use super::kerberos_string::KerberosString;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use der::Sequence;

/// ```text
/// PA-FOR-USER ::= SEQUENCE {
///         -- PA TYPE 129
///         userName        [0] PrincipalName,
///         userRealm       [1] Realm,
///         cksum           [2] Checksum,
///         auth-package    [3] KerberosString
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub(crate) struct PaForUser {
    #[asn1(context_specific = "0")]
    pub(crate) user_name: PrincipalName,
    #[asn1(context_specific = "1")]
    pub(crate) user_realm: Realm,
    #[asn1(context_specific = "2")]
    pub(crate) cksum: Checksum,
    #[asn1(context_specific = "3")]
    pub(crate) auth_package: KerberosString,
}

impl PaForUser {
    /// The bytes that the PA-FOR-USER checksum is computed over. This is the
    /// name type in little endian, followed by each name component, the realm
    /// and the auth package with no separators.
    pub(crate) fn checksum_input(
        user_name: &PrincipalName,
        user_realm: &Realm,
        auth_package: &str,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&user_name.name_type.to_le_bytes());
        for component in user_name.name_string.iter() {
            buf.extend_from_slice(component.as_str().as_bytes());
        }
        buf.extend_from_slice(user_realm.as_str().as_bytes());
        buf.extend_from_slice(auth_package.as_bytes());
        buf
    }
}
