pub mod ap_options;
pub mod ap_req;
pub mod authenticator;
pub mod authorization_data;
pub mod checksum;
pub mod constants;
pub mod enc_kdc_rep_part;
pub mod encrypted_data;
pub mod encryption_key;
pub mod etype_info;
pub mod etype_info2;
pub mod host_address;
pub mod host_addresses;
pub mod kdc_options;
pub mod kdc_rep;
pub mod kdc_req;
pub mod kdc_req_body;
pub mod kerberos_flags;
pub mod kerberos_string;
pub mod kerberos_time;
pub mod krb_error;
pub mod krb_kdc_rep;
pub mod krb_kdc_req;
pub mod last_req;
pub mod microseconds;
pub mod pa_data;
pub mod pa_for_user;
pub mod pa_pac_options;
pub mod principal_name;
pub mod realm;
pub mod tagged_enc_kdc_rep_part;
pub mod tagged_ticket;
pub mod ticket_flags;

pub use der::asn1::Ia5String;
pub use der::asn1::OctetString;
pub use der::DateTime;
