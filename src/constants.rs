use std::time::Duration;

pub(crate) const AES_256_KEY_LEN: usize = 32;
pub(crate) const AES_BLOCK_SIZE: usize = 16;
pub(crate) const SHA1_HMAC_LEN: usize = 12;
pub(crate) const IV_ZERO: [u8; AES_BLOCK_SIZE] = [0u8; AES_BLOCK_SIZE];

/// The "well known constant" of RFC3961 section 5.3, which is n-folded to the
/// cipher block size when deriving a protocol key from a passphrase.
pub(crate) const DK_KERBEROS_CONSTANT: &[u8] = b"kerberos";

// RFC3961 section 5.3, the final octet of the key usage derivation constants.
pub(crate) const DK_USAGE_KC: u8 = 0x99;
pub(crate) const DK_USAGE_KE: u8 = 0xAA;
pub(crate) const DK_USAGE_KI: u8 = 0x55;

/// RFC3962 default iteration count. Only used when a KDC does not send s2kparams.
pub(crate) const RFC_PBKDF2_SHA1_ITER: u32 = 0x1000;

pub(crate) const DEFAULT_IO_MAX_SIZE: usize = 128 * 1024;

pub(crate) const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);
pub(crate) const DEFAULT_KDC_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_KDC_PORT: u16 = 88;

/// Drift between the monotonic estimate of "now" and the wall clock that forces
/// the clock baseline to be taken again.
pub(crate) const CLOCK_RESYNC_THRESHOLD: Duration = Duration::from_millis(100);

// MS-SFU 2.2.1, the checksum of PA-FOR-USER
pub(crate) const KERB_CHECKSUM_HMAC_MD5: i32 = -138;
pub(crate) const KERB_NON_KERB_CKSUM_SALT: i32 = 17;
pub(crate) const PA_FOR_USER_AUTH_PACKAGE: &str = "Kerberos";

// RFC4120 section 7.5.1
pub(crate) const KEY_USAGE_TGS_REQ_AUTH_CKSUM: i32 = 6;
pub(crate) const KEY_USAGE_TGS_REQ_AUTH: i32 = 7;
pub(crate) const KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY: i32 = 8;

pub(crate) const CONFIG_SECTION_LIBDEFAULTS: &str = "libdefaults";
pub(crate) const CONFIG_KEY_CLOCKSKEW: &str = "clockskew";
pub(crate) const CONFIG_KEY_KDC_TIMEOUT: &str = "kdc_timeout";
