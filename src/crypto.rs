//! aes256-cts-hmac-sha1-96 (RFC3961, RFC3962) and the HMAC-MD5 keyed
//! checksum of MS-SFU.

use crate::constants::*;
use crate::error::KrbError;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{digest::FixedOutput, Hmac, Mac};
use md5::{Digest, Md5};
use pbkdf2::pbkdf2_hmac;
use rand::{rng, Rng};
use sha1::Sha1;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

type HmacSha1 = Hmac<Sha1>;
type HmacMd5 = Hmac<Md5>;

type BaseKey = [u8; AES_256_KEY_LEN];
type Block = [u8; AES_BLOCK_SIZE];

/// PBKDF2-HMAC-SHA1 over the passphrase and salt, then DK with the
/// "kerberos" constant. The salt is normally realm || principal components
/// unless the KDC supplied one in ETYPE-INFO2.
pub(crate) fn string_to_key_aes256(
    passphrase: &[u8],
    salt: &[u8],
    iter_count: u32,
) -> Result<BaseKey, KrbError> {
    let mut tkey = [0u8; AES_256_KEY_LEN];
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, &mut tkey);
    Ok(derive(&tkey, DK_KERBEROS_CONSTANT))
}

/// Encrypt `plaintext` under the Ke of `key_usage`, prefixed with a random
/// confounder and followed by the truncated HMAC under Ki.
pub(crate) fn seal_aes256(
    key: &BaseKey,
    plaintext: &[u8],
    key_usage: i32,
) -> Result<Vec<u8>, KrbError> {
    if plaintext.is_empty() {
        return Err(KrbError::PlaintextEmpty);
    }

    let mut message = Vec::with_capacity(AES_BLOCK_SIZE + plaintext.len() + SHA1_HMAC_LEN);
    message.resize(AES_BLOCK_SIZE, 0);
    rng().fill(&mut message[..]);
    message.extend_from_slice(plaintext);

    let tag = hmac_sha1_96(&derive_usage(key, key_usage, DK_USAGE_KI), &message)?;

    let mut sealed = cts_encrypt(&derive_usage(key, key_usage, DK_USAGE_KE), &message)?;
    sealed.extend_from_slice(&tag);
    Ok(sealed)
}

/// Reverse of [seal_aes256]. The confounder is dropped from the result.
pub(crate) fn unseal_aes256(
    key: &BaseKey,
    sealed: &[u8],
    key_usage: i32,
) -> Result<Vec<u8>, KrbError> {
    let Some((body, tag)) = sealed.split_last_chunk::<SHA1_HMAC_LEN>() else {
        return Err(KrbError::InsufficientData);
    };
    if body.is_empty() {
        return Err(KrbError::MessageEmpty);
    }

    let mut message = cts_decrypt(&derive_usage(key, key_usage, DK_USAGE_KE), body)?;

    let ki = derive_usage(key, key_usage, DK_USAGE_KI);
    let mut mac = HmacSha1::new_from_slice(&ki).map_err(|_| KrbError::InvalidHmacSha1Key)?;
    mac.update(&message);
    mac.verify_truncated_left(tag)
        .map_err(|_| KrbError::MessageAuthenticationFailed)?;

    Ok(message.split_off(AES_BLOCK_SIZE))
}

/// hmac-sha1-96-aes256, checksum type 16.
pub(crate) fn checksum_aes256(
    plaintext: &[u8],
    key: &BaseKey,
    key_usage: i32,
) -> Result<Vec<u8>, KrbError> {
    if plaintext.is_empty() {
        return Err(KrbError::PlaintextEmpty);
    }
    hmac_sha1_96(&derive_usage(key, key_usage, DK_USAGE_KC), plaintext).map(|tag| tag.to_vec())
}

/// KERB_CHECKSUM_HMAC_MD5 of MS-SFU 2.2.1. PA-FOR-USER carries this whatever
/// the enctype of the session key is.
pub(crate) fn checksum_hmac_md5(
    plaintext: &[u8],
    key: &[u8],
    key_usage: i32,
) -> Result<Vec<u8>, KrbError> {
    let mut mac = HmacMd5::new_from_slice(key).map_err(|_| KrbError::InvalidHmacMd5Key)?;
    mac.update(b"signaturekey\0");
    let ksign = mac.finalize_fixed();

    let mut hasher = Md5::new();
    hasher.update(key_usage.to_le_bytes());
    hasher.update(plaintext);
    let digest = hasher.finalize();

    let mut mac = HmacMd5::new_from_slice(&ksign).map_err(|_| KrbError::InvalidHmacMd5Key)?;
    mac.update(&digest);
    Ok(mac.finalize_fixed().to_vec())
}

fn hmac_sha1_96(key: &[u8], data: &[u8]) -> Result<[u8; SHA1_HMAC_LEN], KrbError> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| KrbError::InvalidHmacSha1Key)?;
    mac.update(data);
    let full = mac.finalize_fixed();

    let mut tag = [0u8; SHA1_HMAC_LEN];
    tag.copy_from_slice(&full[..SHA1_HMAC_LEN]);
    Ok(tag)
}

/// DK(base, usage || kind) for one of Kc, Ke or Ki.
fn derive_usage(base: &BaseKey, key_usage: i32, kind: u8) -> BaseKey {
    let mut constant = [0u8; 5];
    let (usage, tail) = constant.split_at_mut(4);
    usage.copy_from_slice(&key_usage.to_be_bytes());
    tail[0] = kind;
    derive(base, &constant)
}

/// RFC3961 DR and DK. The n-folded constant is encrypted in CBC with a zero
/// IV until there is enough output for a key. AES256 takes exactly two blocks
/// and the random-to-key step is the identity.
fn derive(base: &BaseKey, constant: &[u8]) -> BaseKey {
    let mut out = [0u8; AES_256_KEY_LEN];
    out[..AES_BLOCK_SIZE].copy_from_slice(&n_fold(constant, AES_BLOCK_SIZE));

    // The second block is zero, so chaining encrypts the first output again.
    let mut cbc = Aes256CbcEnc::new(base.into(), &IV_ZERO.into());
    for block in out.chunks_exact_mut(AES_BLOCK_SIZE) {
        cbc.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    out
}

/// RFC3961 section 5.1. Copies of the input, each rotated 13 bits further
/// right than the last, are concatenated to lcm(len, out_len) bytes and summed
/// in out_len byte chunks with one's complement addition.
pub(crate) fn n_fold(input: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_len];
    if input.is_empty() || out_len == 0 {
        return out;
    }

    let in_len = input.len();
    let bits = in_len * 8;
    let bit_at = |pos: usize| (input[pos / 8] >> (7 - pos % 8)) & 1;

    let stretched: Vec<u8> = (0..lcm(in_len, out_len))
        .map(|n| {
            let rotation = (13 * (n / in_len)) % bits;
            let start = (n % in_len) * 8;
            (0..8).fold(0u8, |acc, bit| {
                (acc << 1) | bit_at((start + bit + bits - rotation) % bits)
            })
        })
        .collect();

    for chunk in stretched.chunks_exact(out_len) {
        let mut carry = 0u32;
        for (acc, byte) in out.iter_mut().zip(chunk).rev() {
            let sum = u32::from(*acc) + u32::from(*byte) + carry;
            *acc = sum as u8;
            carry = sum >> 8;
        }
        while carry != 0 {
            for acc in out.iter_mut().rev() {
                let sum = u32::from(*acc) + carry;
                *acc = sum as u8;
                carry = sum >> 8;
                if carry == 0 {
                    break;
                }
            }
        }
    }

    out
}

fn lcm(a: usize, b: usize) -> usize {
    let (mut x, mut y) = (a, b);
    while y != 0 {
        (x, y) = (y, x % y);
    }
    a / x * b
}

/// CBC-CS3. Zero pad to whole blocks, run plain CBC, then swap the final two
/// blocks and cut the output back to the input length.
fn cts_encrypt(ke: &BaseKey, input: &[u8]) -> Result<Vec<u8>, KrbError> {
    if input.len() <= AES_BLOCK_SIZE {
        return Err(KrbError::CtsCiphertextInvalid);
    }

    let blocks = input.len().div_ceil(AES_BLOCK_SIZE);
    let mut buf = vec![0u8; blocks * AES_BLOCK_SIZE];
    buf[..input.len()].copy_from_slice(input);

    let mut cbc = Aes256CbcEnc::new(ke.into(), &IV_ZERO.into());
    for block in buf.chunks_exact_mut(AES_BLOCK_SIZE) {
        cbc.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }

    let (head, last) = buf.split_at_mut((blocks - 1) * AES_BLOCK_SIZE);
    head[(blocks - 2) * AES_BLOCK_SIZE..].swap_with_slice(last);
    buf.truncate(input.len());
    Ok(buf)
}

/// Inverse of [cts_encrypt]. The last whole block on the wire is the final
/// CBC block. Decrypting it alone yields the tail of the penultimate
/// ciphertext block (the zero padding xored with it), which rebuilds that
/// block so CBC can finish.
fn cts_decrypt(ke: &BaseKey, input: &[u8]) -> Result<Vec<u8>, KrbError> {
    if input.len() <= AES_BLOCK_SIZE {
        return Err(KrbError::CtsCiphertextInvalid);
    }

    let blocks = input.len().div_ceil(AES_BLOCK_SIZE);
    let tail_len = input.len() - (blocks - 1) * AES_BLOCK_SIZE;
    let (lead, rest) = input.split_at((blocks - 2) * AES_BLOCK_SIZE);
    let (swapped_last, partial) = rest.split_at(AES_BLOCK_SIZE);

    let mut out = Vec::with_capacity(input.len());
    let mut cbc = Aes256CbcDec::new(ke.into(), &IV_ZERO.into());
    for chunk in lead.chunks_exact(AES_BLOCK_SIZE) {
        let mut block: Block = [0u8; AES_BLOCK_SIZE];
        block.copy_from_slice(chunk);
        cbc.decrypt_block_mut((&mut block).into());
        out.extend_from_slice(&block);
    }

    let mut z: Block = [0u8; AES_BLOCK_SIZE];
    z.copy_from_slice(swapped_last);
    <Aes256 as aes::cipher::KeyInit>::new(ke.into()).decrypt_block((&mut z).into());

    let final_plain: Vec<u8> = z[..tail_len]
        .iter()
        .zip(partial)
        .map(|(z, c)| z ^ c)
        .collect();

    let mut penultimate = z;
    penultimate[..tail_len].copy_from_slice(partial);
    cbc.decrypt_block_mut((&mut penultimate).into());

    out.extend_from_slice(&penultimate);
    out.extend_from_slice(&final_plain);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    fn test_key() -> BaseKey {
        string_to_key_aes256(b"test", b"test1234", RFC_PBKDF2_SHA1_ITER)
            .expect("Failed to derive key")
    }

    #[test]
    fn n_fold_rfc3961_vectors() {
        let vectors: [(&[u8], usize, &str); 4] = [
            (b"012345", 8, "be072631276b1955"),
            (b"password", 7, "78a07b6caf85fa"),
            (b"kerberos", 16, "6b65726265726f737b9b5b2b93132b93"),
            (b"kerberos", 8, "6b65726265726f73"),
        ];
        for (input, len, expect) in vectors {
            assert_eq_hex!(n_fold(input, len), hex::decode(expect).expect("bad hex"));
        }

        assert_eq!(n_fold(b"", 16), vec![0u8; 16]);
        assert!(n_fold(b"kerberos", 0).is_empty());
    }

    #[test]
    fn string_to_key_vectors() {
        // https://www.rfc-editor.org/rfc/rfc3962#appendix-B and a key taken
        // from a live KDC.
        let vectors: [(&str, &str, u32, &str); 3] = [
            (
                "password",
                "ATHENA.MIT.EDUraeburn",
                1,
                "fe697b52bc0d3ce14432ba036a92e65bbb52280990a2fa27883998d72af30161",
            ),
            (
                "password",
                "ATHENA.MIT.EDUraeburn",
                1200,
                "55a6ac740ad17b4846941051e1e8b0a7548d93b0ab30a8bc3ff16280382b8c2a",
            ),
            (
                "Minnie1234",
                "KINGDOM.HEARTSmickey",
                RFC_PBKDF2_SHA1_ITER,
                "d3301f0f2539cc4026a569f8b7c36715c8daef109fa3d8b2e14616aacab549fd",
            ),
        ];
        for (passphrase, salt, iter, expect) in vectors {
            let key = string_to_key_aes256(passphrase.as_bytes(), salt.as_bytes(), iter)
                .expect("Failed to derive key");
            assert_eq_hex!(key.to_vec(), hex::decode(expect).expect("bad hex"));
        }
    }

    #[test]
    fn unseal_captured_messages() {
        let key = string_to_key_aes256(b"admin", b"admin1234", RFC_PBKDF2_SHA1_ITER)
            .expect("Failed to derive key");
        let sealed = hex::decode(
            "29737f3db6bcdfe9990fb2136d3efe6f2100e6c4ac75824299d8d3702f5a2e31c7a336747dfd734a1ea0165ebb27c0d7ce9b5aec7a",
        )
        .expect("bad hex");
        assert_eq!(
            unseal_aes256(&key, &sealed, 1).expect("Failed to unseal"),
            b"3ahwzt9MG9WVEuBVC5j0oi6sI".to_vec()
        );

        let sealed = hex::decode(
            "3d291c685489e7b75dabdc6e010ad0019db16481b12cb8bfa513619242761f990de2c027661c9833bcced3",
        )
        .expect("bad hex");
        assert_eq!(
            unseal_aes256(&test_key(), &sealed, 2).expect("Failed to unseal"),
            b"lJ3ftfwxjsR522O".to_vec()
        );

        // A PA-ENC-TIMESTAMP, which decrypts to a DER sequence.
        let key = string_to_key_aes256(
            b"password",
            b"EXAMPLE.COMtestuser_preauth",
            RFC_PBKDF2_SHA1_ITER,
        )
        .expect("Failed to derive key");
        let sealed = hex::decode("b736f4dba847718b9f634b7ac94d5d691663164d877a0d875b94f786222ae9dca8cf68a972cfe6b5bec1c29682ec3c507307e7c32eedc032")
            .expect("bad hex");
        let plain = unseal_aes256(&key, &sealed, 1).expect("Failed to unseal");
        assert_eq!(plain.first(), Some(&0x30));
    }

    #[test]
    fn seal_then_unseal_at_block_boundaries() {
        let key = test_key();
        // Shorter than a block, one block, two blocks and unaligned.
        for (usage, len) in [(3, 8), (4, 16), (2, 32), (5, 49)] {
            let plain = vec![len as u8; len];
            let sealed = seal_aes256(&key, &plain, usage).expect("Failed to seal");
            assert_eq!(sealed.len(), AES_BLOCK_SIZE + len + SHA1_HMAC_LEN);
            assert_eq!(
                unseal_aes256(&key, &sealed, usage).expect("Failed to unseal"),
                plain
            );
            // Another usage derives other keys.
            assert!(unseal_aes256(&key, &sealed, usage + 1).is_err());
        }
    }

    #[test]
    fn unseal_rejects_bad_input() {
        let key = [0x11u8; AES_256_KEY_LEN];
        let mut sealed = seal_aes256(&key, b"some plaintext", 8).expect("Failed to seal");
        sealed[20] ^= 0x01;
        assert!(matches!(
            unseal_aes256(&key, &sealed, 8),
            Err(KrbError::MessageAuthenticationFailed)
        ));

        assert!(matches!(
            unseal_aes256(&key, &[0u8; 4], 8),
            Err(KrbError::InsufficientData)
        ));
        assert!(matches!(
            unseal_aes256(&key, &[0u8; SHA1_HMAC_LEN], 8),
            Err(KrbError::MessageEmpty)
        ));
        assert!(matches!(
            unseal_aes256(&key, &[0u8; AES_BLOCK_SIZE + SHA1_HMAC_LEN], 8),
            Err(KrbError::CtsCiphertextInvalid)
        ));
        assert!(matches!(
            seal_aes256(&key, b"", 8),
            Err(KrbError::PlaintextEmpty)
        ));
    }

    #[test]
    fn checksum_aes256_authenticator_vector() {
        let input = hex::decode("3067a00703050000810000a20d1b0b4558414d504c452e434f4da3253023a003020103a11c301a1b04686f73741b127065707065722e6578616d706c652e636f6da511180f32303234313031303230333832335aa7060204769220c1a80b3009020112020113020114")
            .expect("bad hex");
        let mut base_key = [0u8; AES_256_KEY_LEN];
        base_key.copy_from_slice(
            &hex::decode("3C4EEFA91060DC4000582C17885AA63A58CD5A57C5CD3E7601A0587E7E05F9D0")
                .expect("bad hex"),
        );

        assert_eq_hex!(
            derive_usage(&base_key, 6, DK_USAGE_KC).to_vec(),
            hex::decode("14AD9322E8134937815FB995067F8C1859A8237C599E450F2BC1E99330C94232")
                .expect("bad hex")
        );
        assert_eq_hex!(
            checksum_aes256(&input, &base_key, 6).expect("Failed to checksum"),
            hex::decode("351E56F9FA207CDCA62A0BDC").expect("bad hex")
        );
    }

    #[test]
    fn checksum_hmac_md5_is_keyed_by_usage_and_data() {
        let key = [0x42u8; AES_256_KEY_LEN];
        let sum = |data: &[u8], usage| checksum_hmac_md5(data, &key, usage).expect("checksum");

        let a = sum(b"data", KERB_NON_KERB_CKSUM_SALT);
        assert_eq!(a.len(), 16);
        assert_eq!(a, sum(b"data", KERB_NON_KERB_CKSUM_SALT));
        assert_ne!(a, sum(b"data", 6));
        assert_ne!(a, sum(b"datb", KERB_NON_KERB_CKSUM_SALT));
    }
}
