//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! PEM/DER parsing helpers for RSA private keys, OCID validation, and the
//! small hashing/encoding utilities shared across the auth providers and the
//! signature engine.
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use base64::prelude::{Engine as _, BASE64_STANDARD, BASE64_URL_SAFE_NO_PAD};
use md5::{Digest as _, Md5};
use regex::Regex;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncryptedPrivateKeyInfo};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::sync::OnceLock;

use crate::error::{ia_error, NoSQLError};

static OCID_RE: OnceLock<Regex> = OnceLock::new();

/// Validates an Oracle Cloud Identifier against the format used throughout OCI
/// IAM: a dot/colon-delimited sequence of at least 5 segments.
pub(crate) fn is_valid_ocid(s: &str) -> bool {
    let re = OCID_RE.get_or_init(|| {
        Regex::new(r"^([0-9a-zA-Z_-]+[.:])([0-9a-zA-Z_-]*[.:]){3,}([0-9a-zA-Z_-]+)$").unwrap()
    });
    re.is_match(s)
}

pub(crate) fn validate_ocid(field: &str, value: &str) -> Result<(), NoSQLError> {
    if !is_valid_ocid(value) {
        return Err(ia_error!("'{}' is not a valid OCID: '{}'", field, value));
    }
    Ok(())
}

/// base64("standard" alphabet, padded) of the SHA-256 digest of `data`.
pub(crate) fn sha256_base64(data: &[u8]) -> String {
    use sha2::Digest as _;
    let digest = Sha256::digest(data);
    BASE64_STANDARD.encode(digest)
}

/// Decodes a base64url (no padding) string, the alphabet used for the
/// claims segment of a JWT.
pub(crate) fn base64url_decode(s: &str) -> Result<Vec<u8>, NoSQLError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|e| ia_error!("invalid base64url content: {}", e))
}

/// Formats raw bytes as a colon-separated uppercase hex fingerprint, e.g. a
/// certificate's SHA-256 thumbprint: `AA:BB:CC:...`.
pub(crate) fn format_fingerprint(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parses an RSA private key from PEM bytes, supporting PKCS#1 (plain or
/// legacy `Proc-Type: 4,ENCRYPTED`/`DEK-Info` AES-CBC encrypted) and PKCS#8
/// (plain or standard `EncryptedPrivateKeyInfo`) encodings, per §4 of the
/// authorization spec.
pub(crate) fn parse_rsa_private_key(
    pem: &str,
    passphrase: Option<&[u8]>,
) -> Result<RsaPrivateKey, NoSQLError> {
    let pem = pem.trim();
    if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
        let der = extract_pem_body(pem, "ENCRYPTED PRIVATE KEY")?;
        let pass = passphrase
            .ok_or_else(|| ia_error!("encrypted PKCS#8 key requires a passphrase"))?;
        let info = EncryptedPrivateKeyInfo::try_from(der.as_slice())
            .map_err(|e| ia_error!("malformed encrypted PKCS#8 key: {}", e))?;
        let doc = info
            .decrypt(pass)
            .map_err(|e| ia_error!("failed to decrypt PKCS#8 key: {}", e))?;
        return RsaPrivateKey::from_pkcs8_der(doc.as_bytes())
            .map_err(|e| ia_error!("invalid PKCS#8 RSA key: {}", e));
    }
    if pem.contains("BEGIN PRIVATE KEY") {
        return RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| ia_error!("invalid PKCS#8 RSA key: {}", e));
    }
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        if let Some((cipher, iv_hex)) = legacy_encryption_header(pem) {
            let pass = passphrase
                .ok_or_else(|| ia_error!("encrypted PKCS#1 key requires a passphrase"))?;
            let der = decrypt_legacy_pkcs1(pem, &cipher, &iv_hex, pass)?;
            return RsaPrivateKey::from_pkcs1_der(&der)
                .map_err(|e| ia_error!("invalid PKCS#1 RSA key: {}", e));
        }
        return RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| ia_error!("invalid PKCS#1 RSA key: {}", e));
    }
    Err(ia_error!(
        "unrecognized PEM content: expected an RSA PRIVATE KEY, PRIVATE KEY, or ENCRYPTED PRIVATE KEY block"
    ))
}

// Extracts the base64 body of a PEM block with the given label, ignoring any
// header lines (e.g. legacy `Proc-Type`/`DEK-Info`) between the `BEGIN` line
// and the first blank line.
fn extract_pem_body(pem: &str, label: &str) -> Result<Vec<u8>, NoSQLError> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);
    let start = pem
        .find(&begin)
        .ok_or_else(|| ia_error!("missing '{}' marker", begin))?;
    let body_start = start + begin.len();
    let body_end = pem[body_start..]
        .find(&end)
        .ok_or_else(|| ia_error!("missing '{}' marker", end))?
        + body_start;
    let mut b64 = String::new();
    let mut past_headers = false;
    for line in pem[body_start..body_end].lines() {
        let line = line.trim();
        if line.is_empty() {
            past_headers = true;
            continue;
        }
        if !past_headers && line.contains(':') {
            // legacy header line, e.g. "Proc-Type: 4,ENCRYPTED"
            continue;
        }
        past_headers = true;
        b64.push_str(line);
    }
    BASE64_STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| ia_error!("invalid base64 in PEM body: {}", e))
}

// Returns (cipher-name, iv-hex) if the PKCS#1 PEM carries the legacy OpenSSL
// `Proc-Type: 4,ENCRYPTED` / `DEK-Info: <cipher>,<iv-hex>` header pair.
fn legacy_encryption_header(pem: &str) -> Option<(String, String)> {
    let mut encrypted = false;
    for line in pem.lines() {
        let line = line.trim();
        if line.starts_with("Proc-Type:") && line.contains("ENCRYPTED") {
            encrypted = true;
        }
        if let Some(rest) = line.strip_prefix("DEK-Info:") {
            let rest = rest.trim();
            if let Some((cipher, iv)) = rest.split_once(',') {
                if encrypted {
                    return Some((cipher.trim().to_string(), iv.trim().to_string()));
                }
            }
        }
    }
    None
}

// OpenSSL's legacy key derivation for PEM-encrypted PKCS#1 keys: repeatedly
// hash (previous-digest || passphrase || salt) with MD5 until enough key
// material has been produced. The IV doubles as the salt.
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8], key_len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(key_len);
    let mut prev: Vec<u8> = Vec::new();
    while key.len() < key_len {
        let mut hasher = Md5::new();
        hasher.update(&prev);
        hasher.update(passphrase);
        hasher.update(salt);
        let digest = hasher.finalize();
        prev = digest.to_vec();
        key.extend_from_slice(&digest);
    }
    key.truncate(key_len);
    key
}

fn decrypt_legacy_pkcs1(
    pem: &str,
    cipher: &str,
    iv_hex: &str,
    passphrase: &[u8],
) -> Result<Vec<u8>, NoSQLError> {
    let key_len = match cipher {
        "AES-128-CBC" => 16,
        "AES-192-CBC" => 24,
        "AES-256-CBC" => 32,
        other => {
            return Err(ia_error!(
                "unsupported legacy PEM cipher '{}': only AES-128/192/256-CBC are supported",
                other
            ))
        }
    };
    let iv = hex_decode(iv_hex)?;
    if iv.len() != 16 {
        return Err(ia_error!("invalid DEK-Info IV length"));
    }
    let mut ciphertext = extract_pem_body(pem, "RSA PRIVATE KEY")?;
    let key = evp_bytes_to_key(passphrase, &iv, key_len);

    let plaintext_len = match key_len {
        16 => decrypt_cbc::<aes::Aes128>(&key, &iv, &mut ciphertext)?,
        24 => decrypt_cbc::<aes::Aes192>(&key, &iv, &mut ciphertext)?,
        32 => decrypt_cbc::<aes::Aes256>(&key, &iv, &mut ciphertext)?,
        _ => unreachable!(),
    };
    ciphertext.truncate(plaintext_len);
    Ok(ciphertext)
}

fn decrypt_cbc<C>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<usize, NoSQLError>
where
    C: aes::cipher::BlockSizeUser + aes::cipher::KeyInit + aes::cipher::BlockDecryptMut + Clone,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| ia_error!("invalid key/IV for legacy PEM decryption: {}", e))?;
    let out = decryptor
        .decrypt_padded_mut::<Pkcs7>(buf)
        .map_err(|_| ia_error!("incorrect passphrase or corrupt encrypted private key"))?;
    Ok(out.len())
}

fn hex_decode(s: &str) -> Result<Vec<u8>, NoSQLError> {
    if s.len() % 2 != 0 {
        return Err(ia_error!("invalid hex string"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| ia_error!("invalid hex byte: {}", e))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ocid_validation() {
        assert!(is_valid_ocid(
            "ocid1.tenancy.oc1..aaaaaaaattuxbj75pnn3nksvzyidshdbrfmmeflv4kkemajroz2thvca4kba"
        ));
        assert!(is_valid_ocid("ocid1.user.oc1..bbb"));
        assert!(!is_valid_ocid("not-an-ocid"));
        assert!(!is_valid_ocid(""));
    }

    #[test]
    fn test_fingerprint_formatting() {
        assert_eq!(format_fingerprint(&[0xAA, 0x01, 0xFF]), "AA:01:FF");
    }

    #[test]
    fn test_base64url_decode() {
        // '{"a":1}' with no padding
        let decoded = base64url_decode("eyJhIjoxfQ").unwrap();
        assert_eq!(decoded, br#"{"a":1}"#);
    }

    #[test]
    fn test_parse_pkcs1_plain_key() {
        let rsa = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem = rsa::pkcs1::EncodeRsaPrivateKey::to_pkcs1_pem(
            &rsa,
            rsa::pkcs8::LineEnding::LF,
        )
        .unwrap();
        let parsed = parse_rsa_private_key(&pem, None).unwrap();
        assert_eq!(parsed.to_public_key(), rsa.to_public_key());
    }

    #[test]
    fn test_parse_pkcs8_plain_key() {
        let rsa = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem = rsa::pkcs8::EncodePrivateKey::to_pkcs8_pem(&rsa, rsa::pkcs8::LineEnding::LF)
            .unwrap();
        let parsed = parse_rsa_private_key(&pem, None).unwrap();
        assert_eq!(parsed.to_public_key(), rsa.to_public_key());
    }

    #[test]
    fn test_parse_unrecognized_pem_fails() {
        assert!(parse_rsa_private_key("not a pem", None).is_err());
    }
}
