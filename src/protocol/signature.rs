//! Callback signature scheme: SHA1withRSA (PKCS#1 v1.5), base64 transport.
//!
//! SHA-1 is the platform's legacy digest choice and is kept for wire
//! compatibility. The scheme is isolated behind `sign`/`verify` so a digest
//! upgrade on the platform side stays a local change.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid RSA key material: {0}")]
    InvalidKey(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Sign `payload` with the merchant private key, returning a base64 signature.
pub fn sign(payload: &[u8], private_key_pem: &str) -> Result<String, SignatureError> {
    let private_key = load_private_key(private_key_pem)?;
    let signing_key = SigningKey::<Sha1>::new(private_key);
    let signature = signing_key
        .try_sign(payload)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verify a base64 signature over `payload` against the platform public key.
///
/// Never fails loudly: malformed base64, malformed key material and empty
/// payloads all resolve to `false` so the caller treats "unverifiable" the
/// same as "verification failed".
pub fn verify(payload: &[u8], signature_b64: &str, public_key_pem: &str) -> bool {
    if payload.is_empty() {
        return false;
    }
    let public_key = match load_public_key(public_key_pem) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature_bytes = match BASE64.decode(signature_b64.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = match Signature::try_from(signature_bytes.as_slice()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    VerifyingKey::<Sha1>::new(public_key)
        .verify(payload, &signature)
        .is_ok()
}

fn load_public_key(raw: &str) -> Result<RsaPublicKey, SignatureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignatureError::InvalidKey("empty public key".to_string()));
    }
    if trimmed.contains("-----BEGIN") {
        return match RsaPublicKey::from_public_key_pem(trimmed) {
            Ok(key) => Ok(key),
            Err(_) => RsaPublicKey::from_pkcs1_pem(trimmed)
                .map_err(|e| SignatureError::InvalidKey(e.to_string())),
        };
    }
    // Key material handed over as bare base64; synthesize the PEM envelope.
    match RsaPublicKey::from_public_key_pem(&wrap_pem("PUBLIC KEY", trimmed)) {
        Ok(key) => Ok(key),
        Err(_) => RsaPublicKey::from_pkcs1_pem(&wrap_pem("RSA PUBLIC KEY", trimmed))
            .map_err(|e| SignatureError::InvalidKey(e.to_string())),
    }
}

fn load_private_key(raw: &str) -> Result<RsaPrivateKey, SignatureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SignatureError::InvalidKey("empty private key".to_string()));
    }
    if trimmed.contains("-----BEGIN") {
        return match RsaPrivateKey::from_pkcs8_pem(trimmed) {
            Ok(key) => Ok(key),
            Err(_) => RsaPrivateKey::from_pkcs1_pem(trimmed)
                .map_err(|e| SignatureError::InvalidKey(e.to_string())),
        };
    }
    match RsaPrivateKey::from_pkcs8_pem(&wrap_pem("PRIVATE KEY", trimmed)) {
        Ok(key) => Ok(key),
        Err(_) => RsaPrivateKey::from_pkcs1_pem(&wrap_pem("RSA PRIVATE KEY", trimmed))
            .map_err(|e| SignatureError::InvalidKey(e.to_string())),
    }
}

fn wrap_pem(label: &str, base64_body: &str) -> String {
    let cleaned: String = base64_body.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pem = format!("-----BEGIN {}-----\n", label);
    for chunk in cleaned.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", label));
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    fn test_keypair() -> (String, String) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("keygen should succeed");
        let public_key = RsaPublicKey::from(&private_key);
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("private pem")
            .to_string();
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .expect("public pem");
        (private_pem, public_pem)
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (private_pem, public_pem) = test_keypair();
        let payload = br#"{"code":"0000","data":{"orderNo":"P1"}}"#;
        let signature = sign(payload, &private_pem).expect("signing should succeed");
        assert!(verify(payload, &signature, &public_pem));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (private_pem, public_pem) = test_keypair();
        let payload = b"payment notification payload";
        let signature = sign(payload, &private_pem).expect("signing should succeed");

        let mut tampered = payload.to_vec();
        tampered[0] ^= 0x01;
        assert!(!verify(&tampered, &signature, &public_pem));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let (private_pem, public_pem) = test_keypair();
        let payload = b"payment notification payload";
        let signature = sign(payload, &private_pem).expect("signing should succeed");

        let mut bytes = BASE64.decode(&signature).expect("valid base64");
        bytes[0] ^= 0x01;
        let tampered = BASE64.encode(bytes);
        assert!(!verify(payload, &tampered, &public_pem));
    }

    #[test]
    fn malformed_inputs_resolve_to_false() {
        let (_, public_pem) = test_keypair();
        assert!(!verify(b"payload", "not-base64!!!", &public_pem));
        assert!(!verify(b"payload", "AAAA", &public_pem));
        assert!(!verify(b"payload", "AAAA", "not a key"));
        assert!(!verify(b"", "AAAA", &public_pem));
    }

    #[test]
    fn bare_base64_key_material_is_tolerated() {
        let (private_pem, public_pem) = test_keypair();
        let bare: String = public_pem
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();

        let payload = b"enveloped vs bare keys";
        let signature = sign(payload, &private_pem).expect("signing should succeed");
        assert!(verify(payload, &signature, &bare));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let (private_pem, _) = test_keypair();
        let (_, other_public_pem) = test_keypair();
        let payload = b"cross-key check";
        let signature = sign(payload, &private_pem).expect("signing should succeed");
        assert!(!verify(payload, &signature, &other_public_pem));
    }
}
