//! Integrity envelope
//!
//! Stored form: `{"data": <value>, "digest": "<hex>"}`. The digest is a keyed
//! BLAKE3 hash of the canonical JSON of `data` (object keys sorted, no
//! whitespace). The key is derived from a salt compiled into the binary, so
//! this only detects corruption and casual edits. Anyone who reads the
//! binary can forge a valid envelope; it is not a security boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEY_CONTEXT: &str = "orbital-decay 2024-06-01 save integrity v1";
const SALT: &[u8] = b"SHMUP_SAVE_V1::orbital-decay::fuel-is-life";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed save data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed digest")]
    MalformedDigest,
    #[error("digest mismatch (data corrupted or edited)")]
    DigestMismatch,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    data: serde_json::Value,
    digest: String,
}

fn digest(canonical: &str) -> blake3::Hash {
    let key = blake3::derive_key(KEY_CONTEXT, SALT);
    blake3::keyed_hash(&key, canonical.as_bytes())
}

/// Serialize `value` and wrap it with its digest
pub fn seal<T: Serialize>(value: &T) -> Result<String, EnvelopeError> {
    let data = serde_json::to_value(value)?;
    let canonical = serde_json::to_string(&data)?;
    let envelope = Envelope {
        digest: digest(&canonical).to_hex().to_string(),
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Verify the digest and deserialize the payload
pub fn open<T: DeserializeOwned>(raw: &str) -> Result<T, EnvelopeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    let stored = blake3::Hash::from_hex(envelope.digest.as_bytes())
        .map_err(|_| EnvelopeError::MalformedDigest)?;
    let canonical = serde_json::to_string(&envelope.data)?;
    // blake3::Hash equality is constant-time
    if digest(&canonical) != stored {
        return Err(EnvelopeError::DigestMismatch);
    }
    Ok(serde_json::from_value(envelope.data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        b: u32,
        a: f32,
    }

    #[test]
    fn test_seal_open() {
        let sample = Sample { b: 7, a: 1.1 };
        let raw = seal(&sample).unwrap();
        assert!(raw.contains("\"digest\""));
        assert_eq!(open::<Sample>(&raw).unwrap(), sample);
    }

    #[test]
    fn test_float_payload_reopens() {
        // f32 widened to f64 prints a long mantissa that must reparse exactly
        for value in [1.6000001f32, 378.0, 0.1, 90.41956] {
            let raw = seal(&value).unwrap();
            assert_eq!(open::<f32>(&raw).unwrap(), value);
        }
    }

    #[test]
    fn test_payload_edit_detected() {
        let raw = seal(&Sample { b: 7, a: 1.0 }).unwrap();
        let tampered = raw.replace("\"b\":7", "\"b\":9999");
        assert_ne!(raw, tampered);
        assert!(matches!(open::<Sample>(&tampered), Err(EnvelopeError::DigestMismatch)));
    }

    #[test]
    fn test_digest_edit_detected() {
        let raw = seal(&42u64).unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let digest = envelope["digest"].as_str().unwrap();
        let flipped: String = digest
            .chars()
            .enumerate()
            .map(|(i, c)| if i == 0 { if c == '0' { '1' } else { '0' } } else { c })
            .collect();
        let tampered = raw.replace(digest, &flipped);
        assert!(matches!(open::<u64>(&tampered), Err(EnvelopeError::DigestMismatch)));

        let garbage = raw.replace(digest, "not-hex");
        assert!(matches!(open::<u64>(&garbage), Err(EnvelopeError::MalformedDigest)));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        // Reordered keys are the same canonical payload
        let raw = seal(&Sample { b: 1, a: 2.0 }).unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let digest = envelope["digest"].as_str().unwrap();
        let reordered = format!(r#"{{"digest":"{digest}","data":{{"b":1,"a":2.0}}}}"#);
        assert_eq!(open::<Sample>(&reordered).unwrap(), Sample { b: 1, a: 2.0 });
    }

    #[test]
    fn test_missing_keys_rejected() {
        let raw = seal(&serde_json::json!({ "b": 1 })).unwrap();
        assert!(matches!(open::<Sample>(&raw), Err(EnvelopeError::Parse(_))));
        assert!(open::<Sample>("not json").is_err());
    }
}
