use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hex: String,
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Identity of a generated batch: the run kind plus every run-file line in order.
///
/// Two generations from the same catalog, variant sets and command template
/// produce the same fingerprint, so a package can be matched to its results
/// long after generation.
pub fn compute(kind: &str, lines: &[String]) -> Fingerprint {
    let mut parts = Vec::with_capacity(lines.len() + 2);
    parts.push(format!("kind={}", kind));
    parts.push(format!("runs={}", lines.len()));
    parts.extend(lines.iter().cloned());

    Fingerprint {
        hex: sha256_hex(&parts.join("\n")),
    }
}
