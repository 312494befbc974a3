#![forbid(unsafe_code)]

use sha2::Digest as _;

/// Shared-passphrase gate in front of the open/close actions. Only the
/// SHA-256 digest of the configured passphrase is kept in memory; requests
/// are compared digest-to-digest. An unconfigured gate permits everything
/// (local single-admin use); the session log records which mode is active.
#[derive(Clone, Debug)]
pub(crate) struct AdminGate {
    digest: Option<String>,
}

impl AdminGate {
    pub(crate) fn from_passphrase(passphrase: Option<&str>) -> Self {
        Self {
            digest: passphrase
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(digest_hex),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    pub(crate) fn permits(&self, attempt: Option<&str>) -> bool {
        let Some(expected) = &self.digest else {
            return true;
        };
        match attempt {
            Some(attempt) => digest_hex(attempt.trim()) == *expected,
            None => false,
        }
    }
}

fn digest_hex(value: &str) -> String {
    use std::fmt::Write as _;

    let digest = sha2::Sha256::digest(value.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
