use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length in bytes of every [`ProviderId`].
pub const PROVIDER_ID_LEN: usize = 16;

/// Fixed-length identifier of a log provider.
///
/// Derived from the provider's human readable name with SHA-256, keeping
/// the first [`PROVIDER_ID_LEN`] bytes of the digest. The same name always
/// yields the same id, across processes and restarts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId([u8; PROVIDER_ID_LEN]);

impl ProviderId {
    /// Derive the id for `provider_name` from its UTF-8 bytes.
    pub fn derive(provider_name: &str) -> Self {
        let digest = Sha256::digest(provider_name.as_bytes());
        let mut id = [0u8; PROVIDER_ID_LEN];
        id.copy_from_slice(&digest[..PROVIDER_ID_LEN]);
        ProviderId(id)
    }

    pub fn as_bytes(&self) -> &[u8; PROVIDER_ID_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, two characters per byte.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(PROVIDER_ID_LEN * 2);
        for b in self.0 {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

impl From<[u8; PROVIDER_ID_LEN]> for ProviderId {
    fn from(bytes: [u8; PROVIDER_ID_LEN]) -> Self {
        ProviderId(bytes)
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({})", self.to_hex())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
