//! Record key derivation.

/// The store key holding one identity's request log.
///
/// The key is the namespace and the identity joined by `:`, so records for
/// distinct identities never collide and stay apart from unrelated data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// Create a new record key for an identity.
    pub fn new(namespace: &str, identity: &str) -> Self {
        Self(format!("{}:{}", namespace, identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
