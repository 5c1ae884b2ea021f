use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one holding: an investor's position in one instrument.
///
/// Ordered by investor first so grouped output lists each investor's
/// holdings together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoldingKey {
    pub investor: String,
    pub instrument: String,
}

impl HoldingKey {
    pub fn new(investor: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self {
            investor: investor.into(),
            instrument: instrument.into(),
        }
    }
}

impl fmt::Display for HoldingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.investor, self.instrument)
    }
}

/// Content hash of a snapshot (BLAKE3 over its canonical rows).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotHash(pub String);

impl SnapshotHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex chars, enough to eyeball changes in logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SnapshotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_keys_sort_by_investor_then_instrument() {
        let mut keys = vec![
            HoldingKey::new("Lau Svenssen", "AAPL"),
            HoldingKey::new("Lars Persson", "NOVO_B"),
            HoldingKey::new("Lars Persson", "ALK_B"),
        ];
        keys.sort();
        assert_eq!(keys[0], HoldingKey::new("Lars Persson", "ALK_B"));
        assert_eq!(keys[2].investor, "Lau Svenssen");
    }

    #[test]
    fn snapshot_hash_is_deterministic() {
        let a = SnapshotHash::of_bytes(b"NOVO_B;10");
        let b = SnapshotHash::of_bytes(b"NOVO_B;10");
        let c = SnapshotHash::of_bytes(b"NOVO_B;11");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short().len(), 12);
    }
}
