//! What changed between two snapshots.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{HoldingKey, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    Opened { quantity: f64 },
    Closed { quantity: f64 },
    Resized { from: f64, to: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub key: HoldingKey,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::Opened { quantity } => write!(f, "+ {} bought {quantity}", self.key),
            ChangeKind::Closed { quantity } => write!(f, "- {} sold {quantity}", self.key),
            ChangeKind::Resized { from, to } => write!(f, "~ {} {from} -> {to}", self.key),
        }
    }
}

/// Per-holding changes from `old` to `new`, ordered by investor then
/// instrument. A zero quantity counts as not held.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> Vec<Change> {
    if old.fingerprint() == new.fingerprint() {
        return Vec::new();
    }

    let held = |s: &Snapshot| -> BTreeMap<HoldingKey, f64> {
        let mut map = BTreeMap::new();
        for p in s.positions.iter().filter(|p| p.quantity != 0.0) {
            *map.entry(p.key()).or_insert(0.0) += p.quantity;
        }
        map
    };
    let before = held(old);
    let after = held(new);

    let mut changes = Vec::new();
    for (key, &from) in &before {
        match after.get(key) {
            None => changes.push(Change {
                key: key.clone(),
                kind: ChangeKind::Closed { quantity: from },
            }),
            Some(&to) if (to - from).abs() > f64::EPSILON * from.abs().max(1.0) => {
                changes.push(Change {
                    key: key.clone(),
                    kind: ChangeKind::Resized { from, to },
                })
            }
            Some(_) => {}
        }
    }
    for (key, &quantity) in &after {
        if !before.contains_key(key) {
            changes.push(Change {
                key: key.clone(),
                kind: ChangeKind::Opened { quantity },
            });
        }
    }
    changes.sort_by(|a, b| a.key.cmp(&b.key));
    changes
}
