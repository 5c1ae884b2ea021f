//! Exchange codes and Yahoo Finance ticker derivation.
//!
//! The club page names the listing venue with a lowercase MIC-like code
//! (`xcse`, `xnas`, ...). Yahoo wants the bare symbol plus a venue suffix
//! (`.CO`, `.DE`) and dashes instead of underscores (`NOVO-B.CO`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exchange code → Yahoo ticker suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeMap(BTreeMap<String, String>);

impl Default for ExchangeMap {
    fn default() -> Self {
        let table = [
            ("xcse", ".CO"),
            ("xmil", ".MI"),
            ("xosl", ".OL"),
            ("xome", ".ST"),
            ("xhel", ".HE"),
            ("xetr", ".DE"),
            ("xams", ".AS"),
            ("xpar", ".PA"),
            ("xnys", ""),
            ("xtse", ".TO"),
            ("xtsx", ""),
            ("xasx", ".AX"),
            ("xlon", ".L"),
            ("xnas", ""),
        ];
        Self(
            table
                .into_iter()
                .map(|(code, suffix)| (code.to_string(), suffix.to_string()))
                .collect(),
        )
    }
}

impl ExchangeMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// Suffix for an exchange code. Lookup ignores case and surrounding spaces.
    pub fn suffix(&self, exchange: &str) -> Option<&str> {
        let code = exchange.trim().to_ascii_lowercase();
        self.0.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the Yahoo ticker for an instrument listed on `exchange`.
///
/// Returns `None` when the exchange code is not in the map.
pub fn derive_ticker(instrument: &str, exchange: &str, map: &ExchangeMap) -> Option<String> {
    let suffix = map.suffix(exchange)?;
    Some(format!("{instrument}{suffix}").replace('_', "-"))
}
