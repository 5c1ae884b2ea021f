use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::HoldingKey;

/// One holding row as published on the club page, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub investor: String,
    /// Internal symbol used by the source (e.g. `NOVO_B`).
    pub instrument: String,
    pub quantity: f64,
    /// Opening price in the instrument's own currency.
    pub opening_price: f64,
    /// `quantity * opening_price`, in the instrument's currency.
    pub amount: f64,
    pub currency: String,
    /// Exchange code as published (`xcse`, `xnas`, ...).
    pub exchange: String,
    /// Yahoo Finance symbol; empty when the exchange is unknown.
    pub ticker: String,
}

impl Position {
    pub fn key(&self) -> HoldingKey {
        HoldingKey::new(&self.investor, &self.instrument)
    }

    pub fn on(self, date: NaiveDate) -> DatedPosition {
        DatedPosition {
            date,
            position: self,
        }
    }
}

/// A position observed on a particular snapshot date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedPosition {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub position: Position,
}

impl DatedPosition {
    pub fn key(&self) -> HoldingKey {
        self.position.key()
    }
}

impl std::ops::Deref for DatedPosition {
    type Target = Position;

    fn deref(&self) -> &Position {
        &self.position
    }
}

impl std::ops::DerefMut for DatedPosition {
    fn deref_mut(&mut self) -> &mut Position {
        &mut self.position
    }
}

#[cfg(test)]
pub(crate) fn sample(investor: &str, instrument: &str, quantity: f64) -> Position {
    Position {
        investor: investor.into(),
        instrument: instrument.into(),
        quantity,
        opening_price: 100.0,
        amount: quantity * 100.0,
        currency: "DKK".into(),
        exchange: "xcse".into(),
        ticker: format!("{}.CO", instrument.replace('_', "-")),
    }
}
