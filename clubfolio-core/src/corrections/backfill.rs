//! Backfills for days the club page was not updated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::DatedPosition;

/// Copy one investor's holdings from `source_date` onto each date in
/// `from..=to` where that investor has no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backfill {
    pub investor: String,
    pub source_date: NaiveDate,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Backfill {
    pub fn defaults() -> Vec<Backfill> {
        // The page was frozen from Dec 28 to Jan 4; Anders joined on Jan 1.
        vec![Backfill {
            investor: "Anders Bæk".into(),
            source_date: NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date"),
            from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            to: NaiveDate::from_ymd_opt(2024, 1, 4).expect("valid date"),
        }]
    }
}

/// Apply every backfill; returns the number of rows added.
pub fn apply_backfills(rows: &mut Vec<DatedPosition>, backfills: &[Backfill]) -> usize {
    let mut added = 0;
    for fill in backfills {
        let template: Vec<DatedPosition> = rows
            .iter()
            .filter(|r| r.investor == fill.investor && r.date == fill.source_date)
            .cloned()
            .collect();
        if template.is_empty() {
            log::warn!(
                "backfill for {}: no rows on {}, nothing copied",
                fill.investor,
                fill.source_date
            );
            continue;
        }

        let mut date = fill.from;
        while date <= fill.to {
            let present = rows
                .iter()
                .any(|r| r.investor == fill.investor && r.date == date);
            if !present {
                for row in &template {
                    let mut copy = row.clone();
                    copy.date = date;
                    rows.push(copy);
                    added += 1;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::sample;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn copies_source_day_onto_missing_days() {
        let mut rows = vec![
            sample("Anders Bæk", "NOVO_B", 10.0).on(d(5)),
            sample("Anders Bæk", "NVDA", 2.0).on(d(5)),
            sample("Lars Persson", "ALK_B", 1.0).on(d(2)),
        ];
        let added = apply_backfills(&mut rows, &Backfill::defaults());
        assert_eq!(added, 8);
        assert!(rows
            .iter()
            .any(|r| r.investor == "Anders Bæk" && r.date == d(1) && r.instrument == "NVDA"));
        assert!(!rows.iter().any(|r| r.investor == "Lars Persson" && r.date == d(1)));
    }

    #[test]
    fn existing_days_are_not_overwritten() {
        let mut rows = vec![
            sample("Anders Bæk", "NOVO_B", 10.0).on(d(5)),
            sample("Anders Bæk", "NOVO_B", 7.0).on(d(3)),
        ];
        let added = apply_backfills(&mut rows, &Backfill::defaults());
        assert_eq!(added, 3);
        let on_third: Vec<_> = rows.iter().filter(|r| r.date == d(3)).collect();
        assert_eq!(on_third.len(), 1);
        assert_eq!(on_third[0].quantity, 7.0);
    }

    #[test]
    fn missing_source_day_adds_nothing() {
        let mut rows = vec![sample("Anders Bæk", "NOVO_B", 10.0).on(d(8))];
        assert_eq!(apply_backfills(&mut rows, &Backfill::defaults()), 0);
        assert_eq!(rows.len(), 1);
    }
}
