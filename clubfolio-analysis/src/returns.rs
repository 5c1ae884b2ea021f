//! Holding returns and time-weighted portfolio returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clubfolio_core::corrections::PriceAdjustment;
use clubfolio_core::data::PriceTable;

use crate::holdings::{HoldingSpan, QuantityMatrix};

/// Return of one holding from its buy date to its last sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingReturn {
    #[serde(flatten)]
    pub span: HoldingSpan,
    pub buy_price: Option<f64>,
    pub last_price: Option<f64>,
    /// `(last − buy) / buy`.
    pub simple_return: Option<f64>,
    /// `invested × simple_return`, in the base currency.
    pub profit: Option<f64>,
    /// A split adjustment changed the buy price.
    #[serde(default)]
    pub adjusted: bool,
}

impl HoldingReturn {
    pub fn return_pct(&self) -> Option<f64> {
        self.simple_return.map(|r| r * 100.0)
    }
}

impl std::ops::Deref for HoldingReturn {
    type Target = HoldingSpan;

    fn deref(&self) -> &HoldingSpan {
        &self.span
    }
}

/// Price every span at its buy date and last sighting.
///
/// `prices` must be calendar-filled local-currency closes. Spans without a
/// price on either date get `None` returns and are logged.
pub fn holding_returns(
    spans: &[HoldingSpan],
    prices: &PriceTable,
    adjustments: &[PriceAdjustment],
) -> Vec<HoldingReturn> {
    spans
        .iter()
        .map(|span| {
            let buy = prices.get(&span.instrument, span.buy_date);
            let last = prices.get(&span.instrument, span.last_seen);
            let mut adjusted = false;
            let buy = buy.map(|mut price| {
                for adj in adjustments {
                    if adj.applies(&span.instrument, span.buy_date, span.last_seen) {
                        price = adj.adjust_buy_price(&span.instrument, span.buy_date, span.last_seen, price);
                        adjusted = true;
                    }
                }
                price
            });

            let simple_return = match (buy, last) {
                (Some(b), Some(l)) if b != 0.0 => Some((l - b) / b),
                _ => {
                    log::warn!(
                        "{}/{}: no price on {} or {}, return unknown",
                        span.investor,
                        span.instrument,
                        span.buy_date,
                        span.last_seen
                    );
                    None
                }
            };
            HoldingReturn {
                span: span.clone(),
                buy_price: buy,
                last_price: last,
                simple_return,
                profit: simple_return.map(|r| span.invested * r),
                adjusted,
            }
        })
        .collect()
}

/// Returns sorted ascending, unknown returns last.
pub fn sorted_by_return(returns: &[HoldingReturn]) -> Vec<&HoldingReturn> {
    let mut out: Vec<&HoldingReturn> = returns.iter().collect();
    out.sort_by(|a, b| match (a.simple_return, b.simple_return) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    out
}

/// Chained daily return of one investor's holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWeightedReturn {
    pub investor: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Periods that contributed a return.
    pub periods: usize,
    pub twr: f64,
    /// `None` when the period is shorter than a day.
    pub annualized: Option<f64>,
    /// Cumulative growth after each counted period, for charts.
    pub curve: Vec<(NaiveDate, f64)>,
}

/// Time-weighted return per investor over consecutive snapshot dates.
///
/// For each pair of snapshot dates the previous day's holdings are valued at
/// both dates: `r = Σ q_prev·p_now / Σ q_prev·p_prev − 1`. Holdings missing
/// a price on either date are left out of that period. A split taking effect
/// between the two dates puts the earlier price on the new basis.
pub fn time_weighted_returns(
    matrix: &QuantityMatrix,
    base: &PriceTable,
    adjustments: &[PriceAdjustment],
) -> Vec<TimeWeightedReturn> {
    let mut out = Vec::new();
    for investor in matrix.investors() {
        let mut growth = 1.0;
        let mut curve = Vec::new();
        let mut start = None;

        for di in 1..matrix.dates.len() {
            let (prev, now) = (matrix.dates[di - 1], matrix.dates[di]);
            let mut before = 0.0;
            let mut after = 0.0;
            for (key, quantity) in matrix.holdings_on(di - 1) {
                if key.investor != investor || quantity <= 0.0 {
                    continue;
                }
                let (Some(p_prev), Some(p_now)) =
                    (base.get(&key.instrument, prev), base.get(&key.instrument, now))
                else {
                    continue;
                };
                let p_prev = adjustments
                    .iter()
                    .filter(|a| a.instrument == key.instrument && prev < a.effective && a.effective <= now)
                    .fold(p_prev, |p, a| p / a.divide_buy_price_by);
                before += quantity * p_prev;
                after += quantity * p_now;
            }
            if before <= 0.0 {
                continue;
            }
            growth *= after / before;
            start.get_or_insert(prev);
            curve.push((now, growth - 1.0));
        }

        let Some(start) = start else {
            continue;
        };
        let end = curve.last().map(|(d, _)| *d).unwrap_or(start);
        let twr = growth - 1.0;
        let days = (end - start).num_days();
        let annualized = (days > 0).then(|| growth.powf(365.0 / days as f64) - 1.0);
        out.push(TimeWeightedReturn {
            investor: investor.to_string(),
            start,
            end,
            periods: curve.len(),
            twr,
            annualized,
            curve,
        });
    }
    out
}
