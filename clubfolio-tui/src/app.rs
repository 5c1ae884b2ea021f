//! Application state: single-owner, main-thread only.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use clubfolio_analysis::{Analysis, HoldingReturn};

use crate::data_loader::{AnalysisSource, Loaded};

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Overview,
    Returns,
    Portfolio,
    Activity,
    Timeline,
    Help,
}

impl Panel {
    pub fn index(self) -> usize {
        match self {
            Panel::Overview => 0,
            Panel::Returns => 1,
            Panel::Portfolio => 2,
            Panel::Activity => 3,
            Panel::Timeline => 4,
            Panel::Help => 5,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Overview),
            1 => Some(Panel::Returns),
            2 => Some(Panel::Portfolio),
            3 => Some(Panel::Activity),
            4 => Some(Panel::Timeline),
            5 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Overview => "Overview",
            Panel::Returns => "Returns",
            Panel::Portfolio => "Portfolio",
            Panel::Activity => "Activity",
            Panel::Timeline => "Timeline",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % 6).unwrap_or(Panel::Overview)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + 5) % 6).unwrap_or(Panel::Overview)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Top-level application state.
pub struct AppState {
    pub active_panel: Panel,
    pub running: bool,
    pub source: Box<dyn AnalysisSource>,
    /// First snapshot date included in the analysis.
    pub start: NaiveDate,
    pub loaded: Option<Loaded>,
    /// The last reload failed; `loaded` is from an earlier start date.
    pub stale: bool,
    pub investor_idx: usize,
    /// Investor to reselect after the next load.
    pub preferred_investor: Option<String>,
    /// Scroll offset in list panels; selected trade in the activity panel.
    pub cursor: usize,
    pub status_message: Option<(String, StatusLevel)>,
}

impl AppState {
    pub fn new(source: Box<dyn AnalysisSource>, start: NaiveDate) -> Self {
        Self {
            active_panel: Panel::Overview,
            running: true,
            source,
            start,
            loaded: None,
            stale: false,
            investor_idx: 0,
            preferred_investor: None,
            cursor: 0,
            status_message: None,
        }
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.loaded.as_ref().map(|l| &l.analysis)
    }

    pub fn investors(&self) -> &[String] {
        self.analysis().map(|a| a.investors.as_slice()).unwrap_or(&[])
    }

    pub fn selected_investor(&self) -> Option<&str> {
        self.investors().get(self.investor_idx).map(String::as_str)
    }

    /// Recompute the analysis from `start`, keeping the selected investor.
    pub fn reload(&mut self) {
        let keep = self
            .selected_investor()
            .map(String::from)
            .or_else(|| self.preferred_investor.take());

        match self.source.load(self.start) {
            Ok(loaded) => {
                let a = &loaded.analysis;
                self.investor_idx = keep
                    .and_then(|name| a.investors.iter().position(|i| *i == name))
                    .unwrap_or(0);
                let msg = format!(
                    "Loaded {} holdings of {} investors, {} to {}",
                    a.returns.len(),
                    a.investors.len(),
                    a.start,
                    a.latest
                );
                let unpriced = a.unpriced.len();
                self.loaded = Some(loaded);
                self.stale = false;
                self.cursor = 0;
                if unpriced > 0 {
                    self.set_warning(format!("{msg} ({unpriced} instruments without prices)"));
                } else {
                    self.set_status(msg);
                }
            }
            Err(e) => {
                log::warn!("analysis from {} failed: {e:#}", self.start);
                self.stale = self.loaded.is_some();
                self.set_error(format!("{e:#}"));
            }
        }
    }

    /// Move the start date by whole months and recompute.
    pub fn shift_start(&mut self, months: i32) {
        let step = Months::new(months.unsigned_abs());
        let moved = if months < 0 {
            self.start.checked_sub_months(step)
        } else {
            self.start.checked_add_months(step)
        };
        let Some(moved) = moved else {
            return;
        };
        if let Some(latest) = self.analysis().map(|a| a.latest) {
            if moved > latest {
                self.set_warning(format!("No snapshots after {latest}"));
                return;
            }
        }
        self.start = moved;
        self.reload();
    }

    pub fn next_investor(&mut self) {
        let n = self.investors().len();
        if n > 0 {
            self.investor_idx = (self.investor_idx + 1) % n;
            self.cursor = 0;
        }
    }

    pub fn prev_investor(&mut self) {
        let n = self.investors().len();
        if n > 0 {
            self.investor_idx = (self.investor_idx + n - 1) % n;
            self.cursor = 0;
        }
    }

    /// Rows the cursor can move over in the active panel.
    pub fn row_count(&self) -> usize {
        let Some(a) = self.analysis() else {
            return 0;
        };
        match self.active_panel {
            Panel::Returns => a.returns.len(),
            Panel::Portfolio => self
                .selected_investor()
                .map(|i| a.open_holdings(i).len())
                .unwrap_or(0),
            Panel::Activity => a.activity.sold.len() + a.activity.bought.len(),
            Panel::Timeline => self
                .selected_investor()
                .map(|i| a.returns.iter().filter(|r| r.investor == i).count())
                .unwrap_or(0),
            Panel::Overview | Panel::Help => 0,
        }
    }

    /// Sold trades first, then bought.
    pub fn selected_trade(&self) -> Option<&HoldingReturn> {
        let a = self.analysis()?;
        a.activity
            .sold
            .iter()
            .chain(a.activity.bought.iter())
            .nth(self.cursor)
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.row_count() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn set_panel(&mut self, panel: Panel) {
        if panel != self.active_panel {
            self.active_panel = panel;
            self.cursor = 0;
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{app_with_sample, date, FailingSource};

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Overview.next(), Panel::Returns);
        assert_eq!(Panel::Help.next(), Panel::Overview);
        assert_eq!(Panel::Overview.prev(), Panel::Help);
        assert_eq!(Panel::Returns.prev(), Panel::Overview);
    }

    #[test]
    fn panel_from_index() {
        for i in 0..6 {
            let p = Panel::from_index(i).unwrap();
            assert_eq!(p.index(), i);
        }
        assert!(Panel::from_index(6).is_none());
    }

    #[test]
    fn reload_populates_and_reports() {
        let app = app_with_sample();
        assert_eq!(app.investors(), ["Anna", "Bo"]);
        assert_eq!(app.selected_investor(), Some("Anna"));
        assert!(matches!(app.status_message, Some((_, StatusLevel::Info))));
    }

    #[test]
    fn investor_cycle_wraps() {
        let mut app = app_with_sample();
        app.next_investor();
        assert_eq!(app.selected_investor(), Some("Bo"));
        app.next_investor();
        assert_eq!(app.selected_investor(), Some("Anna"));
        app.prev_investor();
        assert_eq!(app.selected_investor(), Some("Bo"));
    }

    #[test]
    fn reload_keeps_selected_investor() {
        let mut app = app_with_sample();
        app.next_investor();
        app.reload();
        assert_eq!(app.selected_investor(), Some("Bo"));
    }

    #[test]
    fn preferred_investor_applies_on_first_load() {
        let mut app = AppState::new(Box::new(crate::test_helpers::SampleSource), date(1));
        app.preferred_investor = Some("Bo".into());
        app.reload();
        assert_eq!(app.selected_investor(), Some("Bo"));
    }

    #[test]
    fn shift_start_moves_by_months() {
        let mut app = app_with_sample();
        app.shift_start(-1);
        assert_eq!(app.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        // the sample ends in January; moving past it is refused
        app.shift_start(2);
        assert_eq!(app.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert!(matches!(app.status_message, Some((_, StatusLevel::Warning))));
    }

    #[test]
    fn cursor_is_bounded_by_rows() {
        let mut app = app_with_sample();
        app.set_panel(Panel::Returns);
        let rows = app.row_count();
        assert!(rows > 0);
        for _ in 0..rows + 5 {
            app.cursor_down();
        }
        assert_eq!(app.cursor, rows - 1);
        app.set_panel(Panel::Overview);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn failed_load_sets_error() {
        let mut app = AppState::new(Box::new(FailingSource), date(1));
        app.reload();
        assert!(app.loaded.is_none());
        assert!(matches!(app.status_message, Some((_, StatusLevel::Error))));
        assert!(!app.stale);
    }

    #[test]
    fn failed_reload_marks_previous_analysis_stale() {
        let mut app = app_with_sample();
        app.source = Box::new(FailingSource);
        app.reload();
        assert!(app.stale);
        assert!(app.analysis().is_some());

        app.source = Box::new(crate::test_helpers::SampleSource);
        app.reload();
        assert!(!app.stale);
    }

    #[test]
    fn selected_trade_walks_sold_then_bought() {
        let mut app = app_with_sample();
        app.set_panel(Panel::Activity);
        assert_eq!(app.selected_trade().unwrap().instrument, "PEP");
        app.cursor_down();
        assert_eq!(app.selected_trade().unwrap().instrument, "NEW");
    }
}
