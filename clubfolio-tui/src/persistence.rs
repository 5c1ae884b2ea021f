//! App state persistence: JSON save/load across restarts.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::{AppState, Panel};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub active_panel: Panel,
    pub investor: Option<String>,
    pub start_date: Option<NaiveDate>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_panel: Panel::Overview,
            investor: None,
            start_date: None,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt state file {}: {e}", path.display());
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_panel: app.active_panel,
        investor: app.selected_investor().map(String::from),
        start_date: Some(app.start),
    }
}

/// Apply before the first load; the investor is matched once data is in.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_panel = state.active_panel;
    app.preferred_investor = state.investor;
    if let Some(start) = state.start_date {
        app.start = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{app_with_sample, date, SampleSource};

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clubfolio").join("state.json");

        let state = PersistedState {
            active_panel: Panel::Timeline,
            investor: Some("Bo".into()),
            start_date: Some(date(5)),
        };
        save(&path, &state).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded.active_panel, Panel::Timeline);
        assert_eq!(loaded.investor.as_deref(), Some("Bo"));
        assert_eq!(loaded.start_date, Some(date(5)));
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/state.json"));
        assert_eq!(loaded.active_panel, Panel::Overview);
        assert!(loaded.investor.is_none());
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not valid json {{{").unwrap();

        let loaded = load(&path);
        assert!(loaded.start_date.is_none());
    }

    #[test]
    fn extract_then_apply() {
        let mut app = app_with_sample();
        app.next_investor();
        app.active_panel = Panel::Portfolio;
        let state = extract(&app);

        let mut fresh = AppState::new(Box::new(SampleSource), date(3));
        apply(&mut fresh, state);
        fresh.reload();
        assert_eq!(fresh.active_panel, Panel::Portfolio);
        assert_eq!(fresh.start, date(1));
        assert_eq!(fresh.selected_investor(), Some("Bo"));
    }
}
