//! Panel 6 (Help): keyboard shortcuts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Navigation");
    key(&mut lines, "1-6", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "j / k", "Move down / up in lists");
    key(&mut lines, "g / G", "First / last row");
    key(&mut lines, "q / Esc", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Data");
    key(&mut lines, "[ / ]", "Previous / next investor");
    key(&mut lines, "- / +", "Start date one month earlier / later (recomputes)");
    key(&mut lines, "r", "Reload snapshots and prices");
    lines.push(Line::from(""));

    section(&mut lines, "Panels");
    key(&mut lines, "Overview", "Portfolio value per investor, TWR and annualized TWR");
    key(&mut lines, "Returns", "Every holding, worst to best, coloured by investor");
    key(&mut lines, "Portfolio", "Open holdings of the selected investor");
    key(&mut lines, "Activity", "Recent sells and buys; j/k selects the trade to chart");
    key(&mut lines, "Timeline", "Holding periods of the selected investor");
    lines.push(Line::from(""));

    if let Some(a) = app.analysis() {
        section(&mut lines, "Loaded");
        key(&mut lines, "Period", &format!("{} to {}", a.start, a.latest));
        key(&mut lines, "Rows", &a.stats.rows.to_string());
        if !a.unpriced.is_empty() {
            key(&mut lines, "No prices", &a.unpriced.join(", "));
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>16}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
