//! Top-level UI layout: six-panel frame with status bar.

pub mod activity_panel;
pub mod help_panel;
pub mod overview_panel;
pub mod portfolio_panel;
pub mod returns_panel;
pub mod status_bar;
pub mod timeline_panel;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(theme::BACKGROUND)),
        f.area(),
    );
    draw_panel(f, chunks[0], app);
    status_bar::render(f, chunks[1], app);
}

fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;
    let investor = app.selected_investor().unwrap_or("—");
    let mut footer = vec![Span::styled(
        format!(" {investor} · from {} ", app.start),
        theme::muted(),
    )];
    if app.stale {
        let shown = app.analysis().map(|a| a.start.to_string()).unwrap_or_default();
        footer.push(Span::styled(format!("STALE: showing from {shown} "), theme::warning()));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true))
        .title_bottom(Line::from(footer));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if panel == Panel::Help {
        help_panel::render(f, inner, app);
        return;
    }
    let Some(analysis) = app.analysis() else {
        render_no_data(f, inner);
        return;
    };

    match panel {
        Panel::Overview => overview_panel::render(f, inner, analysis),
        Panel::Returns => returns_panel::render(f, inner, analysis, app.cursor),
        Panel::Portfolio => portfolio_panel::render(f, inner, analysis, app.selected_investor(), app.cursor),
        Panel::Activity => activity_panel::render(f, inner, app, analysis),
        Panel::Timeline => timeline_panel::render(f, inner, analysis, app.selected_investor(), app.cursor),
        Panel::Help => {}
    }
}

fn render_no_data(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("No analysis loaded.", theme::warning())),
        Line::from(""),
        Line::from(Span::styled(
            "Run `clubfolio scrape` and `clubfolio prices`, then press r to reload.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Index of `investor` in the analysis order, for colouring.
pub fn investor_index(investors: &[String], investor: &str) -> usize {
    investors.iter().position(|i| i == investor).unwrap_or(0)
}

pub fn fmt_pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.1}%", x * 100.0)).unwrap_or_else(|| "—".into())
}

pub fn fmt_money(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.0}")).unwrap_or_else(|| "—".into())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}.")
    }
}

/// First visible row so that `cursor` stays on screen.
pub fn scroll_offset(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        0
    } else {
        cursor.saturating_sub(visible - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Anders Bæk", 20), "Anders Bæk");
        assert_eq!(truncate("Michael Friis Jørgensen", 8), "Michael.");
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(12, 10), 3);
        assert_eq!(scroll_offset(5, 0), 0);
    }

    #[test]
    fn every_panel_renders() {
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let mut app = crate::test_helpers::app_with_sample();
        let mut terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
        for i in 0..6 {
            app.set_panel(Panel::from_index(i).unwrap());
            app.cursor_down();
            terminal.draw(|f| draw(f, &app)).unwrap();
        }
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Help [6]"));
    }

    #[test]
    fn renders_without_data() {
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let app = AppState::new(Box::new(crate::test_helpers::FailingSource), crate::test_helpers::date(1));
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("No analysis loaded."));
    }

    #[test]
    fn stale_analysis_is_flagged() {
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let mut app = crate::test_helpers::app_with_sample();
        app.source = Box::new(crate::test_helpers::FailingSource);
        app.reload();
        let mut terminal = Terminal::new(TestBackend::new(110, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("STALE"));
    }

    #[test]
    fn formats() {
        assert_eq!(fmt_pct(Some(0.1234)), "12.3%");
        assert_eq!(fmt_pct(None), "—");
        assert_eq!(fmt_money(Some(1234.6)), "1235");
    }
}
