//! Panel 5 (Timeline): when the selected investor held each instrument.

use chrono::NaiveDate;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use clubfolio_analysis::Analysis;

use crate::theme;
use crate::ui::{scroll_offset, truncate};

const LABEL_WIDTH: usize = 11;

/// Column range `[from, to]` of a span drawn on a `width`-column axis
/// covering `start..=end`.
fn bar_columns(start: NaiveDate, end: NaiveDate, from: NaiveDate, to: NaiveDate, width: usize) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    let total = (end - start).num_days().max(1) as f64;
    let col = |d: NaiveDate| {
        let frac = ((d - start).num_days() as f64 / total).clamp(0.0, 1.0);
        ((frac * (width - 1) as f64).round() as usize).min(width - 1)
    };
    (col(from), col(to).max(col(from)))
}

pub fn render(f: &mut Frame, area: Rect, a: &Analysis, investor: Option<&str>, cursor: usize) {
    let Some(investor) = investor else {
        f.render_widget(Paragraph::new(Span::styled("No investors.", theme::muted())), area);
        return;
    };
    let width = (area.width as usize).saturating_sub(LABEL_WIDTH + 1);
    let spans: Vec<_> = a.returns.iter().filter(|r| r.investor == investor).collect();

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<w$}", investor, w = LABEL_WIDTH), theme::accent_bold()),
        Span::styled(
            format!("{} … {}", a.start, a.latest),
            theme::muted(),
        ),
    ])];

    let visible = area.height.saturating_sub(1) as usize;
    let first = scroll_offset(cursor, visible);
    for (row, r) in spans.iter().enumerate().skip(first).take(visible) {
        let (from, to) = bar_columns(a.start, a.latest, r.buy_date, r.last_seen, width);
        let style = if r.is_open(a.latest) { theme::positive() } else { theme::muted() };
        let label = if row == cursor { theme::cursor() } else { theme::secondary() };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<w$} ", truncate(&r.instrument, LABEL_WIDTH), w = LABEL_WIDTH), label),
            Span::raw(" ".repeat(from)),
            Span::styled("█".repeat(to - from + 1), style),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
