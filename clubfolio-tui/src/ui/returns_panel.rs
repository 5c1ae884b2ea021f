//! Panel 2 (Returns): every holding, worst to best, coloured by investor.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use clubfolio_analysis::{sorted_by_return, Analysis};

use crate::theme;
use crate::ui::{fmt_money, fmt_pct, investor_index, scroll_offset, truncate};

pub fn render(f: &mut Frame, area: Rect, a: &Analysis, cursor: usize) {
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "{:<20} {:<10} {:<10} {:<10} {:>5} {:>9} {:>10}",
            "Investor", "Instrument", "Bought", "Last seen", "Days", "Return", "Profit"
        ),
        theme::accent_bold(),
    ))];

    let sorted = sorted_by_return(&a.returns);
    let visible = area.height.saturating_sub(1) as usize;
    let start = scroll_offset(cursor, visible);

    for (row, r) in sorted.iter().enumerate().skip(start).take(visible) {
        let color = theme::investor_color(investor_index(&a.investors, &r.investor));
        let is_cursor = row == cursor;
        let base = if is_cursor {
            theme::cursor()
        } else {
            Style::default().fg(color)
        };
        let ret = if is_cursor { base } else { theme::pnl_style(r.simple_return) };
        let closed = if r.is_open(a.latest) { "" } else { " sold" };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<20} ", truncate(&r.investor, 20)), base),
            Span::styled(format!("{:<10} ", truncate(&r.instrument, 10)), base),
            Span::styled(format!("{:<10} ", r.buy_date.to_string()), base),
            Span::styled(format!("{:<10} ", r.last_seen.to_string()), base),
            Span::styled(format!("{:>5} ", r.days), base),
            Span::styled(format!("{:>9} ", fmt_pct(r.simple_return)), ret),
            Span::styled(format!("{:>10}", fmt_money(r.profit)), ret),
            Span::styled(closed, theme::muted()),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
