//! Panel 3 (Portfolio): the selected investor's open holdings.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use clubfolio_analysis::Analysis;

use crate::theme;
use crate::ui::{fmt_money, fmt_pct, scroll_offset, truncate};

pub fn render(f: &mut Frame, area: Rect, a: &Analysis, investor: Option<&str>, cursor: usize) {
    let Some(investor) = investor else {
        f.render_widget(Paragraph::new(Span::styled("No investors.", theme::muted())), area);
        return;
    };
    let holdings = a.open_holdings(investor);
    let invested: f64 = holdings.iter().map(|r| r.invested).sum();
    let profit: f64 = holdings.iter().filter_map(|r| r.profit).sum();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{investor}  "), theme::accent_bold()),
            Span::styled(
                format!(
                    "{} open · invested {invested:.0} {} · profit ",
                    holdings.len(),
                    a.base_currency
                ),
                theme::secondary(),
            ),
            Span::styled(format!("{profit:.0}"), theme::pnl_style(Some(profit))),
            Span::styled("  [ ] investor", theme::muted()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{:<10} {:>10} {:>4} {:>11} {:<10} {:>5} {:>9} {:>10}",
                "Instrument", "Quantity", "Cur", "Invested", "Bought", "Days", "Return", "Profit"
            ),
            theme::accent_bold(),
        )),
    ];

    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll_offset(cursor, visible);
    for (row, r) in holdings.iter().enumerate().skip(start).take(visible) {
        let style = if row == cursor { theme::cursor() } else { theme::secondary() };
        let ret = if row == cursor { style } else { theme::pnl_style(r.simple_return) };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<10} ", truncate(&r.instrument, 10)), style),
            Span::styled(format!("{:>10} ", r.quantity), style),
            Span::styled(format!("{:>4} ", r.currency), style),
            Span::styled(format!("{:>11.0} ", r.invested), style),
            Span::styled(format!("{:<10} ", r.buy_date.to_string()), style),
            Span::styled(format!("{:>5} ", r.days), style),
            Span::styled(format!("{:>9} ", fmt_pct(r.simple_return)), ret),
            Span::styled(format!("{:>10}", fmt_money(r.profit)), ret),
        ]));
    }
    if holdings.is_empty() {
        lines.push(Line::from(Span::styled("No open holdings.", theme::muted())));
    }

    f.render_widget(Paragraph::new(lines), area);
}
