//! Panel 4 (Activity): recent sells and buys, with prices around the selected trade.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use clubfolio_analysis::{trade_window, Analysis, HoldingReturn};

use crate::app::AppState;
use crate::theme;
use crate::ui::{fmt_pct, investor_index, truncate};

pub fn render(f: &mut Frame, area: Rect, app: &AppState, a: &Analysis) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_list(f, chunks[0], a, app.cursor);
    match (app.selected_trade(), app.loaded.as_ref()) {
        (Some(trade), Some(loaded)) => {
            let points = trade_window(&loaded.prices, trade, app.source.price_window_days());
            render_trade_chart(f, chunks[1], trade, &points);
        }
        _ => f.render_widget(
            Paragraph::new(Span::styled("No trades in the window.", theme::muted())),
            chunks[1],
        ),
    }
}

fn trade_line<'a>(a: &Analysis, r: &HoldingReturn, selected: bool, date: String) -> Line<'a> {
    let color = theme::investor_color(investor_index(&a.investors, &r.investor));
    let style = if selected { theme::cursor() } else { Style::default().fg(color) };
    Line::from(vec![
        Span::styled(format!("  {:<10} ", date), style),
        Span::styled(format!("{:<18} ", truncate(&r.investor, 18)), style),
        Span::styled(format!("{:<9} ", truncate(&r.instrument, 9)), style),
        Span::styled(fmt_pct(r.simple_return), theme::pnl_style(r.simple_return)),
    ])
}

fn render_list(f: &mut Frame, area: Rect, a: &Analysis, cursor: usize) {
    let act = &a.activity;
    let mut lines = vec![Line::from(Span::styled(
        format!("Sold (last {} days)", act.window_days),
        theme::accent_bold(),
    ))];
    for (i, r) in act.sold.iter().enumerate() {
        lines.push(trade_line(a, r, i == cursor, r.last_seen.to_string()));
    }
    if act.sold.is_empty() {
        lines.push(Line::from(Span::styled("  none", theme::muted())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Bought (last {} days)", act.window_days),
        theme::accent_bold(),
    )));
    for (i, r) in act.bought.iter().enumerate() {
        lines.push(trade_line(a, r, act.sold.len() + i == cursor, r.buy_date.to_string()));
    }
    if act.bought.is_empty() {
        lines.push(Line::from(Span::styled("  none", theme::muted())));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_trade_chart(f: &mut Frame, area: Rect, trade: &HoldingReturn, points: &[(chrono::NaiveDate, f64)]) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(theme::muted())
        .title(Span::styled(
            format!(" {} ({}) ", trade.instrument, trade.currency),
            theme::accent_bold(),
        ));
    let Some((first, _)) = points.first().copied() else {
        f.render_widget(
            Paragraph::new(Span::styled("No prices stored for this instrument.", theme::muted())).block(block),
            area,
        );
        return;
    };
    let last = points.last().map(|(d, _)| *d).unwrap_or(first);

    let x = |d: chrono::NaiveDate| (d - first).num_days() as f64;
    let line: Vec<(f64, f64)> = points.iter().map(|(d, p)| (x(*d), *p)).collect();
    let marks: Vec<(f64, f64)> = [trade.buy_price.map(|p| (trade.buy_date, p)), trade.last_price.map(|p| (trade.last_seen, p))]
        .into_iter()
        .flatten()
        .map(|(d, p)| (x(d), p))
        .collect();

    let (lo, hi) = line
        .iter()
        .chain(marks.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, p)| (lo.min(*p), hi.max(*p)));
    let pad = ((hi - lo).abs() * 0.05).max(0.01);

    let datasets = vec![
        Dataset::default()
            .name("close")
            .marker(symbols::Marker::Braille)
            .style(theme::accent())
            .graph_type(GraphType::Line)
            .data(&line),
        Dataset::default()
            .name("buy / last")
            .marker(symbols::Marker::Dot)
            .style(theme::warning())
            .graph_type(GraphType::Scatter)
            .data(&marks),
    ];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x(last).max(1.0)])
                .labels(vec![
                    Span::styled(first.to_string(), theme::muted()),
                    Span::styled(last.to_string(), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([lo - pad, hi + pad])
                .labels(vec![
                    Span::styled(format!("{:.2}", lo - pad), theme::muted()),
                    Span::styled(format!("{:.2}", hi + pad), theme::muted()),
                ]),
        );
    f.render_widget(chart, area);
}
