//! Panel 1 (Overview): portfolio value per investor and time-weighted returns.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use clubfolio_analysis::Analysis;

use crate::theme;
use crate::ui::{fmt_money, fmt_pct, truncate};

pub fn render(f: &mut Frame, area: Rect, a: &Analysis) {
    let table_height = a.investors.len() as u16 + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(table_height)])
        .split(area);

    render_chart(f, chunks[0], a);
    render_summary(f, chunks[1], a);
}

/// (days since `a.start`, value) per investor, in analysis order.
fn chart_points(a: &Analysis) -> Vec<(usize, Vec<(f64, f64)>)> {
    a.investors
        .iter()
        .enumerate()
        .filter_map(|(i, investor)| {
            let series = a.values_of(investor)?;
            let points = series
                .points
                .iter()
                .map(|(d, v)| ((*d - a.start).num_days() as f64, *v))
                .collect();
            Some((i, points))
        })
        .collect()
}

fn render_chart(f: &mut Frame, area: Rect, a: &Analysis) {
    let series = chart_points(a);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, points) in &series {
        for (_, v) in points {
            y_min = y_min.min(*v);
            y_max = y_max.max(*v);
        }
    }
    if !y_min.is_finite() {
        f.render_widget(
            Paragraph::new(Span::styled("No priced holdings in this period.", theme::muted())),
            area,
        );
        return;
    }
    let padding = ((y_max - y_min).abs() * 0.05).max(1.0);
    let (y_min, y_max) = (y_min - padding, y_max + padding);
    let x_max = ((a.latest - a.start).num_days() as f64).max(1.0);

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(i, points)| {
            Dataset::default()
                .name(a.investors[*i].clone())
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(theme::investor_color(*i)))
                .graph_type(GraphType::Line)
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::styled(a.start.to_string(), theme::muted()),
                    Span::styled(a.latest.to_string(), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(a.base_currency.clone(), theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.0}"), theme::muted()),
                    Span::styled(format!("{y_max:.0}"), theme::muted()),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_summary(f: &mut Frame, area: Rect, a: &Analysis) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "{:<24} {:>5} {:>11} {:>11} {:>10} {:>8} {:>8}",
                "Investor", "Open", "Invested", "Value", "Profit", "TWR", "Annual"
            ),
            theme::accent_bold(),
        )),
    ];
    for (i, s) in a.summaries().iter().enumerate() {
        let annual = a.twr_of(&s.investor).and_then(|t| t.annualized);
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<24} ", truncate(&s.investor, 24)),
                Style::default().fg(theme::investor_color(i)),
            ),
            Span::styled(format!("{:>5} ", s.open_holdings), theme::secondary()),
            Span::styled(format!("{:>11.0} ", s.invested), theme::secondary()),
            Span::styled(format!("{:>11} ", fmt_money(s.value)), theme::secondary()),
            Span::styled(format!("{:>10.0} ", s.profit), theme::pnl_style(Some(s.profit))),
            Span::styled(format!("{:>8} ", fmt_pct(s.twr)), theme::pnl_style(s.twr)),
            Span::styled(format!("{:>8}", fmt_pct(annual)), theme::pnl_style(annual)),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!(
            "{} rows · {} corrected · {} excluded · [ ] investor · -/+ start month",
            a.stats.rows, a.stats.corrected, a.stats.excluded
        ),
        theme::muted(),
    )));
    f.render_widget(Paragraph::new(lines), area);
}
