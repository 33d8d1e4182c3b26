//! Dashboard rendering. Reads chart state, never mutates it.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart as BarChartWidget, BarGroup, Block, Borders, Chart, Dataset,
        GraphType, Paragraph,
    },
    Frame,
};
use std::time::Instant;

use stats_common::SlaBucket;

use crate::charts::DonutChart;
use crate::orchestrator::Phase;
use crate::theme::Theme;

use super::event_loop::{App, DateField};

/// Draw the full dashboard frame.
pub fn draw_ui(f: &mut Frame, app: &mut App, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Filter bar
            Constraint::Length(1), // Notices
            Constraint::Min(10),   // Trend + bars
            Constraint::Length(7), // Donut row
            Constraint::Length(3), // Footer
        ])
        .split(f.size());

    draw_header(f, chunks[0], app);
    draw_filter_bar(f, chunks[1], app);
    draw_notices(f, chunks[2], app, now);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[3]);

    draw_trend(f, main_chunks[0], app);
    draw_bars(f, main_chunks[1], app);
    draw_donut_row(f, chunks[4], app);
    draw_footer(f, chunks[5], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let phase = match app.dashboard.phase {
        Phase::Skeleton => Span::styled("skeleton", Style::default().fg(theme.dimmed)),
        Phase::Live => Span::styled(
            format!("live ({} updates)", app.dashboard.applied_updates()),
            Style::default().fg(theme.accent),
        ),
    };
    let link = if app.polling {
        Span::styled("polling", Style::default().fg(theme.dimmed))
    } else if app.dashboard.connected {
        Span::styled("connected", Style::default().fg(ratatui::style::Color::Green))
    } else {
        Span::styled("reconnecting", Style::default().fg(ratatui::style::Color::Red))
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "  Incident Statistics ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        phase,
        Span::raw("  | "),
        link,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    )
    .alignment(Alignment::Left);

    f.render_widget(header, area);
}

fn draw_filter_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let field = |label: &str, value: &str, focused: bool| -> Vec<Span<'static>> {
        let style = if focused {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.text)
        };
        vec![
            Span::styled(format!(" {label}: "), Style::default().fg(theme.dimmed)),
            Span::styled(
                if value.is_empty() {
                    "open".to_string()
                } else {
                    value.to_string()
                },
                style,
            ),
        ]
    };

    let confirmed = app.dashboard.confirmed_filter();
    let mut spans = field(
        "From",
        &app.start_input,
        app.focus == DateField::Start,
    );
    spans.extend(field("To", &app.end_input, app.focus == DateField::End));
    spans.push(Span::styled(
        format!(
            "   applied: {} .. {}",
            confirmed.start_date,
            confirmed
                .end_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "open".into())
        ),
        Style::default().fg(theme.dimmed),
    ));

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(" Date range "),
    );
    f.render_widget(bar, area);
}

fn draw_notices(f: &mut Frame, area: Rect, app: &mut App, now: Instant) {
    let notices = app.dashboard.notices(now);
    if notices.is_empty() {
        return;
    }
    let text = notices
        .iter()
        .map(|n| n.message.as_str())
        .collect::<Vec<_>>()
        .join("  |  ");
    let line = Paragraph::new(Line::from(Span::styled(
        format!(" {text}"),
        Style::default()
            .fg(ratatui::style::Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));
    f.render_widget(line, area);
}

fn draw_trend(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let trend = &app.dashboard.trend;

    // Datasets borrow point slices, so the points must outlive the chart.
    let points: Vec<Vec<(f64, f64)>> = trend
        .series
        .iter()
        .map(|series| {
            series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v as f64))
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = trend
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, data))| {
            Dataset::default()
                .name(series.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Theme::series_color(i)))
                .data(data)
        })
        .collect();

    let max_y = trend
        .series
        .iter()
        .flat_map(|s| s.values.iter())
        .copied()
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let max_x = trend.labels.len().saturating_sub(1).max(1) as f64;

    let x_labels: Vec<Span> = match (trend.labels.first(), trend.labels.last()) {
        (Some(first), Some(last)) => vec![
            Span::styled(first.format("%m-%d").to_string(), Style::default().fg(theme.dimmed)),
            Span::styled(last.format("%m-%d").to_string(), Style::default().fg(theme.dimmed)),
        ],
        _ => Vec::new(),
    };
    let y_labels: Vec<Span> = vec![
        Span::styled("0", Style::default().fg(theme.dimmed)),
        Span::styled(format!("{max_y:.0}"), Style::default().fg(theme.dimmed)),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(" Daily incidents "),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, max_x])
                .labels(x_labels)
                .style(Style::default().fg(theme.dimmed)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, max_y])
                .labels(y_labels)
                .style(Style::default().fg(theme.dimmed)),
        );

    f.render_widget(chart, area);
}

fn draw_bars(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let bars = &app.dashboard.bars;

    let mut widget = BarChartWidget::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(" Open / no power cause "),
        )
        .bar_width(3)
        .bar_gap(1)
        .group_gap(2);

    for (i, label) in bars.labels.iter().enumerate() {
        let group_bars: Vec<Bar> = bars
            .series
            .iter()
            .enumerate()
            .map(|(s, series)| {
                Bar::default()
                    .value(series.values.get(i).copied().unwrap_or(0))
                    .style(Style::default().fg(Theme::series_color(s)))
            })
            .collect();
        widget = widget.data(
            BarGroup::default()
                .label(Line::from(label.as_str()))
                .bars(&group_bars),
        );
    }

    f.render_widget(widget, area);
}

fn draw_donut_row(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let donuts = &app.dashboard.donuts;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(format!(" SLA: {} ", donuts.category.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let constraints: Vec<Constraint> = donuts
        .slots
        .iter()
        .map(|_| Constraint::Ratio(1, donuts.slots.len() as u32))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);

    for (slot, area) in donuts.slots.iter().zip(slots.iter()) {
        draw_donut(f, *area, slot, theme);
    }
}

/// One SLA slot: region name, a proportional segment bar in the fixed
/// bucket palette, and per-bucket counts when the tooltip is enabled.
fn draw_donut(f: &mut Frame, area: Rect, slot: &DonutChart, theme: &Theme) {
    let width = area.width.saturating_sub(2).max(1) as u64;

    let name = slot.region.as_deref().unwrap_or("-");
    let mut lines = vec![Line::from(Span::styled(
        format!(" {name}"),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    ))];

    if slot.empty {
        lines.push(Line::from(Span::styled(
            format!(" {}", "█".repeat(width as usize)),
            Style::default().fg(theme.empty),
        )));
        lines.push(Line::from(Span::styled(
            " no data",
            Style::default().fg(theme.dimmed),
        )));
    } else {
        let total: u64 = slot.values.iter().sum();
        let mut segments = vec![Span::raw(" ")];
        let gap = if slot.border_width > 0 { 1 } else { 0 };
        for bucket in SlaBucket::ALL {
            let value = slot.values[bucket as usize];
            if value == 0 {
                continue;
            }
            let cells = ((value * width) / total).max(1) as usize;
            segments.push(Span::styled(
                "█".repeat(cells),
                Style::default().fg(Theme::bucket_color(bucket)),
            ));
            if gap > 0 {
                segments.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(segments));

        if slot.tooltip_enabled {
            let counts = SlaBucket::ALL
                .iter()
                .map(|b| format!("{}:{}", &b.label()[..1], slot.values[*b as usize]))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(Line::from(Span::styled(
                format!(" {counts}"),
                Style::default().fg(theme.dimmed),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let key = |k: &str| {
        Span::styled(
            format!(" {k} "),
            Style::default()
                .fg(ratatui::style::Color::Black)
                .bg(ratatui::style::Color::Gray),
        )
    };
    let export = if app.export_on_exit { "on" } else { "off" };
    let footer = Paragraph::new(Line::from(vec![
        key("q"),
        Span::raw(" Quit  "),
        key("Tab"),
        Span::raw(" Field  "),
        key("a"),
        Span::raw(" Apply  "),
        key("r"),
        Span::raw(" Reset  "),
        key("s"),
        Span::raw(" SLA type  "),
        key("t"),
        Span::raw(" Theme  "),
        key("e"),
        Span::raw(format!(" Export on exit: {export}")),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    )
    .alignment(Alignment::Left);

    f.render_widget(footer, area);
}
