use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table, Tabs,
    },
    Frame,
};

use crate::cli::load_overview;
use crate::error::Result;
use crate::fmt::{compact, money, to_f64};
use crate::presentation::{
    expense_rows, result_rows, revenue_rows, result_series, revenue_series, Overview,
    EXPENSE_HEADER, RESULT_HEADER, REVENUE_HEADER,
};
use crate::settings::load_settings;
use crate::tui::{
    money_span, run_view, View, ViewAction, AMOUNT_NEG_STYLE, AMOUNT_POS_STYLE, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE,
};

const TAB_TITLES: [&str; 3] = ["Revenue", "Expenses", "Result"];

const SERIES_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::LightBlue,
    Color::LightRed,
    Color::LightGreen,
    Color::White,
    Color::Blue,
];

const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);
const HEADER_ROW_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tab {
    Revenue,
    Expenses,
    Result,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Tab::Revenue => 0,
            Tab::Expenses => 1,
            Tab::Result => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            Tab::Revenue => Tab::Expenses,
            Tab::Expenses => Tab::Result,
            Tab::Result => Tab::Revenue,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Revenue => Tab::Result,
            Tab::Expenses => Tab::Revenue,
            Tab::Result => Tab::Expenses,
        }
    }
}

pub fn run(file: &str) -> Result<()> {
    let settings = load_settings()?;
    let overview = load_overview(file, &settings)?;
    let mut dashboard = Dashboard::new(file, overview, &settings.currency_symbol);
    run_view(&mut dashboard)
}

pub(crate) struct Dashboard {
    title: String,
    overview: Overview,
    symbol: String,
    tab: Tab,
    offset: usize,
    visible_count: usize,
}

impl Dashboard {
    pub(crate) fn new(file: &str, overview: Overview, symbol: &str) -> Self {
        Self {
            title: format!("Financial Analysis \u{2014} {file}"),
            overview,
            symbol: symbol.to_string(),
            tab: Tab::Revenue,
            offset: 0,
            visible_count: 10,
        }
    }

    fn select(&mut self, tab: Tab) {
        self.tab = tab;
        self.offset = 0;
    }

    fn row_count(&self) -> usize {
        match self.tab {
            Tab::Revenue => self.overview.report.revenue.len(),
            Tab::Expenses => self.overview.report.expenses.len(),
            Tab::Result => self.overview.report.result.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Tabs
    // -----------------------------------------------------------------------

    fn draw_revenue(&mut self, frame: &mut Frame, area: Rect) {
        let [chart_area, table_area] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Fill(1)]).areas(area);

        let series = revenue_series(&self.overview.report.revenue);
        let bars: Vec<Bar> = series
            .iter()
            .map(|(label, value)| {
                Bar::default()
                    .value(to_f64(*value).round().max(0.0) as u64)
                    .label(Line::from(label.clone()))
                    .text_value(compact(&self.symbol, to_f64(*value)))
                    .style(Style::default().fg(Color::Blue))
            })
            .collect();
        self.draw_bars(frame, chart_area, "Monthly Revenue", &bars);

        let rows: Vec<Row> = revenue_rows(&self.overview.report.revenue, &self.symbol)
            .into_iter()
            .map(|r| Row::new(r.map(Cell::from)))
            .collect();
        self.draw_table(
            frame,
            table_area,
            Row::new(REVENUE_HEADER),
            rows,
            vec![Constraint::Length(10), Constraint::Length(18)],
        );
    }

    fn draw_expenses(&mut self, frame: &mut Frame, area: Rect) {
        let [chart_area, table_area] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Fill(1)]).areas(area);

        let pivot = &self.overview.pivot;
        let points: Vec<Vec<(f64, f64)>> = pivot
            .series
            .iter()
            .map(|s| {
                s.values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, to_f64(*v)))
                    .collect()
            })
            .collect();
        let max_y = points
            .iter()
            .flatten()
            .map(|(_, y)| *y)
            .fold(0.0f64, f64::max)
            .max(1.0);

        let datasets: Vec<Dataset> = pivot
            .series
            .iter()
            .zip(&points)
            .enumerate()
            .map(|(i, (s, data))| {
                Dataset::default()
                    .name(s.category.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                    .data(data)
            })
            .collect();

        let month_labels: Vec<String> = match pivot.months.as_slice() {
            [] => Vec::new(),
            [only] => vec![only.label()],
            [first, .., last] => vec![first.label(), last.label()],
        };
        let x_max = pivot.months.len().saturating_sub(1).max(1) as f64;
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title("Expenses by Category")
                    .title_style(BOLD)
                    .borders(Borders::NONE),
            )
            .x_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([0.0, x_max])
                    .labels(month_labels),
            )
            .y_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([0.0, max_y])
                    .labels(vec![
                        compact(&self.symbol, 0.0),
                        compact(&self.symbol, max_y / 2.0),
                        compact(&self.symbol, max_y),
                    ]),
            );
        frame.render_widget(chart, chart_area);

        let rows: Vec<Row> = expense_rows(&self.overview.report.expenses, &self.symbol)
            .into_iter()
            .map(|r| Row::new(r.map(Cell::from)))
            .collect();
        self.draw_table(
            frame,
            table_area,
            Row::new(EXPENSE_HEADER),
            rows,
            vec![Constraint::Length(10), Constraint::Fill(1), Constraint::Length(18)],
        );
    }

    fn draw_result(&mut self, frame: &mut Frame, area: Rect) {
        let [metrics_area, chart_area, table_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Percentage(45),
            Constraint::Fill(1),
        ])
        .areas(area);

        let summary = self.overview.summary;
        let metric_areas: [Rect; 3] = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(metrics_area);
        let metrics = [
            ("Total Revenue", Span::styled(money(&self.symbol, summary.total_revenue), BOLD)),
            ("Total Expenses", Span::styled(money(&self.symbol, summary.total_expenses), BOLD)),
            ("Final Result", money_span(&self.symbol, summary.net)),
        ];
        for ((label, value), metric_area) in metrics.into_iter().zip(metric_areas) {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(format!(" {label}"), FOOTER_STYLE)),
                    Line::from(vec![Span::raw(" "), value]),
                ]),
                metric_area,
            );
        }

        let bars: Vec<Bar> = result_series(&self.overview.report.result)
            .iter()
            .map(|(label, net)| {
                let value = to_f64(*net);
                let style = if value < 0.0 { AMOUNT_NEG_STYLE } else { AMOUNT_POS_STYLE };
                Bar::default()
                    .value(value.abs().round() as u64)
                    .label(Line::from(label.clone()))
                    .text_value(compact(&self.symbol, value))
                    .style(style)
            })
            .collect();
        self.draw_bars(frame, chart_area, "Monthly Profit/Loss (red = loss)", &bars);

        let net_styles: Vec<Style> = self
            .overview
            .report
            .result
            .iter()
            .map(|r| {
                if r.net.is_sign_negative() && !r.net.is_zero() {
                    AMOUNT_NEG_STYLE
                } else {
                    AMOUNT_POS_STYLE
                }
            })
            .collect();
        let rows: Vec<Row> = result_rows(&self.overview.report.result, &self.symbol)
            .into_iter()
            .zip(net_styles)
            .map(|([month, inflow, outflow, net], style)| {
                Row::new(vec![
                    Cell::from(month),
                    Cell::from(inflow),
                    Cell::from(outflow),
                    Cell::from(Span::styled(net, style)),
                ])
            })
            .collect();
        self.draw_table(
            frame,
            table_area,
            Row::new(RESULT_HEADER),
            rows,
            vec![
                Constraint::Length(10),
                Constraint::Length(18),
                Constraint::Length(18),
                Constraint::Length(18),
            ],
        );
    }

    // -----------------------------------------------------------------------
    // Shared pieces
    // -----------------------------------------------------------------------

    fn draw_bars(&self, frame: &mut Frame, area: Rect, title: &str, bars: &[Bar]) {
        if bars.is_empty() {
            frame.render_widget(
                Paragraph::new(format!(" {title}: no data")).style(FOOTER_STYLE),
                area,
            );
            return;
        }
        let longest = bars.len().max(1) as u16;
        let bar_width = (area.width / longest).saturating_sub(1).clamp(3, 9);
        let chart = BarChart::default()
            .block(
                Block::default()
                    .title(title.to_string())
                    .title_style(BOLD)
                    .borders(Borders::NONE),
            )
            .bar_width(bar_width)
            .bar_gap(1)
            .data(BarGroup::default().bars(bars));
        frame.render_widget(chart, area);
    }

    fn draw_table(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        header: Row<'static>,
        rows: Vec<Row<'static>>,
        widths: Vec<Constraint>,
    ) {
        let header_overhead = 2u16;
        let visible = area.height.saturating_sub(header_overhead) as usize;
        self.visible_count = visible.max(1);

        let visible_rows: Vec<Row> = rows.into_iter().skip(self.offset).take(visible).collect();
        let table = Table::new(visible_rows, widths)
            .header(header.style(HEADER_ROW_STYLE).bottom_margin(1))
            .column_spacing(2);
        frame.render_widget(table, area);
    }
}

impl View for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, tabs_area, sep_area, content_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.title)).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Tabs::new(TAB_TITLES)
                .select(self.tab.index())
                .highlight_style(SELECTED_STYLE)
                .divider("|"),
            tabs_area,
        );
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        match self.tab {
            Tab::Revenue => self.draw_revenue(frame, content_area),
            Tab::Expenses => self.draw_expenses(frame, content_area),
            Tab::Result => self.draw_result(frame, content_area),
        }

        let skipped = match self.overview.skipped.len() {
            0 => String::new(),
            n => format!("  ({n} row(s) skipped)"),
        };
        frame.render_widget(
            Paragraph::new(format!(
                " \u{2190}/\u{2192} or Tab=switch view  \u{2191}/\u{2193}=scroll  q/Esc=quit{skipped}"
            ))
            .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        let max = self.row_count().saturating_sub(self.visible_count);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Tab | KeyCode::Right => self.select(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.select(self.tab.prev()),
            KeyCode::Char('1') => self.select(Tab::Revenue),
            KeyCode::Char('2') => self.select(Tab::Expenses),
            KeyCode::Char('3') => self.select(Tab::Result),
            KeyCode::Up | KeyCode::Char('k') => self.offset = self.offset.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.offset = (self.offset + 1).min(max),
            KeyCode::Home => self.offset = 0,
            KeyCode::End => self.offset = max,
            _ => {}
        }
        ViewAction::Continue
    }
}
