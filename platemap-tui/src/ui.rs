use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table,
        TableState, Wrap,
    },
};

use crate::app::{App, Detail, LoadFailure, Screen};

/// Five-step blue scale, light to dark, for the colour values.
const VALUE_SCALE: [Color; 5] = [
    Color::Rgb(0xe0, 0xf3, 0xff),
    Color::Rgb(0xb3, 0xd9, 0xff),
    Color::Rgb(0x66, 0xb3, 0xff),
    Color::Rgb(0x33, 0x99, 0xff),
    Color::Rgb(0x00, 0x80, 0xff),
];
const VALUE_MIN: f64 = 0.0;
const VALUE_MAX: f64 = 200.0;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("platemap – license plate prefixes of China")
        .block(Block::default().borders(Borders::ALL).title("车牌号"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::SourceSelect => draw_source_select(frame, app, *content_area),
        Screen::Loading => draw_loading(frame, app, *content_area),
        Screen::Map => draw_map(frame, app, *content_area),
    }

    draw_status(frame, app, *status_area);

    if let Some(failure) = &app.failure {
        draw_failure(frame, failure, area);
    } else if let Some(detail) = &app.detail {
        draw_detail(frame, detail, area);
    }
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let nav_hint = match app.screen {
        Screen::SourceSelect => "↑/↓ move · Enter/Space load source · q/Ctrl-C quit",
        Screen::Loading => "Esc/x cancel · q/Ctrl-C quit",
        Screen::Map => "↑/↓ hover · Enter/Space open · r reload · Esc/←/b sources · q quit",
    };

    let status_text = if let Some(msg) = &app.status_message {
        format!("{msg} · {nav_hint}")
    } else if let (Screen::Map, Some(context), Some(loaded_at)) =
        (app.screen, &app.context, app.loaded_at)
    {
        format!(
            "Loaded {} at {} · {nav_hint}",
            context.report(),
            loaded_at.format("%H:%M:%S")
        )
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.status_message.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, area);
}

fn draw_source_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .sources
        .iter()
        .enumerate()
        .map(|(idx, meta)| {
            let prefix = if idx == app.source_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", meta.name))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select boundary source (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.sources.is_empty() {
        state.select(Some(app.source_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_loading(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [gauge_area, info_area] = chunks else {
        return;
    };

    let progress = app.progress;
    let ratio = if progress.total == 0 {
        0.0
    } else {
        #[expect(
            clippy::cast_precision_loss,
            reason = "region counts are tiny"
        )]
        let ratio = progress.succeeded as f64 / progress.total as f64;
        ratio.clamp(0.0, 1.0)
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("正在加载地图数据… 请稍候"),
        )
        .gauge_style(Style::default().fg(Color::Rgb(0x66, 0x7e, 0xea)))
        .ratio(ratio)
        .label(progress.to_string());
    frame.render_widget(gauge, *gauge_area);

    let info = Paragraph::new(format!(
        "Batches joined: {}/{}\nFailed so far: {}",
        progress.batches_done, progress.batch_count, progress.failed
    ))
    .block(Block::default().borders(Borders::ALL).title("Progress"))
    .wrap(Wrap { trim: true });
    frame.render_widget(info, *info_area);
}

fn draw_map(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [list_area, tooltip_area] = chunks else {
        return;
    };

    let rows = app.regions.iter().map(|row| {
        let plate = row.plate.as_deref().unwrap_or("–");
        Row::new(vec![Cell::from(row.label.clone()), Cell::from(plate.to_owned())])
            .style(Style::default().fg(value_color(row.value)))
    });

    let map_name = app.context.as_ref().map_or("", |context| context.map_name());
    let table = Table::new(rows, [Constraint::Min(16), Constraint::Length(6)])
        .header(
            Row::new(vec!["Region", "Plate"]).style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Map “{map_name}” ({} regions)", app.regions.len())),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Rgb(0xff, 0xa7, 0x26))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !app.regions.is_empty() {
        state.select(Some(app.region_index));
    }
    frame.render_stateful_widget(table, *list_area, &mut state);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let tooltip = match app.current_region() {
        Some(row) => match &row.plate {
            Some(plate) => vec![
                Line::from(Span::styled(row.label.clone(), bold)),
                Line::from(""),
                Line::from(Span::styled(
                    format!("车牌: {plate}"),
                    bold.fg(Color::Rgb(0x4f, 0xc3, 0xf7)),
                )),
            ],
            None => vec![Line::from(Span::styled(row.label.clone(), bold))],
        },
        None => vec![Line::from("No regions loaded.")],
    };

    let paragraph = Paragraph::new(tooltip)
        .block(Block::default().borders(Borders::ALL).title("Region"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, *tooltip_area);
}

fn draw_detail(frame: &mut Frame<'_>, detail: &Detail, area: Rect) {
    let popup = centered(area, 40, 9);
    frame.render_widget(Clear, popup);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(Span::styled(detail.name.clone(), bold)).centered(),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {} ", detail.plate),
            bold.fg(Color::Black).bg(Color::White),
        ))
        .centered(),
        Line::from(""),
        Line::from("Esc/Enter to close".italic()).centered(),
    ];

    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(0x00, 0x66, 0xcc)))
            .title("车牌"),
    );
    frame.render_widget(paragraph, popup);
}

fn draw_failure(frame: &mut Frame<'_>, failure: &LoadFailure, area: Rect) {
    let popup = centered(area, 60, 11);
    frame.render_widget(Clear, popup);

    let mut text = vec![
        Line::from("无法加载地图数据".bold()),
        Line::from(""),
        Line::from(format!("Error: {}", failure.message)),
    ];
    if let Some(report) = failure.report {
        text.push(Line::from(format!(
            "Sources: {} succeeded, {} failed",
            report.success_count, report.failure_count
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from("r retry · Esc dismiss".italic()));

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("地图加载失败"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
}

fn value_color(value: Option<f64>) -> Color {
    let Some(value) = value else {
        return Color::DarkGray;
    };
    let normalized = ((value - VALUE_MIN) / (VALUE_MAX - VALUE_MIN)).clamp(0.0, 1.0);
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        reason = "normalized is clamped to [0, 1]"
    )]
    let step = (normalized * (VALUE_SCALE.len() - 1) as f64).round() as usize;
    VALUE_SCALE.get(step).copied().unwrap_or(Color::Blue)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
