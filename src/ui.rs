use crate::app::{HeaderSection, InputMode, Viewer, format_years};
use crate::core::{SessionView, plural};
use crate::model::{FilterColumn, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

const APP_TITLE: &str = "Spotify Streaming History  ";

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    empty: Color,
    header_bg: Color,
    switch_hint: Color,
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(10, 15, 24),
            panel_bg: Color::Rgb(19, 29, 43),
            panel_alt_bg: Color::Rgb(24, 38, 58),
            border: Color::Rgb(69, 121, 176),
            text: Color::Rgb(214, 228, 248),
            muted: Color::Rgb(149, 173, 204),
            accent: Color::Rgb(100, 203, 184),
            alert: Color::Rgb(249, 174, 88),
            empty: Color::Rgb(96, 110, 130),
            header_bg: Color::Rgb(34, 55, 82),
            switch_hint: Color::Rgb(255, 122, 165),
        },
        Theme::PitchBlack => ThemePalette {
            bg: Color::Rgb(0, 0, 0),
            panel_bg: Color::Rgb(8, 8, 8),
            panel_alt_bg: Color::Rgb(15, 15, 15),
            border: Color::Rgb(74, 74, 74),
            text: Color::Rgb(242, 242, 242),
            muted: Color::Rgb(150, 150, 150),
            accent: Color::Rgb(212, 212, 212),
            alert: Color::Rgb(235, 176, 97),
            empty: Color::Rgb(90, 90, 90),
            header_bg: Color::Rgb(26, 26, 26),
            switch_hint: Color::Rgb(255, 133, 168),
        },
        Theme::Matrix => ThemePalette {
            bg: Color::Rgb(4, 12, 4),
            panel_bg: Color::Rgb(8, 22, 8),
            panel_alt_bg: Color::Rgb(12, 30, 12),
            border: Color::Rgb(39, 143, 62),
            text: Color::Rgb(180, 255, 185),
            muted: Color::Rgb(102, 177, 115),
            accent: Color::Rgb(95, 255, 122),
            alert: Color::Rgb(219, 234, 114),
            empty: Color::Rgb(60, 110, 70),
            header_bg: Color::Rgb(18, 43, 20),
            switch_hint: Color::Rgb(119, 255, 210),
        },
    }
}

pub fn draw(frame: &mut Frame, viewer: &Viewer, view: &SessionView) {
    let colors = palette(viewer.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, vertical[0], viewer.section, view, &colors);
    draw_filters(frame, vertical[1], viewer, view, &colors);
    match viewer.section {
        HeaderSection::Songs => draw_songs(frame, vertical[2], view, &colors),
        HeaderSection::Episodes => draw_episodes(frame, vertical[2], view, &colors),
    }
    draw_footer(frame, vertical[3], viewer, view, &colors);
}

fn draw_header(
    frame: &mut Frame,
    area: Rect,
    section: HeaderSection,
    view: &SessionView,
    colors: &ThemePalette,
) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(inner);

    let mut spans = vec![Span::styled(
        APP_TITLE,
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    )];
    for (idx, (count, noun)) in [
        (view.file_count, "file"),
        (view.track_count, "song"),
        (view.episode_count, "episode"),
        (view.years.len(), "year"),
        (view.song_streams, "stream"),
    ]
    .into_iter()
    .enumerate()
    {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default()));
        }
        spans.push(chip(&format!("{count} {noun}{}", plural(count)), count > 0, colors));
    }
    if view.dropped > 0 {
        spans.push(Span::styled("  ", Style::default()));
        spans.push(Span::styled(
            format!("[{} dropped]", view.dropped),
            Style::default().fg(colors.alert),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    let tabs = Paragraph::new(section_line(section, colors)).alignment(Alignment::Right);
    frame.render_widget(tabs, chunks[1]);
}

fn chip(label: &str, active: bool, colors: &ThemePalette) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors.empty)
    };
    Span::styled(format!("[{label}]"), style)
}

fn section_line(selected: HeaderSection, colors: &ThemePalette) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "Tab",
        Style::default()
            .fg(colors.switch_hint)
            .add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::styled(" - ", Style::default().fg(colors.muted)));

    for (idx, section) in [HeaderSection::Songs, HeaderSection::Episodes]
        .into_iter()
        .enumerate()
    {
        if idx > 0 {
            spans.push(Span::styled(" -- ", Style::default().fg(colors.muted)));
        }
        let mut style = Style::default().fg(colors.text);
        if section == selected {
            style = style
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        spans.push(Span::styled(section.label(), style));
    }

    Line::from(spans)
}

fn draw_filters(
    frame: &mut Frame,
    area: Rect,
    viewer: &Viewer,
    view: &SessionView,
    colors: &ThemePalette,
) {
    let query = viewer.session.query();
    let editing = |mode: InputMode| viewer.input_mode == mode;
    let label_style = |active: bool| {
        if active {
            Style::default()
                .fg(colors.alert)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.muted)
        }
    };

    let selected_years: Vec<i32> = query.years().iter().copied().collect();
    let years_text = if editing(InputMode::Years) {
        format!("{}_", viewer.input)
    } else if selected_years.is_empty() {
        format!("all ({})", format_years(&view.years))
    } else {
        format_years(&selected_years)
    };

    let search_text = if editing(InputMode::Search) {
        format!("{}_", viewer.input)
    } else if query.has_search() {
        query.search().to_string()
    } else {
        String::from("-")
    };

    let mut spans = vec![
        Span::styled("Years (y) ", label_style(editing(InputMode::Years))),
        Span::styled(years_text, Style::default().fg(colors.text)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled("Column (c) ", label_style(false)),
    ];
    for column in FilterColumn::ALL {
        let style = if column == query.column() {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(colors.muted)
        };
        spans.push(Span::styled(column.label(), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(" |  ", Style::default().fg(colors.muted)));
    spans.push(Span::styled(
        "Filter (/) ",
        label_style(editing(InputMode::Search)),
    ));
    spans.push(Span::styled(search_text, Style::default().fg(colors.text)));

    let filters = Paragraph::new(Line::from(spans)).block(panel_block(
        "Filters",
        colors.panel_alt_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(filters, area);
}

fn draw_songs(frame: &mut Frame, area: Rect, view: &SessionView, colors: &ThemePalette) {
    let block = panel_block("Most Played Songs", colors.panel_bg, colors.text, colors.border);
    if view.page.rows.is_empty() {
        let empty = Paragraph::new(Span::styled("No data", Style::default().fg(colors.empty)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        ["Name", "Album", "Artist", "Play Time (hours)", "Play Count"]
            .into_iter()
            .map(Cell::from),
    )
    .style(
        Style::default()
            .fg(colors.accent)
            .bg(colors.header_bg)
            .add_modifier(Modifier::BOLD),
    );

    let rows = view.page.rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.name.clone()),
            Cell::from(row.album.clone()),
            Cell::from(row.artist.clone()),
            Cell::from(format!("{:.2}", row.hours)),
            Cell::from(row.count.to_string()),
        ])
        .style(Style::default().fg(colors.text))
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(32),
            Constraint::Percentage(26),
            Constraint::Percentage(22),
            Constraint::Length(18),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .column_spacing(1)
    .block(block);
    frame.render_widget(table, area);
}

fn draw_episodes(frame: &mut Frame, area: Rect, view: &SessionView, colors: &ThemePalette) {
    let text = vec![
        Line::from(Span::styled(
            format!(
                "{} episode{} loaded.",
                view.episode_count,
                plural(view.episode_count)
            ),
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(
            "Episode statistics are not computed yet.",
            Style::default().fg(colors.muted),
        )),
    ];
    let episodes = Paragraph::new(text)
        .block(panel_block("Episodes", colors.panel_bg, colors.text, colors.border))
        .wrap(Wrap { trim: true });
    frame.render_widget(episodes, area);
}

fn draw_footer(
    frame: &mut Frame,
    area: Rect,
    viewer: &Viewer,
    view: &SessionView,
    colors: &ThemePalette,
) {
    let page = &view.page;
    let mut spans = vec![
        Span::styled(
            format!("Page {}/{}", page.page, page.page_count.max(1)),
            Style::default()
                .fg(colors.alert)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({} row{})", page.matching_rows, plural(page.matching_rows)),
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
    ];

    if viewer.input_mode == InputMode::Command {
        spans.push(Span::styled(
            format!(":{}_", viewer.input),
            Style::default().fg(colors.text),
        ));
    } else {
        spans.push(Span::styled(
            "Keys: <-/-> page, / filter, c column, y years, Tab episodes, : command, q quit",
            Style::default().fg(colors.muted),
        ));
        spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));
        spans.push(Span::styled(
            viewer.session.status.as_str(),
            Style::default().fg(colors.text),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, area);
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}
