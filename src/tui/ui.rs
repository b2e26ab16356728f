use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::catalog::Category;
use crate::notify::NoticeKind;
use crate::session::{Session, StageStatus};

use super::TuiController;
use super::app::{App, EPISODE_COLUMNS, Pane};

pub fn draw(frame: &mut Frame, app: &App, controller: &TuiController) {
    let session = controller.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search input
            Constraint::Length(1), // Category tabs
            Constraint::Length(4), // Now playing
            Constraint::Min(0),    // Shows | Episodes
            Constraint::Length(1), // Toast
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    let title = Line::from(vec![
        Span::styled(
            "T3",
            Style::default()
                .fg(Color::Indexed(62))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Watch", Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    draw_search(frame, app, session, chunks[1]);
    draw_categories(frame, session.category(), chunks[2]);
    draw_now_playing(frame, app, session, chunks[3]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[4]);
    draw_shows(frame, app, session, body[0]);
    draw_episodes(frame, app, session, body[1]);

    draw_toast(frame, controller, chunks[5]);

    let help = match app.focus {
        Pane::Search => "type: search | Ctrl+T: category | Tab: focus | Esc: clear/quit",
        Pane::Shows => "↑/↓: navigate | Enter: episodes | Ctrl+T: category | Tab: focus | q: quit",
        Pane::Episodes => "←/→/↑/↓: navigate | Enter: play | [/]: page | Tab: focus | q: quit",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[6],
    );
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn draw_search(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let placeholder = format!("Search {}", session.category().label());
    let paragraph = if app.search_input.is_empty() {
        Paragraph::new(placeholder).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.search_input.as_str()).style(Style::default().fg(Color::White))
    };
    frame.render_widget(
        paragraph.block(pane_block("Search".to_string(), app.focus == Pane::Search)),
        area,
    );

    if app.focus == Pane::Search {
        let width = Span::raw(app.search_input.as_str()).width() as u16;
        frame.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

fn draw_categories(frame: &mut Frame, active: Category, area: Rect) {
    let mut spans = Vec::new();
    for category in Category::ALL {
        let style = if *category == active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(category.label(), style));
        spans.push(Span::raw("    "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn status_line(app: &App, status: StageStatus, loading: &str) -> Option<Line<'static>> {
    match status {
        StageStatus::Loading => Some(Line::from(Span::styled(
            format!("{} {}", app.spinner(), loading),
            Style::default().fg(Color::Yellow),
        ))),
        StageStatus::Error => Some(Line::from(Span::styled(
            "Error",
            Style::default().fg(Color::Red),
        ))),
        StageStatus::Idle | StageStatus::Success => None,
    }
}

fn draw_now_playing(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let mut lines = Vec::new();
    if let Some(line) = status_line(app, session.resolve_status(), "Loading stream...") {
        lines.push(line);
    }
    if let Some(url) = session.current_stream_url() {
        lines.push(Line::from(Span::styled(
            session.selected_show_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            url.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    } else if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nothing playing",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
        .title("Now Playing");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_shows(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let focused = app.focus == Pane::Shows;
    let block = pane_block(format!("Shows [{}]", session.shows().len()), focused);

    if session.shows().is_empty() {
        let line = status_line(app, session.search_status(), "Searching...").unwrap_or_else(|| {
            let text = if session.no_shows_found() {
                "No shows found."
            } else {
                "Start typing to search"
            };
            Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
        });
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let name_width = usize::from(area.width.saturating_sub(6));
    let mut items: Vec<ListItem> = Vec::new();
    if let Some(line) = status_line(app, session.search_status(), "Searching...") {
        items.push(ListItem::new(line));
    }
    // Status line, if any, sits above the first show
    let mut state = ListState::default().with_selected(Some(items.len() + app.selected_show));
    items.extend(session.shows().iter().enumerate().map(|(i, show)| {
        let style = if focused && i == app.selected_show {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if i == app.selected_show {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if show.img.is_some() { "▣ " } else { "  " };
        let (name, _) = show.name.unicode_truncate(name_width);
        ListItem::new(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::DarkGray)),
            Span::raw(name.to_string()),
        ]))
        .style(style)
    }));

    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn draw_episodes(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let focused = app.focus == Pane::Episodes;
    let title = match session.selected_show() {
        Some(show) => format!("Episodes - {} [{}]", show.name, session.episodes().len()),
        None => "Episodes".to_string(),
    };
    let block = pane_block(title, focused);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(line) = status_line(app, session.episodes_status(), "Loading episodes...") {
        lines.push(line);
    }
    if session.no_episodes_yet() {
        lines.push(Line::from("No episode out yet."));
    }

    for (row, chunk) in session
        .visible_episodes()
        .chunks(EPISODE_COLUMNS)
        .enumerate()
    {
        let spans: Vec<Span> = chunk
            .iter()
            .enumerate()
            .map(|(col, episode)| {
                let slot = row * EPISODE_COLUMNS + col;
                let playing = session
                    .current_episode()
                    .is_some_and(|current| current.path == episode.path);
                let style = if focused && slot == app.selected_episode {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if playing {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().bg(Color::Indexed(236))
                };
                Span::styled(format!(" {:<7}", episode.label()), style)
            })
            .flat_map(|span| [span, Span::raw(" ")])
            .collect();
        lines.push(Line::from(spans));
    }

    if session.shows_page_selector() {
        lines.push(Line::from(""));
        let mut spans = vec![Span::styled("Page ", Style::default().fg(Color::DarkGray))];
        for page in 1..=session.total_pages() {
            let style = if page == session.page_index() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!("[{}]", page), style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_toast(frame: &mut Frame, controller: &TuiController, area: Rect) {
    let Some(toast) = controller.notifier().latest() else {
        return;
    };
    let color = match toast.kind {
        NoticeKind::Error => Color::Red,
        NoticeKind::Info => Color::Yellow,
    };
    let paragraph = Paragraph::new(toast.message.as_str())
        .style(Style::default().fg(color))
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Show;
    use ratatui::{Terminal, backend::TestBackend};

    fn rendered_shows(app: &App, session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal
            .draw(|frame| draw_shows(frame, app, session, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_selected_show_stays_visible() {
        let mut session = Session::default();
        let request = session.commit_query("title").unwrap();
        let shows = (0..50)
            .map(|i| Show {
                name: format!("Title-{}", i),
                path: format!("/t{}", i),
                img: None,
            })
            .collect();
        session.complete_search(&request, Ok(shows));

        let mut app = App::new();
        app.focus = Pane::Shows;
        let top = rendered_shows(&app, &session);
        assert!(top.contains("Title-0 "));

        app.selected_show = 40;
        let scrolled = rendered_shows(&app, &session);
        assert!(scrolled.contains("Title-40"));
        assert!(!scrolled.contains("Title-0 "));
    }
}
