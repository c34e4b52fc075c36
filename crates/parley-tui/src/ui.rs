use parley_core::{Block as ContentBlock, ChatRole, ViewMode};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};

const TYPING_CURSOR: &str = "▌";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view() {
        ViewMode::Welcome => render_welcome_screen(app, frame, body_area),
        ViewMode::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" parley ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{}: {}", app.backend.provider().display_name(), app.backend.model()),
            Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match (app.view(), app.input_mode) {
        (ViewMode::Welcome, _) => " WELCOME ",
        (ViewMode::Chat, InputMode::Normal) => " CHAT ",
        (ViewMode::Chat, InputMode::Editing) => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match (app.view(), app.input_mode) {
        (ViewMode::Welcome, _) => &[(" Enter ", " start "), (" q ", " quit ")],
        (ViewMode::Chat, InputMode::Normal) => &[
            (" i ", " type "),
            (" j/k ", " scroll "),
            (" n/p ", " code block "),
            (" y ", " copy "),
            (" f ", " skip typing "),
            (" Esc ", " home "),
            (" q ", " quit "),
        ],
        (ViewMode::Chat, InputMode::Editing) => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in keys {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_welcome_screen(app: &App, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "parley",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Ask anything. Replies are typed out as they arrive.",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(" Enter ", Style::default().bg(Color::DarkGray).fg(Color::White)),
            Span::raw(" start chatting"),
        ]),
    ];

    let count = app.conversation.log().len();
    if count > 0 {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Conversation in progress ({} messages)", count),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let welcome = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(welcome, area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let banner_height = if app.conversation.error().is_some() { 3 } else { 0 };

    let [banner_area, chat_area, input_area] = Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    if let Some(error) = app.conversation.error() {
        let banner = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title(" Error "),
            );
        frame.render_widget(banner, banner_area);
    }

    // Store chat area for mouse hit-testing and scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    // Lines are wrapped here rather than by the paragraph so the row count,
    // and with it the bottom scroll offset, is exact.
    let width = app.chat_width as usize;
    let lines = if app.conversation.log().is_empty() && !app.conversation.is_loading() {
        wrap_text_to_width("Type a message below to start the conversation...", width)
            .into_iter()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::DarkGray))))
            .collect()
    } else {
        chat_lines(app, width)
    };
    app.fit_scroll(lines.len().min(u16::MAX as usize) as u16);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

/// All chat rows at `width`: messages, code blocks, typing cursor and
/// thinking indicator.
fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut code_index = 0;

    for (msg, message_frame) in app.message_frames() {
        let (label, color) = match msg.role() {
            ChatRole::User => ("You", Color::Cyan),
            ChatRole::Assistant => ("AI", Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}:", label), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" {}", msg.timestamp().with_timezone(&chrono::Local).format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        for block in &message_frame.blocks {
            match block {
                ContentBlock::Text(text) => {
                    for line in text.split('\n') {
                        lines.extend(wrap_text_to_width(line, width).into_iter().map(Line::from));
                    }
                }
                ContentBlock::Code { language, code } => {
                    push_code_block(app, &mut lines, code_index, language, code, width);
                    code_index += 1;
                }
            }
        }

        if message_frame.cursor {
            let glyph = if app.cursor_visible { TYPING_CURSOR } else { " " };
            let cursor = Span::styled(glyph, Style::default().fg(Color::Magenta));
            match lines.last_mut() {
                Some(last) if width == 0 || last.width() < width => last.spans.push(cursor),
                _ => lines.push(Line::from(cursor)),
            }
        }

        lines.push(Line::default());
    }

    if app.conversation.is_loading() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_code_block(
    app: &App,
    lines: &mut Vec<Line<'static>>,
    index: usize,
    language: &str,
    code: &str,
    width: usize,
) {
    let selected = app.selected_code == Some(index);
    let border = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let action = if app.is_copied(index) {
        Span::styled(" Copied! ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else if selected {
        Span::styled(" [y] copy ", Style::default().fg(Color::Gray))
    } else {
        Span::styled(" [n/p] select ", Style::default().fg(Color::DarkGray))
    };

    lines.push(Line::from(vec![
        Span::styled("╭─ ", border),
        Span::styled(
            language.to_string(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ─", border),
        action,
    ]));
    // Code keeps its spacing, so long lines are cut at the width instead of at words
    let code_width = width.saturating_sub(2);
    for code_line in code.split('\n') {
        for piece in split_at_width(code_line, code_width) {
            lines.push(Line::from(vec![
                Span::styled("│ ", border),
                Span::styled(piece.to_string(), Style::default().fg(Color::Green)),
            ]));
        }
    }
    lines.push(Line::from(Span::styled("╰─", border)));
}

/// Word-wrap one line of text to `width` columns. Leading indentation is
/// kept on the first row; words longer than a row are split.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let indent: String = text.chars().take_while(|c| c.is_whitespace()).collect();
    let indent_len = indent.chars().count();

    let mut lines = Vec::new();
    let mut current_line = if indent_len < width { indent } else { String::new() };
    let mut current_len = current_line.chars().count();
    let mut has_word = false;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let sep = usize::from(has_word);

        if current_len + sep + word_len <= width {
            // Word fits on current line
            if has_word {
                current_line.push(' ');
            }
            current_line.push_str(word);
            current_len += sep + word_len;
            has_word = true;
            continue;
        }

        // Word doesn't fit, start new line
        if has_word {
            lines.push(std::mem::take(&mut current_line));
        }
        current_line.clear();

        let mut pieces = split_at_width(word, width);
        let last = pieces.pop().unwrap_or_default();
        lines.extend(pieces.into_iter().map(str::to_string));
        current_line.push_str(last);
        current_len = last.chars().count();
        has_word = true;
    }

    // Don't forget the last line
    if has_word || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Cut `text` into pieces of at most `width` characters.
fn split_at_width(text: &str, width: usize) -> Vec<&str> {
    if width == 0 {
        return vec![text];
    }

    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some((split, _)) = rest.char_indices().nth(width) {
        let (head, tail) = rest.split_at(split);
        pieces.push(head);
        rest = tail;
    }
    pieces.push(rest);
    pieces
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let (title, border_color) = if !app.input_enabled() {
        (" Waiting for reply... ", Color::DarkGray)
    } else if editing {
        (" Message (Enter to send) ", Color::Yellow)
    } else {
        (" Message (i to type) ", Color::DarkGray)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if app.input_enabled() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(visible_text).style(text_style).block(input_block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if editing && app.input_enabled() {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{Backend, MockClient};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App) -> String {
        draw_sized(app, 60, 20)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        App::new(Backend::Mock(MockClient::instant()))
    }

    #[test]
    fn welcome_screen_invites_to_start() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("start chatting"));
    }

    #[test]
    fn code_block_shows_language_header() {
        let mut app = app();
        app.start_chat();
        app.conversation.begin_send("show code").unwrap();
        app.finish_send(Ok("Here:\n```python\nprint(1)\n```".to_string()));
        app.finish_reveals();

        let screen = draw(&mut app);
        assert!(screen.contains("python"));
        assert!(screen.contains("print(1)"));
        assert!(!screen.contains("```"));
    }

    #[test]
    fn error_banner_and_thinking_indicator() {
        let mut app = app();
        app.start_chat();
        app.conversation.begin_send("a").unwrap();
        app.finish_send(Err(parley_core::ChatError::Request("status 502".to_string())));
        app.conversation.begin_send("b").unwrap();
        let screen = draw(&mut app);
        assert!(screen.contains("Thinking"));
        // the banner clears on the next send
        assert!(!screen.contains("status 502"));

        app.finish_send(Err(parley_core::ChatError::Request("status 502".to_string())));
        let screen = draw(&mut app);
        assert!(screen.contains("status 502"));
    }

    #[test]
    fn following_bottom_shows_the_end_of_long_replies() {
        let mut app = app();
        app.start_chat();
        let words = "alpha beta gammadelta epsilonzeta etaa thetaiota kappa lambdamu ";
        for i in 0..6 {
            app.conversation.begin_send(&format!("question {}", i)).unwrap();
            app.finish_send(Ok(format!("{}END{}", words.repeat(3), i)));
        }
        app.finish_reveals();

        let screen = draw_sized(&mut app, 40, 20);
        assert!(screen.contains("END5"), "{}", screen);

        // Nothing lies below the bottom, so scrolling further changes nothing
        app.scroll_down(5);
        let screen = draw_sized(&mut app, 40, 20);
        assert!(screen.contains("END5"), "{}", screen);
    }

    #[test]
    fn long_code_lines_are_cut_into_rows() {
        let mut app = app();
        app.start_chat();
        app.conversation.begin_send("code").unwrap();
        app.finish_send(Ok(format!("```\n{}TAIL\n```", "x".repeat(60))));
        app.finish_reveals();

        let screen = draw_sized(&mut app, 40, 20);
        assert!(screen.contains("TAIL"), "{}", screen);
    }

    #[test]
    fn wrapping_keeps_words_whole() {
        assert_eq!(
            wrap_text_to_width("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text_to_width("  indented text", 20), vec!["  indented text"]);
        assert_eq!(wrap_text_to_width("", 10), vec![""]);
    }

    #[test]
    fn overlong_words_are_split() {
        assert_eq!(
            wrap_text_to_width("ab abcdefghij", 4),
            vec!["ab", "abcd", "efgh", "ij"]
        );
        assert_eq!(split_at_width("héllo", 2), vec!["hé", "ll", "o"]);
    }
}
