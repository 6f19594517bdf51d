use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use kbchat_core::state::LOADING_TEXT;
use kbchat_core::{ChatMessage, ChatRole, ConversationLog, LogEntry};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, Focus};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Split a word into pieces no wider than `width` terminal cells. Every
/// piece holds at least one character.
fn split_long_word(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for c in word.chars() {
        let w = char_width(c);
        if current_width + w > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

/// Split text into alternating runs of whitespace and non-whitespace.
fn tokenize(text: &str, style: Style) -> Vec<(String, Style)> {
    let mut tokens: Vec<(String, Style)> = Vec::new();
    let mut current = String::new();
    let mut in_space = false;

    for c in text.chars() {
        let is_space = c.is_whitespace();
        if is_space != in_space && !current.is_empty() {
            tokens.push((std::mem::take(&mut current), style));
        }
        in_space = is_space;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push((current, style));
    }

    tokens
}

fn is_gap(token: &str) -> bool {
    token.chars().all(char::is_whitespace)
}

/// Wrap styled tokens to fit within a given width, measured in terminal
/// cells. Whitespace runs are kept as written, except where a line breaks:
/// there the gap is dropped. Only words wider than a whole line are broken.
/// The caller gets exact line counts, which keeps the tail in view.
fn wrap_tokens(tokens: &[(String, Style)], width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;
    let mut gap: Option<(String, Style)> = None;

    for (token, style) in tokens {
        if is_gap(token) {
            match gap.as_mut() {
                Some((pending, _)) => pending.push_str(token),
                None => gap = Some((token.clone(), *style)),
            }
            continue;
        }

        for piece in split_long_word(token, width) {
            let piece_width = piece.width();
            let gap_width = gap.as_ref().map_or(0, |(g, _)| g.width());

            if current_width > 0 && current_width + gap_width + piece_width > width {
                // Doesn't fit, start new line
                lines.push(Line::from(std::mem::take(&mut spans)));
                current_width = 0;
                gap = None;
            } else if current_width == 0 && gap_width + piece_width > width {
                // Indentation wider than the pane
                gap = None;
            }

            if let Some((g, gap_style)) = gap.take() {
                current_width += g.width();
                spans.push(Span::styled(g, gap_style));
            }
            current_width += piece_width;
            spans.push(Span::styled(piece, *style));
        }
    }

    if !spans.is_empty() || lines.is_empty() {
        lines.push(Line::from(spans));
    }

    lines
}

fn label_style(role: ChatRole) -> Style {
    let color = match role {
        ChatRole::User => Color::Cyan,
        ChatRole::Assistant => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Lines for one message: bold label, the literal text, then the timestamp.
fn message_lines(msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
    let paragraphs: Vec<&str> = msg.content.split('\n').collect();
    let last = paragraphs.len() - 1;
    let mut lines = Vec::new();

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let mut tokens: Vec<(String, Style)> = Vec::new();
        if i == 0 {
            tokens.push((msg.role.label().to_string(), label_style(msg.role)));
            tokens.push((" ".to_string(), Style::default()));
        }
        tokens.extend(tokenize(paragraph, Style::default()));
        if i == last {
            if !tokens.last().is_some_and(|(t, _)| is_gap(t)) {
                tokens.push((" ".to_string(), Style::default()));
            }
            tokens.push((
                format!("[{}]", msg.timestamp),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.extend(wrap_tokens(&tokens, width));
    }

    lines
}

/// Visible slice of the input field and the cursor column within it, both
/// in terminal cells. Scrolls just far enough to keep the cursor in view.
fn input_viewport(value: &str, cursor: usize, inner_width: usize) -> (String, usize) {
    let chars: Vec<char> = value.chars().collect();
    let cursor = cursor.min(chars.len());

    let mut start = 0;
    let mut cursor_x: usize = chars[..cursor].iter().map(|c| char_width(*c)).sum();
    while start < cursor && cursor_x >= inner_width {
        cursor_x -= char_width(chars[start]);
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for c in &chars[start..] {
        let w = char_width(*c);
        if used + w > inner_width {
            break;
        }
        visible.push(*c);
        used += w;
    }

    (visible, cursor_x)
}

fn loading_line(animation_frame: usize) -> Line<'static> {
    let spinner = SPINNER_FRAMES[animation_frame % SPINNER_FRAMES.len()];
    Line::from(vec![
        Span::styled(spinner, Style::default().fg(Color::Magenta)),
        Span::styled(
            format!(" {}", LOADING_TEXT),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ])
}

fn conversation_lines(log: &ConversationLog, width: usize, animation_frame: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in log.entries() {
        match entry {
            LogEntry::Message(msg) => {
                lines.extend(message_lines(msg, width));
                lines.push(Line::default());
            }
            LogEntry::Loading => lines.push(loading_line(animation_frame)),
        }
    }
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, controls, footer
    let [header_area, chat_area, controls_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_controls(app, frame, controls_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" kbchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.server_url.clone(), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.areas.chat = Some(area);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);

    let endpoint = app.controller.selector().endpoint();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat: {} ", endpoint.display_name()));

    let log = app.controller.log_mut();
    let text = if log.is_empty() {
        log.resolve_scroll(0, inner_height);
        Text::from(Span::styled(
            "Type a message, then Tab to Send and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let lines = conversation_lines(log, inner_width, app.animation_frame);
        let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        log.resolve_scroll(total, inner_height);
        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .scroll((app.controller.log().scroll(), 0));

    frame.render_widget(chat, area);
}

fn focus_color(focused: bool) -> Color {
    if focused { Color::Yellow } else { Color::DarkGray }
}

fn render_controls(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, endpoint_area, send_area, clear_area] = Layout::horizontal([
        Constraint::Min(10),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(9),
    ])
    .areas(area);

    app.areas.input = Some(input_area);
    app.areas.endpoint = Some(endpoint_area);
    app.areas.send = Some(send_area);
    app.areas.clear = Some(clear_area);

    render_input(app, frame, input_area);

    // Endpoint selector
    let endpoint_focused = app.focus == Focus::Endpoint;
    let selector = Paragraph::new(format!("< {} >", app.controller.selector().value()))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(focus_color(endpoint_focused)))
                .title(" Endpoint "),
        );
    frame.render_widget(selector, endpoint_area);

    render_button(frame, send_area, "Send", app.focus == Focus::Send);
    render_button(frame, clear_area, "Clear", app.focus == Focus::Clear);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Input;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(focus_color(focused)))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let input = app.controller.input();
    let (visible_text, cursor_x) = input_viewport(input.value(), input.cursor(), inner_width);

    let paragraph = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(paragraph, area);

    if focused {
        let cursor_x = u16::try_from(cursor_x).unwrap_or(u16::MAX);
        frame.set_cursor_position((area.x.saturating_add(cursor_x + 1), area.y + 1));
    }
}

fn render_button(frame: &mut Frame, area: Rect, label: &str, focused: bool) {
    let style = if focused {
        Style::default().bg(Color::Yellow).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let button = Paragraph::new(Span::styled(format!(" {} ", label), style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(focus_color(focused))),
        );
    frame.render_widget(button, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.focus {
        Focus::Input => vec![
            Span::styled(" type ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" next ", label_style),
        ],
        Focus::Endpoint => vec![
            Span::styled(" ←/→ ", key_style),
            Span::styled(" change ", label_style),
            Span::styled(
                format!(" {} ", app.controller.selector().endpoint().description()),
                Style::default().fg(Color::DarkGray),
            ),
        ],
        Focus::Send => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ],
        Focus::Clear => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" clear chat ", label_style),
        ],
    };
    hints.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::{backend::TestBackend, Terminal};

    fn msg(role: ChatRole, text: &str) -> ChatMessage {
        ChatMessage::with_timestamp(role, text, "9:41:00 AM".to_string())
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn plain(text: &str) -> Vec<(String, Style)> {
        tokenize(text, Style::default())
    }

    #[test]
    fn test_wrap_tokens_respects_width() {
        let lines = wrap_tokens(&plain("the quick brown fox jumps"), 10);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_tokens_splits_long_words() {
        let texts: Vec<String> = wrap_tokens(&plain("abcdefghij"), 4).iter().map(line_text).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_tokens_measures_wide_chars_in_cells() {
        let lines = wrap_tokens(&plain("一二三四五六七八九十壹贰"), 10);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["一二三四五", "六七八九十", "壹贰"]);
        for line in &lines {
            assert!(line.width() <= 10, "{:?} is wider than the pane", line_text(line));
        }
    }

    #[test]
    fn test_wrap_tokens_keeps_inner_whitespace() {
        let texts: Vec<String> = wrap_tokens(&plain("a    b"), 20).iter().map(line_text).collect();
        assert_eq!(texts, vec!["a    b"]);
    }

    #[test]
    fn test_message_lines_keep_indentation() {
        let lines = message_lines(&msg(ChatRole::Assistant, "fn main() {\n    body();\n}"), 80);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["Chatbot: fn main() {", "    body();", "} [9:41:00 AM]"]);

        let lines = message_lines(&msg(ChatRole::Assistant, "if x {\n\treturn;\n}"), 80);
        assert_eq!(line_text(&lines[1]), "    return;");
    }

    #[test]
    fn test_message_lines_fit_narrow_pane() {
        let lines = message_lines(&msg(ChatRole::User, "汉字 mixed with ascii 漢字漢字漢字"), 12);
        for line in &lines {
            assert!(line.width() <= 12, "{:?} is wider than the pane", line_text(line));
        }
    }

    #[test]
    fn test_input_viewport_ascii() {
        assert_eq!(input_viewport("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(input_viewport("abcdefghij", 10, 4), ("hij".to_string(), 3));
        assert_eq!(input_viewport("abcdefghij", 0, 4), ("abcd".to_string(), 0));
    }

    #[test]
    fn test_input_viewport_wide_chars() {
        assert_eq!(input_viewport("一二三四五", 5, 6), ("四五".to_string(), 4));
        assert_eq!(input_viewport("一二三四五", 1, 6), ("一二三".to_string(), 2));
    }

    #[test]
    fn test_message_lines_label_and_timestamp() {
        let lines = message_lines(&msg(ChatRole::Assistant, "hello there"), 80);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Chatbot: hello there [9:41:00 AM]");

        let label = &lines[0].spans[0];
        assert_eq!(label.content, "Chatbot:");
        assert!(label.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_message_lines_keep_markup_literal() {
        let lines = message_lines(&msg(ChatRole::User, "<b>hi</b> **there**"), 80);
        assert_eq!(line_text(&lines[0]), "User: <b>hi</b> **there** [9:41:00 AM]");
        assert!(!lines[0].spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_multiline_message_puts_timestamp_last() {
        let lines = message_lines(&msg(ChatRole::Assistant, "Source 1\n\nbody"), 80);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["Chatbot: Source 1", "", "body [9:41:00 AM]"]);
    }

    #[test]
    fn test_render_shows_conversation_and_indicator() {
        let mut app = test_app();
        app.controller.display_message(ChatRole::User, "question");
        app.controller.display_message(ChatRole::Assistant, "answer");
        app.controller.show_loading_indicator();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("User: question"));
        assert!(screen.contains("Chatbot: answer"));
        assert!(screen.contains(LOADING_TEXT));
        assert!(screen.contains("Send"));
        assert!(screen.contains("Clear"));
        assert!(app.areas.send.is_some());
    }

    #[test]
    fn test_render_keeps_newest_message_visible() {
        let mut app = test_app();
        for i in 0..30 {
            app.controller
                .display_message(ChatRole::Assistant, &format!("reply number {}", i));
        }

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("reply number 29"));
        assert!(!screen.contains("reply number 0 "));
        assert!(app.controller.log().follows_tail());
    }

    #[test]
    fn test_render_shows_every_wide_char() {
        let mut app = test_app();
        app.controller
            .display_message(ChatRole::Assistant, "一二三四五六七八九十壹贰");

        let mut terminal = Terminal::new(TestBackend::new(20, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        for c in "一二三四五六七八九十壹贰".chars() {
            assert!(screen.contains(c), "{} missing from\n{}", c, screen);
        }
    }
}
