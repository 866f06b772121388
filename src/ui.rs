use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, CopyLabel};
use crate::render::{render_message, DisplaySegment};
use crate::store::{ChatEntry, Sender};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // The input box grows with the message, up to four lines.
    let input_lines = app.input.split('\n').count().clamp(1, 4) as u16;
    let [chat_area, input_area, help_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_chat(frame, app, chat_area);
    draw_input(frame, app, input_area);
    draw_help(frame, help_area);
}

fn draw_chat(frame: &mut Frame, app: &mut App, area: Rect) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut block_index = 0usize;

    for entry in app.log.entries() {
        entry_lines(entry, app.selected_block, app.copy_label, &mut block_index, &mut lines);
        lines.push(Line::default());
    }

    if app.is_generating() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Generating{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // The paragraph's scroll offset applies to post-wrap rows, so wrap the
    // lines to the inner width here; the row count and the bottom are then
    // exact, not estimates.
    let lines = wrap_lines(lines, area.width.saturating_sub(2) as usize);

    // Appends re-engage follow-to-bottom; manual scrolling disengages it.
    if app.log.take_scroll_signal() {
        app.follow_bottom = true;
    }
    app.total_chat_lines = lines.len() as u16;
    app.chat_height = area.height.saturating_sub(2);
    if app.follow_bottom {
        app.chat_scroll = app.max_chat_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Monad assistant ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Hard-wrap styled lines to `width` characters, splitting spans as needed.
/// Empty lines survive as single blank rows.
fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    let mut wrapped = Vec::new();
    for line in lines {
        let mut current: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;
        for span in line.spans {
            let style = span.style;
            let mut chunk = String::new();
            for c in span.content.chars() {
                if used == width {
                    if !chunk.is_empty() {
                        current.push(Span::styled(std::mem::take(&mut chunk), style));
                    }
                    wrapped.push(Line::from(std::mem::take(&mut current)));
                    used = 0;
                }
                chunk.push(c);
                used += 1;
            }
            if !chunk.is_empty() {
                current.push(Span::styled(chunk, style));
            }
        }
        wrapped.push(Line::from(current));
    }
    wrapped
}

/// Render one entry: a sender header, then its display segments. Plain text
/// and emoji flow inline; code blocks break out into framed lines.
fn entry_lines(
    entry: &ChatEntry,
    selected_block: Option<usize>,
    copy_label: CopyLabel,
    block_index: &mut usize,
    lines: &mut Vec<Line<'static>>,
) {
    let (header, header_color, body_style) = match entry.sender {
        Sender::User => ("You:", Color::Cyan, Style::default()),
        Sender::Bot => ("Assistant:", Color::Yellow, Style::default()),
        Sender::Error => ("Assistant:", Color::Red, Style::default().fg(Color::Red)),
    };
    lines.push(Line::from(Span::styled(
        header,
        Style::default().fg(header_color).add_modifier(Modifier::BOLD),
    )));

    let mut current: Vec<Span<'static>> = Vec::new();
    for segment in render_message(&entry.text) {
        match segment {
            DisplaySegment::PlainText(text) => {
                for (i, piece) in text.split('\n').enumerate() {
                    if i > 0 {
                        lines.push(Line::from(std::mem::take(&mut current)));
                    }
                    if !piece.is_empty() {
                        current.push(Span::styled(piece.to_string(), body_style));
                    }
                }
            }
            DisplaySegment::Emoji { shortcode, .. } => {
                current.push(Span::styled(
                    emoji_glyph(&shortcode).to_string(),
                    Style::default().fg(Color::Magenta),
                ));
            }
            DisplaySegment::CodeBlock { language, code } => {
                if !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                let selected = selected_block == Some(*block_index);
                code_block_lines(&language, &code, selected, copy_label, lines);
                *block_index += 1;
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
}

fn code_block_lines(
    language: &str,
    code: &str,
    selected: bool,
    copy_label: CopyLabel,
    lines: &mut Vec<Line<'static>>,
) {
    let frame_style = Style::default().fg(Color::DarkGray);
    let label_style = if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        frame_style
    };
    // The copy label flips to "Copied" on the selected block for a second
    // after a copy.
    let label = if selected { copy_label.text() } else { "copy" };

    lines.push(Line::from(vec![
        Span::styled(format!("┌ {} ", language), frame_style),
        Span::styled(format!(" {} ", label), label_style),
    ]));
    if code.is_empty() {
        lines.push(Line::from(Span::styled("│", frame_style)));
    } else {
        for code_line in code.lines() {
            lines.push(Line::from(vec![
                Span::styled("│ ", frame_style),
                Span::styled(code_line.to_string(), Style::default().fg(Color::Green)),
            ]));
        }
    }
    lines.push(Line::from(Span::styled("└─", frame_style)));
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.is_generating() {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let title = if app.is_generating() {
        " Generating... "
    } else {
        " Message the Monad assistant "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Cursor row from newlines before the cursor, column from the chars
    // since the last newline.
    let before: String = app.input.chars().take(app.input_cursor).collect();
    let row = before.matches('\n').count() as u16;
    let col = before.chars().rev().take_while(|c| *c != '\n').count() as u16;
    let max_col = area.width.saturating_sub(2).saturating_sub(1);
    let max_row = area.height.saturating_sub(2).saturating_sub(1);
    frame.set_cursor_position((
        area.x + 1 + col.min(max_col),
        area.y + 1 + row.min(max_row),
    ));
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "Enter send | Shift+Enter newline | Ctrl+L clear | Tab select code | Ctrl+Y copy | Esc quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}

/// Terminal stand-ins for the bundled emoji images.
fn emoji_glyph(shortcode: &str) -> &'static str {
    match shortcode {
        ":monshroom:" => "🍄",
        ":pepesunglasses:" => "😎",
        ":molandak:" => "🦔",
        ":alarm_purple:" => "⏰",
        ":pepe_monad:" => "🐸",
        _ => "❔",
    }
}
