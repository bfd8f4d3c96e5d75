//! Terminal rendering: the banner, the story table and the story panel.
//!
//! Boxes and tables are ratatui widgets drawn onto a [`Canvas`] and written
//! to a plain `io::Write`, so the session can be driven against a buffer.
//! Styling, OSC 8 hyperlinks and screen control are only emitted when the
//! renderer was built for a terminal.

use std::borrow::Cow;
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{StyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Padding, Paragraph, Row, Table};
use unicode_width::UnicodeWidthStr;

use crate::age::relative_age;
use crate::canvas::Canvas;
use crate::feed::Entry;

const FALLBACK_WIDTH: u16 = 100;
const INDEX_WIDTH: u16 = 4;
const TIME_WIDTH: u16 = 12;
const AUTHOR_WIDTH: u16 = 15;
const MIN_TITLE_WIDTH: u16 = 10;
const ORANGE: Color = Color::Indexed(214);
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

// first content cell inside a bordered panel with one column of padding
const PANEL_LEFT: u16 = 2;
const PANEL_TOP: u16 = 1;

#[derive(Debug, Clone)]
pub struct Renderer {
    width: u16,
    tty: bool,
    max_rows: usize,
}

impl Renderer {
    /// `tty` turns on colours, hyperlinks and screen control. Without it
    /// the output is plain text.
    pub fn new(width: u16, tty: bool, max_rows: usize) -> Self {
        Self {
            width,
            tty,
            max_rows,
        }
    }

    /// Size the layout to the attached terminal.
    pub fn for_terminal(max_rows: usize) -> Self {
        let width = terminal::size()
            .map(|(cols, _)| cols)
            .ok()
            .filter(|&cols| cols > 0)
            .unwrap_or(FALLBACK_WIDTH);

        Self::new(width, io::stdout().is_terminal(), max_rows)
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let flame = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
        let text = Text::from(vec![
            Line::from(vec![
                Span::styled("🔥 ", flame),
                Span::styled(
                    "HACKER NEWS",
                    Style::new().fg(ORANGE).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" 🔥", flame),
            ]),
            Line::styled(
                "Your Terminal RSS Reader",
                Style::new().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let height = text.height() as u16 + 4;
        let block = panel(BorderType::Double, Color::LightYellow).padding(Padding::new(2, 2, 1, 1));

        let mut canvas = Canvas::new(self.width, height);
        canvas.render(Paragraph::new(text).block(block));
        self.draw(out, &canvas)
    }

    /// The story table, capped at `max_rows` entries.
    pub fn table<W: Write>(&self, out: &mut W, entries: &[Entry]) -> io::Result<()> {
        if entries.is_empty() {
            return writeln!(out, "{}", self.paint("No stories found!".dark_yellow()));
        }

        let title_width = self
            .width
            .saturating_sub(2 + INDEX_WIDTH + TIME_WIDTH + AUTHOR_WIDTH + 3)
            .max(MIN_TITLE_WIDTH);
        let title_x = 1 + INDEX_WIDTH + 1;

        let mut links = Vec::new();
        let mut rows = Vec::new();
        // below the top border and the heading row
        let mut y = 2;

        for (idx, entry) in entries.iter().take(self.max_rows).enumerate() {
            let title = wrap(&entry.title, title_width);
            let height = title.len() as u16;
            for (n, line) in title.iter().enumerate() {
                let area = Rect::new(title_x, y + n as u16, line.width() as u16, 1);
                links.push((area, entry.link.as_str()));
            }
            y += height;

            let mut style = Style::new();
            if idx % 2 == 1 {
                style = style.add_modifier(Modifier::DIM);
            }

            rows.push(
                Row::new(vec![
                    Cell::from(Line::from((idx + 1).to_string()).alignment(Alignment::Center))
                        .style(Style::new().fg(Color::Cyan)),
                    Cell::from(Text::from(title.into_iter().map(Line::from).collect::<Vec<_>>()))
                        .style(Style::new().fg(Color::White)),
                    Cell::from(relative_age(entry.published)).style(Style::new().fg(Color::Green)),
                    Cell::from(entry.author.clone()).style(Style::new().fg(Color::Yellow)),
                ])
                .height(height)
                .style(style),
            );
        }

        let heading = Row::new(vec![
            Cell::from(Line::from("#").alignment(Alignment::Center)),
            Cell::from("📰 Title"),
            Cell::from("⏰ Time"),
            Cell::from("👤 Author"),
        ])
        .style(Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD));

        let table = Table::new(
            rows,
            [
                Constraint::Length(INDEX_WIDTH),
                Constraint::Length(title_width),
                Constraint::Length(TIME_WIDTH),
                Constraint::Length(AUTHOR_WIDTH),
            ],
        )
        .header(heading)
        .column_spacing(1)
        .block(panel(BorderType::Rounded, Color::LightBlue));

        let mut canvas = Canvas::new(self.width, y + 1);
        canvas.render(table);
        for (area, url) in links {
            canvas.link(area, url);
        }
        self.draw(out, &canvas)
    }

    /// Full view of a single story.
    pub fn details<W: Write>(&self, out: &mut W, entry: &Entry) -> io::Result<()> {
        let link = Style::new().fg(Color::LightBlue).add_modifier(Modifier::UNDERLINED);
        let mut body = PanelText::new(self.width.saturating_sub(4).max(MIN_TITLE_WIDTH));

        body.blank();
        body.heading(&entry.title);
        body.blank();
        body.field("👤 Author: ", &entry.author, Style::new(), None);
        body.field("⏰ Posted: ", &relative_age(entry.published), Style::new(), None);
        body.field("🔗 Link: ", &entry.link, link, Some(entry.link.as_str()));
        match entry.comments.as_deref() {
            Some(url) => body.field("💬 Comments: ", url, link, Some(url)),
            None => body.field(
                "💬 Comments: ",
                "none",
                Style::new().add_modifier(Modifier::DIM),
                None,
            ),
        }
        body.blank();

        let height = body.lines.len() as u16 + 2;
        let block = panel(BorderType::Double, Color::Cyan).padding(Padding::horizontal(1));

        let mut canvas = Canvas::new(self.width, height);
        canvas.render(Paragraph::new(body.lines).block(block));
        for (area, url) in body.links {
            canvas.link(area, &url);
        }
        self.draw(out, &canvas)
    }

    pub fn summary<W: Write>(&self, out: &mut W, total: usize) -> io::Result<()> {
        let shown = total.min(self.max_rows);
        writeln!(
            out,
            "\n{}",
            self.paint(
                format!("✨ Showing {} latest stories from Hacker News", shown)
                    .bold()
                    .dark_green()
            )
        )?;
        writeln!(
            out,
            "{}\n",
            self.paint("💡 Tip: Click on any title to open the link in your browser!".dim())
        )
    }

    pub fn menu<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n{}", self.paint("Commands:".bold().dark_cyan()))?;
        writeln!(
            out,
            "  • Type a number (1-{}) to view story details",
            self.max_rows
        )?;
        writeln!(out, "  • Type 'r' to refresh")?;
        writeln!(out, "  • Type 'q' to quit")
    }

    pub fn prompt<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "\n{} {}: ",
            self.paint("What would you like to do?".bold().dark_yellow()),
            self.paint("[q]".bold().dark_cyan())
        )?;
        out.flush()
    }

    pub fn error<W: Write>(&self, out: &mut W, message: &str) -> io::Result<()> {
        writeln!(out, "{}", self.paint(message.bold().dark_red()))
    }

    pub fn notice<W: Write>(&self, out: &mut W, message: &str) -> io::Result<()> {
        writeln!(out, "{}", self.paint(message.dark_red()))
    }

    pub fn farewell<W: Write>(&self, out: &mut W, message: &str) -> io::Result<()> {
        writeln!(out, "{}", self.paint(message.bold().dark_green()))
    }

    pub fn clear<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.tty {
            return Ok(());
        }
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        out.flush()
    }

    pub fn bell<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.tty {
            return Ok(());
        }
        write!(out, "\x07")?;
        out.flush()
    }

    pub fn spinner<W: Write>(&self, out: &mut W, frame: usize, message: &str) -> io::Result<()> {
        if !self.tty {
            return Ok(());
        }
        let glyph = SPINNER[frame % SPINNER.len()];
        write!(
            out,
            "\r{} {}",
            glyph.dark_green(),
            message.bold().dark_green()
        )?;
        out.flush()
    }

    pub fn clear_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.tty {
            return Ok(());
        }
        write!(out, "\r")?;
        queue!(out, Clear(ClearType::CurrentLine))?;
        out.flush()
    }

    fn paint<D: Display>(&self, content: StyledContent<D>) -> String {
        if self.tty {
            content.to_string()
        } else {
            content.content().to_string()
        }
    }

    fn draw<W: Write>(&self, out: &mut W, canvas: &Canvas) -> io::Result<()> {
        canvas.write_to(out, self.tty, self.tty)
    }
}

fn panel(border: BorderType, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(border)
        .border_style(Style::new().fg(color))
}

/// Lines of the story panel, with the screen position of every link.
struct PanelText {
    width: u16,
    lines: Vec<Line<'static>>,
    links: Vec<(Rect, String)>,
}

impl PanelText {
    fn new(width: u16) -> Self {
        Self {
            width,
            lines: Vec::new(),
            links: Vec::new(),
        }
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    fn heading(&mut self, text: &str) {
        let style = Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        for chunk in wrap(text, self.width) {
            self.lines.push(Line::styled(chunk, style));
        }
    }

    /// A label followed by a value that wraps under itself.
    fn field(&mut self, label: &'static str, value: &str, style: Style, link: Option<&str>) {
        let indent = label.width() as u16;
        let value_width = self.width.saturating_sub(indent).max(MIN_TITLE_WIDTH);

        for (n, chunk) in wrap(value, value_width).into_iter().enumerate() {
            if let Some(url) = link {
                let y = PANEL_TOP + self.lines.len() as u16;
                let area = Rect::new(PANEL_LEFT + indent, y, chunk.width() as u16, 1);
                self.links.push((area, url.to_string()));
            }

            let lead = if n == 0 {
                Span::styled(label, Style::new().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(" ".repeat(usize::from(indent)))
            };
            self.lines.push(Line::from(vec![lead, Span::styled(chunk, style)]));
        }
    }
}

/// Word wrap to `width` columns. Words longer than a line are split.
pub fn wrap(text: &str, width: u16) -> Vec<String> {
    textwrap::wrap(text, usize::from(width.max(1)))
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

#[cfg(test)]
/// Drop CSI (`ESC [ ... letter`) and OSC (`ESC ] ... ESC \`) sequences.
pub(crate) fn strip_ansi(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('[') => {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    out
}
