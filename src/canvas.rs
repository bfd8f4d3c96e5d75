//! Off-screen drawing surface for ratatui widgets.
//!
//! Widgets render into a `Buffer` sized to exactly what they need; the buffer
//! is then written out line by line, so the result scrolls like ordinary
//! terminal output instead of taking over the screen.

use std::io::{self, Write};

use crossterm::style::{Attribute, Color as TermColor, ContentStyle};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

const MODIFIERS: [(Modifier, Attribute); 6] = [
    (Modifier::BOLD, Attribute::Bold),
    (Modifier::DIM, Attribute::Dim),
    (Modifier::ITALIC, Attribute::Italic),
    (Modifier::UNDERLINED, Attribute::Underlined),
    (Modifier::REVERSED, Attribute::Reverse),
    (Modifier::CROSSED_OUT, Attribute::CrossedOut),
];

pub struct Canvas {
    buffer: Buffer,
    links: Vec<(Rect, String)>,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::empty(Rect::new(0, 0, width, height)),
            links: Vec::new(),
        }
    }

    pub fn render<T: Widget>(&mut self, widget: T) {
        let area = self.buffer.area;
        widget.render(area, &mut self.buffer);
    }

    /// Mark `area` as a hyperlink to `url`.
    pub fn link(&mut self, area: Rect, url: &str) {
        if !url.is_empty() && area.width > 0 && area.height > 0 {
            self.links.push((area, url.to_string()));
        }
    }

    fn link_at(&self, x: u16, y: u16) -> Option<&str> {
        self.links
            .iter()
            .find(|(r, _)| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
            .map(|(_, url)| url.as_str())
    }

    /// Write the buffer as text. Without `styled` no escape sequences are
    /// emitted at all.
    pub fn write_to<W: Write>(&self, out: &mut W, styled: bool, hyperlinks: bool) -> io::Result<()> {
        let area = self.buffer.area;

        for y in area.top()..area.bottom() {
            let mut run = String::new();
            let mut run_key: Option<(Style, Option<&str>)> = None;
            let mut hidden = 0;

            for x in area.left()..area.right() {
                // cells covered by the right half of a wide character
                if hidden > 0 {
                    hidden -= 1;
                    continue;
                }

                let cell = &self.buffer[(x, y)];
                let symbol = cell.symbol();
                hidden = symbol.width().saturating_sub(1);

                let link = if hyperlinks { self.link_at(x, y) } else { None };
                let key = (cell.style(), link);

                if run_key != Some(key) {
                    if let Some((style, link)) = run_key {
                        write_run(out, &run, style, link, styled)?;
                    }
                    run.clear();
                    run_key = Some(key);
                }
                run.push_str(symbol);
            }

            if let Some((style, link)) = run_key {
                write_run(out, &run, style, link, styled)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }
}

fn write_run<W: Write>(
    out: &mut W,
    text: &str,
    style: Style,
    link: Option<&str>,
    styled: bool,
) -> io::Result<()> {
    let text = match link {
        Some(url) => format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text),
        None => text.to_string(),
    };

    if styled {
        write!(out, "{}", content_style(style).apply(text))
    } else {
        write!(out, "{}", text)
    }
}

fn content_style(style: Style) -> ContentStyle {
    let mut content = ContentStyle::new();
    content.foreground_color = style.fg.and_then(term_color);
    content.background_color = style.bg.and_then(term_color);
    for (modifier, attribute) in MODIFIERS {
        if style.add_modifier.contains(modifier) {
            content.attributes.set(attribute);
        }
    }
    content
}

fn term_color(color: Color) -> Option<TermColor> {
    let color = match color {
        Color::Reset => return None,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Indexed(i) => TermColor::AnsiValue(i),
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
    };
    Some(color)
}
