use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::feed::Entry;
use crate::fetcher::{FeedSource, FetchError};
use crate::render::Renderer;

const FETCH_STATUS: &str = "Fetching latest Hacker News stories...";
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

pub const FAREWELL: &str = "Thanks for reading! 👋";
pub const INTERRUPTED: &str = "Interrupted! Goodbye! 👋";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    /// 1-based story number as typed
    Story(usize),
    Invalid,
}

impl Command {
    /// Interpret one line of user input. Blank input means quit.
    pub fn parse(input: &str) -> Self {
        let choice = input.trim().to_lowercase();

        match choice.as_str() {
            "" | "q" => Command::Quit,
            "r" => Command::Refresh,
            digits if digits.bytes().all(|b| b.is_ascii_digit()) => {
                // too large to parse is as out of range as any other
                Command::Story(digits.parse().unwrap_or(usize::MAX))
            }
            _ => Command::Invalid,
        }
    }
}

/// One interactive reading session over a feed.
pub struct Session<S, R, W> {
    config: Config,
    source: S,
    renderer: Renderer,
    input: R,
    out: W,
    entries: Vec<Entry>,
}

impl<S, R, W> Session<S, R, W> {
    pub fn new(config: Config, source: S, renderer: Renderer, input: R, out: W) -> Self {
        Self {
            config,
            source,
            renderer,
            input,
            out,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<S, R, W> Session<S, R, W>
where
    S: FeedSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Show the front page, then hand over to the command loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.renderer.clear(&mut self.out)?;
        self.renderer.bell(&mut self.out)?;
        self.renderer.header(&mut self.out)?;

        let entries = self.fetch().await?;
        if entries.is_empty() {
            self.renderer.notice(
                &mut self.out,
                "Failed to fetch stories. Please check your internet connection.",
            )?;
            return Ok(());
        }
        self.entries = entries;

        self.renderer.table(&mut self.out, &self.entries)?;
        self.renderer.summary(&mut self.out, self.entries.len())?;

        self.interact().await
    }

    /// Read and dispatch commands until the user quits.
    pub async fn interact(&mut self) -> anyhow::Result<()> {
        loop {
            self.renderer.menu(&mut self.out)?;
            self.renderer.prompt(&mut self.out)?;

            let line = self.read_line().await?;
            let command = Command::parse(&line);
            debug!(?command, "Dispatching command");

            match command {
                Command::Quit => {
                    self.renderer.farewell(&mut self.out, FAREWELL)?;
                    return Ok(());
                }
                Command::Refresh => self.refresh().await?,
                Command::Story(number) => self.show_story(number)?,
                Command::Invalid => self.renderer.notice(&mut self.out, "Invalid command!")?,
            }
        }
    }

    /// Fetch the feed once. Failures are reported on screen and come back
    /// as an empty list.
    pub async fn fetch(&mut self) -> io::Result<Vec<Entry>> {
        let result = {
            let Self {
                config,
                source,
                renderer,
                out,
                ..
            } = self;
            let request = source.fetch_entries(&config.feed_url);
            with_spinner(renderer, out, FETCH_STATUS, request).await
        };

        match result {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!("Failed to fetch feed '{}': {}", self.config.feed_url, err);
                let message = match &err {
                    FetchError::Http(e) => format!("Error fetching feed: {}", e),
                    FetchError::Parse(_) => "Error parsing feed!".to_string(),
                };
                self.renderer.error(&mut self.out, &message)?;
                Ok(Vec::new())
            }
        }
    }

    async fn refresh(&mut self) -> anyhow::Result<()> {
        self.renderer.clear(&mut self.out)?;

        let fresh = self.fetch().await?;
        if fresh.is_empty() {
            info!("Refresh returned nothing, keeping {} entries", self.entries.len());
        } else {
            self.entries = fresh;
        }

        self.renderer.header(&mut self.out)?;
        self.renderer.table(&mut self.out, &self.entries)?;
        Ok(())
    }

    fn show_story(&mut self, number: usize) -> io::Result<()> {
        let shown = self.entries.len().min(self.renderer.max_rows());

        match number.checked_sub(1).filter(|&idx| idx < shown) {
            Some(idx) => {
                self.renderer.clear(&mut self.out)?;
                self.renderer.details(&mut self.out, &self.entries[idx])
            }
            None => self.renderer.notice(&mut self.out, "Invalid story number!"),
        }
    }

    async fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            // closed stdin reads as the default answer
            writeln!(self.out)?;
            return Ok("q".to_string());
        }
        Ok(line)
    }
}

/// Drive `task` to completion while animating a status line.
async fn with_spinner<W, F>(renderer: &Renderer, out: &mut W, message: &str, task: F) -> F::Output
where
    W: Write,
    F: Future,
{
    tokio::pin!(task);
    let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
    let mut frame = 0;

    loop {
        tokio::select! {
            biased;
            output = &mut task => {
                if let Err(err) = renderer.clear_line(&mut *out) {
                    debug!("Failed to clear status line: {}", err);
                }
                return output;
            }
            _ = ticker.tick() => {
                if let Err(err) = renderer.spinner(&mut *out, frame, message) {
                    debug!("Failed to draw spinner frame {}: {}", frame, err);
                }
                frame += 1;
            }
        }
    }
}
