use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use crossterm::style::{StyledContent, Stylize};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newscat::config::Config;
use newscat::fetcher::Fetcher;
use newscat::render::Renderer;
use newscat::session::{Session, INTERRUPTED};

fn main() -> anyhow::Result<()> {
    // Initialize logging; stderr keeps diagnostics out of the UI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newscat=error".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(Config::default()));

    // An interrupted session can leave a stdin read parked on a blocking
    // thread; don't wait for it.
    runtime.shutdown_background();

    if let Err(e) = result {
        error!("Session failed: {:#}", e);
        println!("{}", styled(format!("An error occurred: {}", e).bold().dark_red()));
    }

    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting session for {}", config.feed_url);

    let fetcher = Fetcher::new(&config)?;
    let renderer = Renderer::for_terminal(config.max_stories);
    let input = BufReader::new(tokio::io::stdin());
    let mut session = Session::new(config, fetcher, renderer, input, io::stdout());

    tokio::select! {
        result = session.run() => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupted by user");
            let mut stdout = io::stdout();
            writeln!(stdout, "\n{}", styled(INTERRUPTED.bold().dark_yellow()))?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Plain text unless stdout is a terminal.
fn styled<D: Display>(content: StyledContent<D>) -> String {
    if io::stdout().is_terminal() {
        content.to_string()
    } else {
        content.content().to_string()
    }
}
