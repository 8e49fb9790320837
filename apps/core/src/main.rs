// Aarya console host
// Reads one message per line and prints the companion's reply.

use aarya_core::companion::emergency::EmergencyDetector;
use aarya_core::companion::response::unavailable_reply;
use aarya_core::fs_manager::PortablePathManager;
use aarya_core::preflight::run_preflight_checks;
use aarya_core::{AssistantConfig, Companion, ConversationSession};
use anyhow::Context;
use chrono::Local;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "AARYA_LOG_FORMAT";
const CHART_WIDTH: usize = 30;

fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so they don't interleave with the conversation on stdout.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

enum Command {
    Message(String),
    Reset,
    Journal,
    Chart,
    Export(Option<PathBuf>),
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let mut parts = line.splitn(2, char::is_whitespace);
    match parts.next() {
        Some("/reset") => Command::Reset,
        Some("/journal") => Command::Journal,
        Some("/chart") => Command::Chart,
        Some("/export") => Command::Export(
            parts
                .next()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        ),
        Some("/quit") | Some("/exit") => Command::Quit,
        _ => Command::Message(line.to_string()),
    }
}

fn print_intro(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "🩺 Hello, I’m Aarya. I’m here to listen, calmly and without judgment.")?;
    writeln!(out, "⚠️ I’m not a medical professional. If you are in immediate danger, please contact emergency services.")?;
    writeln!(out, "Commands: /reset /journal /chart /export [dir] /quit")?;
    writeln!(out)
}

fn run_session(companion: &Companion, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    let mut session = ConversationSession::new();
    info!("Session {} started", session.id());

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Reset => {
                session.reset();
                writeln!(out, "🔄 Session reset.")?;
            }
            Command::Journal => {
                let history = session.journal().history();
                if history.is_empty() {
                    writeln!(out, "📅 Your mood journal is empty.")?;
                }
                for record in history {
                    writeln!(out, "📅 {}  {}", record.date, record.label)?;
                }
                if let Some(dominant) = session.journal().dominant() {
                    writeln!(out, "Dominant mood: {}", dominant)?;
                }
            }
            Command::Chart => {
                let chart = session.journal().bar_chart(CHART_WIDTH);
                if chart.is_empty() {
                    writeln!(out, "📊 No moods recorded yet.")?;
                } else {
                    write!(out, "📊 Mood Overview\n{}", chart)?;
                }
            }
            Command::Export(dir) => {
                let dir = dir.unwrap_or_else(PortablePathManager::exports_dir);
                match session.journal().write_export(&dir) {
                    Ok(path) => writeln!(out, "⬇️ Mood history saved to {}", path.display())?,
                    Err(e) => {
                        error!("Export failed: {}", e);
                        writeln!(out, "Export failed: {}", e)?;
                    }
                }
            }
            Command::Message(text) => {
                let today = Local::now().date_naive();
                let outcome = session.handle_turn(companion, &text, today);
                writeln!(out, "[{}]", outcome.summary())?;
                writeln!(out, "🩺 Aarya: {}", outcome.reply)?;
            }
        }
        writeln!(out)?;
        out.flush()?;
    }

    info!("Session {} ended", session.id());
    Ok(())
}

/// Runs when the models could not be loaded: crisis replies only.
fn run_unavailable(input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    let detector = EmergencyDetector::new();
    for line in input.lines() {
        let line = line.context("failed to read input")?;
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            _ => writeln!(out, "🩺 Aarya: {}\n", unavailable_reply(&detector, &line))?,
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_intro(&mut out)?;

    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            writeln!(out, "⚠️ Assistant unavailable: {}\n", e)?;
            return run_unavailable(stdin.lock(), &mut out);
        }
    };

    let preflight = run_preflight_checks(&config);
    let Some(artifacts) = preflight.artifacts else {
        writeln!(out, "⚠️ {}\n", preflight.report.summary)?;
        return run_unavailable(stdin.lock(), &mut out);
    };

    match Companion::from_parts(artifacts, &config) {
        Ok(companion) => run_session(&companion, stdin.lock(), &mut out),
        Err(e) => {
            error!("Failed to build companion: {}", e);
            writeln!(out, "⚠️ Assistant unavailable: {}\n", e)?;
            run_unavailable(stdin.lock(), &mut out)
        }
    }
}
