//! Line-oriented interactive session.
//!
//! Input lines and session events are multiplexed on one task, so a search
//! keeps revealing while the user types the next query.

use crate::render::HELP;
use crate::render::Palette;
use crate::render::Screen;
use crate::render::format_history;
use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use neurodoc_core::SearchSession;
use neurodoc_core::UploadFile;
use neurodoc_protocol::FilterSpec;
use neurodoc_protocol::LocaleSelection;
use neurodoc_protocol::Theme;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Search(String),
    Clear,
    History,
    Replay(usize),
    Forget(usize),
    ClearHistory,
    Upload(PathBuf),
    Lang(Option<LocaleSelection>),
    Theme(Option<Theme>),
    Filter(FilterSpec),
    Copy,
    Help,
    Quit,
}

/// Lines starting with `:` are commands; anything else is a query, blank
/// lines included.
pub fn parse_line(line: &str) -> Result<ReplCommand> {
    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Ok(ReplCommand::Search(line.to_string()));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim_end(), ""),
    };

    let parsed = match name {
        "clear" => ReplCommand::Clear,
        "history" => ReplCommand::History,
        "replay" => ReplCommand::Replay(parse_index(arg)?),
        "forget" => ReplCommand::Forget(parse_index(arg)?),
        "clear-history" => ReplCommand::ClearHistory,
        "upload" if arg.is_empty() => bail!("usage: :upload PATH"),
        "upload" => ReplCommand::Upload(PathBuf::from(arg)),
        "lang" if arg.is_empty() => ReplCommand::Lang(None),
        "lang" => ReplCommand::Lang(Some(arg.parse()?)),
        "theme" if arg.is_empty() => ReplCommand::Theme(None),
        "theme" => ReplCommand::Theme(Some(
            arg.parse()
                .map_err(|_| anyhow!("unknown theme `{arg}`; expected light or dark"))?,
        )),
        "filter" => ReplCommand::Filter(
            serde_json::from_str(arg).context("filters must be a JSON object")?,
        ),
        "copy" => ReplCommand::Copy,
        "help" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => bail!("unknown command `:{other}`; try :help"),
    };
    Ok(parsed)
}

/// History entries are numbered from 1.
fn parse_index(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index - 1),
        _ => bail!("expected a history number, got `{arg}`"),
    }
}

pub async fn run(mut session: SearchSession) -> Result<()> {
    let mut screen = Screen::new(Palette::for_stdout(session.theme()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    writeln!(stdout, "{} (:help)", session.texts().placeholder)?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(ReplCommand::Quit) => {
                        screen.refresh(&session, &mut stdout)?;
                        return Ok(());
                    }
                    Ok(command) => {
                        screen.close_line(&mut stdout)?;
                        if let Err(err) = execute(&mut session, &mut screen, command, &mut stdout).await {
                            writeln!(stdout, "{err:#}")?;
                        }
                    }
                    Err(err) => {
                        screen.close_line(&mut stdout)?;
                        writeln!(stdout, "{err:#}")?;
                    }
                }
            }
            Some(event) = session.next_event() => {
                session.handle_event(event);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
        screen.refresh(&session, &mut stdout)?;
    }

    // Input ended; let outstanding work finish before leaving.
    while session.is_busy() {
        if !session.step().await {
            break;
        }
        screen.refresh(&session, &mut stdout)?;
    }
    screen.refresh(&session, &mut stdout)?;
    Ok(())
}

async fn execute(
    session: &mut SearchSession,
    screen: &mut Screen,
    command: ReplCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        ReplCommand::Search(query) => {
            session.set_input(query);
            // A rejected query posts its notice; the next refresh prints it.
            if let Ok(ticket) = session.submit_input() {
                screen.search_issued(ticket.generation);
            }
        }
        ReplCommand::Clear => session.clear_input(),
        ReplCommand::History => {
            write!(
                out,
                "{}",
                format_history(screen.palette(), session.texts(), session.history())
            )?;
        }
        ReplCommand::Replay(index) => {
            let query = history_entry(session, index)?;
            if let Ok(ticket) = session.replay_history(&query) {
                screen.search_issued(ticket.generation);
            }
        }
        ReplCommand::Forget(index) => {
            let query = history_entry(session, index)?;
            session.remove_history(&query);
        }
        ReplCommand::ClearHistory => session.clear_history(),
        ReplCommand::Upload(path) => {
            let file = UploadFile::from_path(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            session.upload(Some(file));
            screen.upload_issued();
        }
        ReplCommand::Lang(None) => {
            let current = session.locale_selection();
            for choice in LocaleSelection::choices() {
                let marker = if choice == current { '*' } else { ' ' };
                let code = choice.to_string();
                writeln!(out, "{marker} {code:<5} {}", choice.label())?;
            }
        }
        ReplCommand::Lang(Some(selection)) => {
            session.select_locale(selection);
            writeln!(out, "{}", session.texts().placeholder)?;
        }
        ReplCommand::Theme(theme) => {
            let theme = theme.unwrap_or_else(|| session.theme().toggled());
            session.set_theme(theme);
            screen.set_palette(Palette::for_stdout(theme));
            let label = match theme {
                Theme::Light => session.texts().theme_light,
                Theme::Dark => session.texts().theme_dark,
            };
            writeln!(out, "{label}")?;
        }
        ReplCommand::Filter(filters) => {
            if let Some(Ok(ticket)) = session.apply_filters(filters) {
                screen.search_issued(ticket.generation);
            }
        }
        ReplCommand::Copy => writeln!(out, "{}", session.displayed())?,
        ReplCommand::Help => writeln!(out, "{HELP}")?,
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn history_entry(session: &SearchSession, index: usize) -> Result<String> {
    session
        .history()
        .get(index)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no history entry {}", index + 1))
}
