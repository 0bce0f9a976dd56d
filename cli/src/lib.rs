//! The `neurodoc` command line client.

mod logging;
pub mod render;
pub mod repl;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use neurodoc_core::ClientConfig;
use neurodoc_core::FilePreferenceStore;
use neurodoc_core::HistoryFile;
use neurodoc_core::HttpBackend;
use neurodoc_core::SearchHistory;
use neurodoc_core::SearchSession;
use neurodoc_core::SessionInit;
use neurodoc_core::UploadFile;
use neurodoc_core::find_data_dir;
use neurodoc_core::i18n;
use neurodoc_protocol::LocaleSelection;
use neurodoc_protocol::Theme;
use render::Palette;
use render::Screen;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Search client for the NeuroDoc document service.
///
/// Without a subcommand, starts an interactive session reading queries from
/// stdin.
#[derive(Debug, Parser)]
#[command(name = "neurodoc", version)]
pub struct Cli {
    /// Search service address, e.g. http://localhost:8000
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Data directory for config, history and logs (defaults to
    /// $NEURODOC_HOME or the platform config directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Interaction language: auto, en, ar or pl. Remembered for later sessions.
    #[arg(long, global = true, value_name = "CODE")]
    pub lang: Option<LocaleSelection>,

    /// Color theme: light or dark. Remembered for later sessions.
    #[arg(long, global = true, value_name = "NAME")]
    pub theme: Option<Theme>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one search and print its results
    Search(SearchArgs),

    /// Upload a document to the service
    Upload(UploadArgs),

    /// List or clear the search history
    History(HistoryArgs),
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search query
    #[arg(value_name = "QUERY", num_args = 1.., trailing_var_arg = true)]
    pub query: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct UploadArgs {
    /// File to upload
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Remove every entry
    #[arg(long)]
    pub clear: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let data_dir = match &cli.home {
        Some(dir) => dir.clone(),
        None => find_data_dir()?,
    };
    let _log_guard = logging::init(&data_dir)?;

    let mut config = ClientConfig::load(&data_dir)
        .with_context(|| format!("failed to load config from {}", data_dir.display()))?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }
    info!(data_dir = %data_dir.display(), base_url = %config.base_url, "starting");

    match cli.command {
        None => {
            let session = open_session(config, &data_dir, cli.lang, cli.theme)?;
            repl::run(session).await
        }
        Some(Command::Search(args)) => {
            let session = open_session(config, &data_dir, cli.lang, cli.theme)?;
            run_search(session, &args.query.join(" ")).await
        }
        Some(Command::Upload(args)) => {
            let session = open_session(config, &data_dir, cli.lang, cli.theme)?;
            run_upload(session, &args.path).await
        }
        Some(Command::History(args)) => run_history(&config, &data_dir, args.clear),
    }
}

fn open_session(
    config: ClientConfig,
    data_dir: &Path,
    lang: Option<LocaleSelection>,
    theme: Option<Theme>,
) -> Result<SearchSession> {
    let backend = HttpBackend::new(&config).context("failed to set up the HTTP client")?;
    let history_file = config
        .persist_history
        .then(|| HistoryFile::new(data_dir.to_path_buf()));
    let mut session = SearchSession::new(SessionInit {
        config,
        backend: Arc::new(backend),
        preferences: Box::new(FilePreferenceStore::new(data_dir.to_path_buf())),
        history_file,
        environment_locale: i18n::environment_locale(),
    });
    if let Some(selection) = lang {
        session.select_locale(selection);
    }
    if let Some(theme) = theme {
        session.set_theme(theme);
    }
    Ok(session)
}

async fn run_search(mut session: SearchSession, query: &str) -> Result<()> {
    let mut screen = Screen::new(Palette::for_stdout(session.theme()));
    let mut stdout = std::io::stdout();

    let ticket = session.search(query);
    if let Ok(ticket) = &ticket {
        screen.search_issued(ticket.generation);
    }
    screen.refresh(&session, &mut stdout)?;
    ticket?;

    while session.is_busy() {
        if !session.step().await {
            break;
        }
        screen.refresh(&session, &mut stdout)?;
    }
    Ok(())
}

/// Upload failures are logged, not reported; the command still succeeds.
async fn run_upload(mut session: SearchSession, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut screen = Screen::new(Palette::for_stdout(session.theme()));
    let mut stdout = std::io::stdout();

    session.upload(Some(file));
    screen.upload_issued();
    while session.is_busy() {
        if !session.step().await {
            break;
        }
        screen.refresh(&session, &mut stdout)?;
    }
    screen.refresh(&session, &mut stdout)?;
    Ok(())
}

fn run_history(config: &ClientConfig, data_dir: &Path, clear: bool) -> Result<()> {
    if !config.persist_history {
        info!("history is not persisted; nothing to list or clear");
        return Ok(());
    }
    let file = HistoryFile::new(data_dir.to_path_buf());
    if clear {
        file.save(&SearchHistory::new())
            .context("failed to clear history")?;
        return Ok(());
    }
    let history = file.load().context("failed to read history")?;
    let mut stdout = std::io::stdout();
    for query in history.entries() {
        writeln!(stdout, "{query}")?;
    }
    Ok(())
}
