//! Terminal rendering of session state.

use neurodoc_core::SearchHistory;
use neurodoc_core::SearchPhase;
use neurodoc_core::SearchSession;
use neurodoc_core::TextBundle;
use neurodoc_protocol::Locale;
use neurodoc_protocol::SearchResult;
use neurodoc_protocol::Theme;
use owo_colors::OwoColorize;
use owo_colors::Style;
use std::io;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
    title: Style,
    link: Style,
    muted: Style,
    warning: Style,
    response: Style,
}

impl Palette {
    pub fn new(theme: Theme, color: bool) -> Self {
        match theme {
            Theme::Light => Self {
                color,
                title: Style::new().blue().bold(),
                link: Style::new().cyan().underline(),
                muted: Style::new().dimmed(),
                warning: Style::new().yellow().bold(),
                response: Style::new().green(),
            },
            Theme::Dark => Self {
                color,
                title: Style::new().bright_blue().bold(),
                link: Style::new().bright_cyan().underline(),
                muted: Style::new().bright_black(),
                warning: Style::new().bright_yellow().bold(),
                response: Style::new().bright_green(),
            },
        }
    }

    /// Colors only when stdout is a terminal that supports them.
    pub fn for_stdout(theme: Theme) -> Self {
        let color = supports_color::on_cached(supports_color::Stream::Stdout).is_some();
        Self::new(theme, color)
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn format_results(palette: &Palette, results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (index, result) in results.iter().enumerate() {
        let title = result.title().or(result.href()).unwrap_or("(untitled)");
        out.push_str(&format!(
            "{}. {}\n",
            index + 1,
            palette.paint(title, palette.title)
        ));
        if let Some(meta) = result.meta() {
            out.push_str(&format!("   {}\n", palette.paint(meta, palette.muted)));
        }
        if let Some(snippet) = result.snippet() {
            out.push_str(&format!("   {snippet}\n"));
        }
        if let Some(href) = result.href() {
            out.push_str(&format!("   {}\n", palette.paint(href, palette.link)));
        }
    }
    out
}

/// Most recent first, numbered from 1 as accepted by `:replay` and `:forget`.
pub fn format_history(palette: &Palette, texts: &TextBundle, history: &SearchHistory) -> String {
    let mut out = format!("{}\n", palette.paint(texts.history, palette.title));
    for (index, query) in history.entries().iter().enumerate() {
        out.push_str(&format!("  {:>2}. {query}\n", index + 1));
    }
    out
}

pub fn format_notice(palette: &Palette, message: &str) -> String {
    palette.paint(message, palette.warning)
}

pub fn format_upload(palette: &Palette, texts: &TextBundle, file_name: &str) -> String {
    format!(
        "{}: {file_name}",
        palette.paint(texts.uploaded_file, palette.muted)
    )
}

/// Starts a line in the locale's writing direction. Right-to-left text gets a
/// leading RIGHT-TO-LEFT MARK so terminals with bidi support align it.
fn line_start(locale: Locale) -> &'static str {
    if locale.is_rtl() { "\u{200f}" } else { "" }
}

pub const HELP: &str = "\
Type a query and press enter to search. Commands:
  :clear            clear the input and the shown response
  :history          list recent searches
  :replay N         search history entry N again
  :forget N         remove history entry N
  :clear-history    remove every history entry
  :upload PATH      upload a document
  :lang CODE        auto, en, ar or pl (no argument lists them)
  :theme NAME       light or dark (no argument toggles)
  :filter JSON      filters for the next search, e.g. {\"sort\":\"date\"}
  :copy             print the shown response
  :help             show this help
  :quit             leave";

/// Tracks what was already written for a session so that each refresh only
/// prints what changed since the previous one.
#[derive(Debug)]
pub struct Screen {
    palette: Palette,
    locale: Locale,
    echoed: String,
    line_open: bool,
    last_notice: Option<u64>,
    pending_search: Option<u64>,
    shown_upload: Option<String>,
}

impl Screen {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            locale: Locale::DEFAULT,
            echoed: String::new(),
            line_open: false,
            last_notice: None,
            pending_search: None,
            shown_upload: None,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Results of this search are printed once it settles.
    pub fn search_issued(&mut self, generation: u64) {
        self.pending_search = Some(generation);
    }

    /// The next upload annotation is printed even if it names the same file.
    pub fn upload_issued(&mut self) {
        self.shown_upload = None;
    }

    pub fn refresh(&mut self, session: &SearchSession, out: &mut impl Write) -> io::Result<()> {
        self.locale = session.active_locale();

        if let Some(file_name) = self.upload_to_show(session.loading(), session.uploaded_file()) {
            self.close_line(out)?;
            writeln!(
                out,
                "{}",
                format_upload(&self.palette, session.texts(), &file_name)
            )?;
        }
        if let Some(notice) = session.notification()
            && self.last_notice != Some(notice.id)
        {
            self.close_line(out)?;
            writeln!(out, "{}", format_notice(&self.palette, &notice.message))?;
            self.last_notice = Some(notice.id);
        }

        if self.pending_search.is_some() && session.phase() != SearchPhase::Searching {
            self.pending_search = None;
            if !session.results().is_empty() {
                self.close_line(out)?;
                write!(out, "{}", format_results(&self.palette, session.results()))?;
            }
        }

        self.echo_reveal(session.displayed(), out)?;
        if !session.is_busy() {
            self.close_line(out)?;
        }
        out.flush()
    }

    /// The annotation is shown once nothing is loading, and forgotten as soon
    /// as the session clears it.
    fn upload_to_show(&mut self, loading: bool, uploaded: Option<&str>) -> Option<String> {
        let Some(file_name) = uploaded else {
            self.shown_upload = None;
            return None;
        };
        if loading || self.shown_upload.as_deref() == Some(file_name) {
            return None;
        }
        self.shown_upload = Some(file_name.to_string());
        self.shown_upload.clone()
    }

    /// Writes the newly revealed suffix of `displayed`, or starts over on a
    /// fresh line when it no longer extends what was written.
    fn echo_reveal(&mut self, displayed: &str, out: &mut impl Write) -> io::Result<()> {
        match displayed.strip_prefix(self.echoed.as_str()) {
            Some("") => {}
            Some(fresh) => {
                if !self.line_open {
                    write!(out, "{}", line_start(self.locale))?;
                }
                write!(out, "{}", self.palette.paint(fresh, self.palette.response))?;
                self.echoed.push_str(fresh);
                self.line_open = true;
            }
            None => {
                self.close_line(out)?;
                self.echoed.clear();
                if !displayed.is_empty() {
                    write!(out, "{}", line_start(self.locale))?;
                    write!(out, "{}", self.palette.paint(displayed, self.palette.response))?;
                    self.echoed.push_str(displayed);
                    self.line_open = true;
                }
            }
        }
        Ok(())
    }

    /// Ends a partially written reveal line.
    pub fn close_line(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.line_open {
            writeln!(out)?;
            self.line_open = false;
        }
        Ok(())
    }
}
