//! Terminal rendering for the catalog screen.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

use filmdesk_core::types::Movie;
use filmdesk_core::util::ellipsize;
use filmdesk_core::view::{ListView, Notification, NotificationKind, ViewRenderer};

const CAST_WIDTH: usize = 72;

/// Draws list states and notifications on stdout/stderr.
#[derive(Default)]
pub struct TerminalRenderer {
    spinner: Option<ProgressBar>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl ViewRenderer for TerminalRenderer {
    fn render_list(&mut self, view: &ListView) {
        match view {
            ListView::Loading => {
                if self.spinner.is_none() {
                    self.spinner = Some(spinner("Loading movies..."));
                }
            }
            ListView::Populated(movies) => {
                self.stop_spinner();
                for movie in movies {
                    print_movie(movie);
                }
            }
            ListView::Empty => {
                self.stop_spinner();
                println!("{}", "No movies yet".bold());
                println!("Add the first one with `filmdesk add`.");
            }
            ListView::Error(_) => self.stop_spinner(),
        }
    }

    fn render_notification(&mut self, notification: &Notification) {
        self.stop_spinner();
        notify(notification);
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn notify(notification: &Notification) {
    match notification.kind {
        NotificationKind::Success => println!("{} {}", "✔".green(), notification.message),
        NotificationKind::Error => eprintln!("{} {}", "✖".red(), notification.message.as_str().red()),
    }
}

pub fn print_movie(movie: &Movie) {
    println!(
        "{} {} ({})",
        format!("#{}", movie.id).dim(),
        movie.title.as_str().bold(),
        movie.release_year
    );
    println!("    {} · {}", movie.genre, movie.director);
    println!("    Cast: {}", ellipsize(&movie.cast_display(), CAST_WIDTH));
}

/// Ask for a line of input, returning it trimmed of the newline.
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Yes/no question defaulting to no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Ask for a secret without echoing it. Falls back to a plain line read when
/// stdin is not a terminal, e.g. a piped password.
pub fn prompt_secret(label: &str) -> io::Result<String> {
    if !io::stdin().is_terminal() {
        return prompt(label);
    }

    print!("{label}: ");
    io::stdout().flush()?;

    terminal::enable_raw_mode()?;
    let secret = read_secret();
    let restored = terminal::disable_raw_mode();
    println!();

    let secret = secret?;
    restored?;
    Ok(secret)
}

fn read_secret() -> io::Result<String> {
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match secret_key(&mut secret, key) {
                SecretInput::Pending => {}
                SecretInput::Done => return Ok(secret),
                SecretInput::Cancelled => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"))
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SecretInput {
    Pending,
    Done,
    Cancelled,
}

fn secret_key(secret: &mut String, key: KeyEvent) -> SecretInput {
    if key.kind == KeyEventKind::Release {
        return SecretInput::Pending;
    }
    match key.code {
        KeyCode::Enter => SecretInput::Done,
        KeyCode::Esc => SecretInput::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            SecretInput::Cancelled
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretInput::Pending
        }
        KeyCode::Char(c) => {
            secret.push(c);
            SecretInput::Pending
        }
        _ => SecretInput::Pending,
    }
}
