mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use filmdesk_core::auth::{AuthClient, LoginForm};
use filmdesk_core::config::{self, Config};
use filmdesk_core::gateway::{Gateway, LoginRedirect, ReqwestTransport};
use filmdesk_core::repository::MovieRepository;
use filmdesk_core::session::FileSessionStore;
use filmdesk_core::types::MovieId;
use filmdesk_core::util::http;
use filmdesk_core::view::{CatalogController, MovieForm, Notification};

#[derive(Parser)]
#[command(
    name = "filmdesk",
    about = format!("{} filmdesk - manage a movie catalog from the terminal", filmdesk_core::LOGO),
    version = filmdesk_core::VERSION,
)]
struct Cli {
    /// Config file (default: ~/.filmdesk/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// API base URL, overrides the config file
    #[arg(long, global = true)]
    api: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and forget the session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List all movies
    List,
    /// Show one movie
    Show { id: String },
    /// Add a movie; missing fields are asked for
    Add {
        #[command(flatten)]
        fields: MovieFields,
    },
    /// Edit a movie; fields not given keep their current value
    Edit {
        id: String,
        #[command(flatten)]
        fields: MovieFields,
    },
    /// Delete a movie
    Delete {
        id: String,
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct MovieFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    director: Option<String>,
    /// Comma-separated names
    #[arg(long)]
    cast: Option<String>,
}

impl MovieFields {
    fn apply(self, form: &mut MovieForm) {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.genre {
            form.genre = v;
        }
        if let Some(v) = self.year {
            form.year = v;
        }
        if let Some(v) = self.director {
            form.director = v;
        }
        if let Some(v) = self.cast {
            form.cast = v;
        }
    }
}

/// Sends the user back to `filmdesk login` once the API rejects the token.
struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self) {
        eprintln!("Run `filmdesk login` to sign in again.");
    }
}

struct App {
    config: Config,
    gateway: Arc<Gateway>,
}

impl App {
    fn build(cli: &Cli) -> Result<Self> {
        let mut config = config::load_config_from_env(cli.config.as_deref());
        if let Some(api) = &cli.api {
            config.api.base_url = api.clone();
        }

        let base = http::parse_url(&config.api.base_url)?;
        let transport = ReqwestTransport::from_config(&config.api)?;
        let session = FileSessionStore::new(config.session_path());
        let gateway = Gateway::new(
            Arc::new(transport),
            Arc::new(session),
            base,
            Arc::new(CliRedirect),
        );

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
        })
    }

    fn auth(&self) -> AuthClient {
        AuthClient::new(self.gateway.clone())
    }

    fn repo(&self) -> MovieRepository {
        MovieRepository::new(self.gateway.clone())
    }

    fn controller(&self) -> CatalogController {
        CatalogController::with_renderer(self.repo(), Box::new(ui::TerminalRenderer::new()))
    }

    /// Route guard for the catalog commands.
    fn signed_in(&self) -> bool {
        match self.auth().require_session() {
            Ok(_) => true,
            Err(e) => {
                ui::notify(&Notification::error(e.to_string()));
                CliRedirect.redirect_to_login();
                false
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filmdesk=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::build(&cli)?;
    debug!("API base {}", app.config.api.base_url);

    let ok = match cli.command {
        Commands::Login { username, password } => cmd_login(&app, username, password).await?,
        Commands::Logout => cmd_logout(&app).await,
        Commands::Whoami => cmd_whoami(&app),
        Commands::List => cmd_list(&app).await,
        Commands::Show { id } => cmd_show(&app, &id).await,
        Commands::Add { fields } => cmd_add(&app, fields).await?,
        Commands::Edit { id, fields } => cmd_edit(&app, &id, fields).await,
        Commands::Delete { id, yes } => cmd_delete(&app, &id, yes).await?,
        Commands::Config => cmd_config(&app)?,
    };

    if ok {
        Ok(ExitCode::SUCCESS)
    } else {
        debug!("Command failed");
        Ok(ExitCode::FAILURE)
    }
}

// ====== Commands ======
//
// Each command reports whether it succeeded; failures have already been
// shown to the user as a notification.

async fn cmd_login(app: &App, username: Option<String>, password: Option<String>) -> Result<bool> {
    let username = match username {
        Some(u) => u,
        None => ui::prompt("Username")?,
    };
    let password = match password {
        Some(p) => p,
        None => ui::prompt_secret("Password")?,
    };

    let mut form = LoginForm::new(username, password);
    let spinner = ui::spinner("Signing in...");
    let result = form.submit(&app.auth()).await;
    spinner.finish_and_clear();

    match result {
        Ok(session) => {
            ui::notify(&Notification::success(format!(
                "Signed in as {}",
                session.username.unwrap_or_default()
            )));
            Ok(true)
        }
        Err(e) => {
            ui::notify(&Notification::error(e.to_string()));
            Ok(false)
        }
    }
}

async fn cmd_logout(app: &App) -> bool {
    match app.auth().logout().await {
        Ok(()) => {
            ui::notify(&Notification::success("Signed out."));
            true
        }
        Err(e) => {
            ui::notify(&Notification::error(e.to_string()));
            false
        }
    }
}

fn cmd_whoami(app: &App) -> bool {
    match app.auth().require_session() {
        Ok(session) => {
            println!("{}", session.username.unwrap_or_else(|| "(unknown user)".to_string()));
            true
        }
        Err(_) => {
            println!("Not signed in.");
            false
        }
    }
}

async fn cmd_list(app: &App) -> bool {
    if !app.signed_in() {
        return false;
    }
    let mut ctl = app.controller();
    ctl.refresh().await;
    succeeded(ctl.notification())
}

async fn cmd_show(app: &App, id: &str) -> bool {
    if !app.signed_in() {
        return false;
    }
    let id = movie_id(id);
    match app.repo().get(&id).await {
        Ok(movie) => {
            ui::print_movie(&movie);
            true
        }
        Err(e) => {
            ui::notify(&Notification::error(format!("Failed to load the movie: {e}")));
            false
        }
    }
}

async fn cmd_add(app: &App, fields: MovieFields) -> Result<bool> {
    if !app.signed_in() {
        return Ok(false);
    }
    let mut ctl = app.controller();
    ctl.open_form(None).await;
    let Some(form) = ctl.form_mut() else {
        return Ok(false);
    };
    fields.apply(form);
    prompt_missing(form)?;
    Ok(ctl.submit_form().await)
}

async fn cmd_edit(app: &App, id: &str, fields: MovieFields) -> bool {
    if !app.signed_in() {
        return false;
    }
    let id = movie_id(id);
    let mut ctl = app.controller();
    ctl.open_form(Some(id)).await;
    let Some(form) = ctl.form_mut() else {
        return false;
    };
    fields.apply(form);
    ctl.submit_form().await
}

async fn cmd_delete(app: &App, id: &str, yes: bool) -> Result<bool> {
    if !app.signed_in() {
        return Ok(false);
    }
    if !(yes || ui::confirm(&format!("Delete movie {id}?"))?) {
        println!("Nothing deleted.");
        return Ok(true);
    }
    let id = movie_id(id);
    Ok(app.controller().delete(&id, true).await)
}

fn cmd_config(app: &App) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(&app.config)?);
    Ok(true)
}

/// A command went through unless the last thing shown was an error.
fn succeeded(last: Option<&Notification>) -> bool {
    last.map_or(true, |n| !n.is_error())
}

fn movie_id(raw: &str) -> MovieId {
    raw.parse().unwrap_or_else(|never| match never {})
}

/// Ask for any field the flags left empty.
fn prompt_missing(form: &mut MovieForm) -> Result<()> {
    let fields: [(&str, &mut String); 5] = [
        ("Title", &mut form.title),
        ("Genre", &mut form.genre),
        ("Release year", &mut form.year),
        ("Director", &mut form.director),
        ("Cast (comma-separated)", &mut form.cast),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            *value = ui::prompt(label)?;
        }
    }
    Ok(())
}
