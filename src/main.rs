use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use project_gallery::config::{self, SmtpConfig};
use project_gallery::gallery::{self, EmptyState, GalleryLoader, HtmlGallery, LoadOutcome};
use project_gallery::observer::{ObserverOptions, RevealObserver, Revealed, Viewport};
use project_gallery::site::upload::{UploadLabel, upload_label};
use project_gallery::site::{Debouncer, Form, FormHandler, FormKind, SmtpRelay, format_phone};
use project_gallery::ui::{
    contact_form::{ContactFormAction, ContactFormState, handle_input as handle_contact_input, render_contact_form},
    gallery::{GalleryAction, GalleryState, handle_input as handle_gallery_input, render_gallery},
};

const EMPTY_STATE_MARKUP: &str = "<p>No projects to show yet. Check back soon for our latest work.</p>";
const UPLOAD_PROMPT: &str = "Click to upload or drag and drop";

/// Quiet time after scrolling before the reveal observer looks at the viewport
const SCROLL_SETTLE: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about = "Project gallery and site helpers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the gallery and print its HTML
    Render {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Browse the gallery in the terminal
    Browse {
        /// Page path used for the active navigation link
        #[arg(long, default_value = "/projects.html")]
        path: String,
        /// Write logs here while the terminal is in use
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Format a phone number as it would appear in a form field
    Phone { input: String },
    /// Show the label an upload box displays for a chosen file
    Upload { file: PathBuf },
    /// Submit a form with `name=value` fields
    Submit {
        #[arg(value_enum)]
        kind: FormKindArg,
        fields: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormKindArg {
    Contact,
    Application,
}

impl From<FormKindArg> for FormKind {
    fn from(kind: FormKindArg) -> Self {
        match kind {
            FormKindArg::Contact => FormKind::Contact,
            FormKindArg::Application => FormKind::Application,
        }
    }
}

// Represents the current screen in the terminal host
enum AppScreen {
    Gallery,
    ContactForm,
}

// Main application state
struct AppState {
    screen: AppScreen,
    gallery_state: GalleryState,
    contact_state: Option<ContactFormState>,
    observer: RevealObserver,
    reveals: tokio::sync::mpsc::UnboundedReceiver<Revealed>,
    forms: FormHandler,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Render { output } => {
            init_stderr_logging();
            render(output).await
        }
        Command::Browse { path, log_file } => {
            if let Some(log_file) = &log_file {
                init_file_logging(log_file)?;
            }
            browse(path).await
        }
        Command::Phone { input } => {
            println!("{}", format_phone(&input));
            Ok(())
        }
        Command::Upload { file } => upload(&file),
        Command::Submit { kind, fields } => {
            init_stderr_logging();
            submit(kind.into(), fields).await
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn init_file_logging(path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

fn form_handler() -> FormHandler {
    match SmtpConfig::load() {
        Some(smtp) => FormHandler::with_relay(Box::new(SmtpRelay::new(smtp))),
        None => FormHandler::new(),
    }
}

async fn render(output: Option<PathBuf>) -> Result<()> {
    let config = config::init()?;
    let loader = GalleryLoader::from_config(&config)?;

    let mut container = HtmlGallery::new().with_empty_state(EmptyState::new(EMPTY_STATE_MARKUP));
    let (mut observer, _reveals) = RevealObserver::new(ObserverOptions::default());

    let outcome = loader.load_and_render(&mut container, &mut observer).await;
    match &outcome {
        LoadOutcome::Rendered(count) => info!(cards = count, "gallery rendered"),
        LoadOutcome::Empty => info!("gallery is empty"),
        LoadOutcome::Failed(_) => info!("gallery fell back to the empty state"),
    }

    let html = container.render();
    match output {
        Some(path) => fs::write(&path, html).with_context(|| format!("cannot write {}", path.display()))?,
        None => print!("{}", html),
    }

    Ok(())
}

fn upload(file: &Path) -> Result<()> {
    let meta = fs::metadata(file).with_context(|| format!("cannot read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    match upload_label(UPLOAD_PROMPT, Some((&name, meta.len()))) {
        UploadLabel::Selected { name, detail } => println!("{}\n{}", name, detail),
        UploadLabel::Original(prompt) => println!("{}", prompt),
    }

    Ok(())
}

async fn submit(kind: FormKind, fields: Vec<String>) -> Result<()> {
    let mut form = Form::new(kind, "Submit");
    for field in fields {
        let Some((name, value)) = field.split_once('=') else {
            bail!("expected name=value, got `{}`", field);
        };
        form.set(name, value);
    }

    let submission = form_handler().submit(&mut form).await?;
    println!("{}", form.button.text);
    println!("{}", submission.body());

    Ok(())
}

async fn browse(path: String) -> Result<()> {
    let config = config::init()?;
    let loader = GalleryLoader::from_config(&config)?;

    let (observer, reveals) = RevealObserver::new(ObserverOptions::default());
    let mut app_state = AppState {
        screen: AppScreen::Gallery,
        gallery_state: GalleryState::new(path),
        contact_state: None,
        observer,
        reveals,
        forms: form_handler(),
    };

    // Load before taking over the terminal
    loader
        .load_and_render(&mut app_state.gallery_state, &mut app_state.observer)
        .await;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    let (settled_tx, mut settled) = tokio::sync::mpsc::unbounded_channel::<Viewport>();
    let scroll_settle = Debouncer::spawn(SCROLL_SETTLE, move |viewport: Viewport| {
        let _ = settled_tx.send(viewport);
    });
    let mut last_viewport = None;

    loop {
        terminal.draw(|f| match app_state.screen {
            AppScreen::Gallery => render_gallery(f, &mut app_state.gallery_state),
            AppScreen::ContactForm => {
                if let Some(state) = &mut app_state.contact_state {
                    render_contact_form(f, state);
                }
            }
        })?;

        // Drawing sizes the viewport; the observer only sees positions that stayed put
        if let AppScreen::Gallery = app_state.screen {
            let viewport = app_state.gallery_state.viewport();
            if last_viewport != Some(viewport) {
                last_viewport = Some(viewport);
                scroll_settle.call(viewport);
            }

            let mut revealed = 0;
            while let Ok(viewport) = settled.try_recv() {
                revealed += app_state.observer.evaluate(viewport, &app_state.gallery_state);
            }
            if revealed > 0 {
                gallery::apply_reveals(&mut app_state.gallery_state, &mut app_state.reveals);
                continue;
            }
        }

        let should_quit = match app_state.screen {
            AppScreen::Gallery => handle_gallery_screen(app_state)?,
            AppScreen::ContactForm => handle_contact_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_gallery_screen(app_state: &mut AppState) -> Result<bool> {
    match handle_gallery_input(&mut app_state.gallery_state)? {
        Some(GalleryAction::Exit) => return Ok(true),
        Some(GalleryAction::OpenContactForm) => {
            app_state.contact_state = Some(ContactFormState::new());
            app_state.screen = AppScreen::ContactForm;
        }
        Some(GalleryAction::Navigate(href)) => {
            info!(href = %href, "navigation requested");
            if href == "contact.html" {
                app_state.contact_state = Some(ContactFormState::new());
                app_state.screen = AppScreen::ContactForm;
            }
        }
        None => {}
    }

    Ok(false)
}

async fn handle_contact_screen(app_state: &mut AppState) -> Result<bool> {
    if let Some(state) = &mut app_state.contact_state {
        match handle_contact_input(state)? {
            Some(ContactFormAction::Cancel) => {
                app_state.contact_state = None;
                app_state.screen = AppScreen::Gallery;
            }
            Some(ContactFormAction::Submit) => match app_state.forms.submit(&mut state.form).await {
                Ok(_) => {
                    state.status = Some("Thanks! We'll be in touch.".to_string());
                    state.mark_submitted();
                }
                Err(err) => {
                    state.status = Some(format!("Could not send: {}", err));
                }
            },
            None => {}
        }
    }

    Ok(false)
}
