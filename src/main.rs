use std::{
    collections::HashMap,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use weaver::{
    application::{
        error::{AppError, ErrorReport},
        render::SectionRenderService,
        source::{Catalog, CatalogSource, LatencyProfile},
        weaver::{RequestOutcome, Weaver},
    },
    bus::{Channel, EventBus, WeaverEvent},
    cache::{CacheConfig, PageCache},
    config::{self, Command, ShellArgs, WeaveArgs},
    domain::topic::TopicKey,
    infra::{error::InfraError, telemetry},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("main", error);
    if dispatcher::has_been_set() {
        error!(error = %report, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(Command::Shell(ShellArgs::default()));

    telemetry::init(&settings.logging)?;

    let catalog = Arc::new(load_catalog(settings.source.catalog_path.as_deref()).await?);

    match command {
        Command::Topics => run_topics(&catalog).await,
        Command::Weave(args) => run_weave(&settings, catalog, args).await,
        Command::Shell(args) => run_shell(&settings, catalog, args).await,
    }
}

async fn load_catalog(path: Option<&Path>) -> Result<Catalog, AppError> {
    let catalog = match path {
        Some(path) => Catalog::from_path(path).await?,
        None => Catalog::builtin()?,
    };
    Ok(catalog)
}

fn build_weaver(settings: &config::Settings, catalog: Arc<Catalog>) -> (Arc<EventBus>, Arc<Weaver>) {
    let bus = Arc::new(EventBus::new());
    let source = CatalogSource::new(catalog, LatencyProfile::from(&settings.source));
    let cache = PageCache::new(CacheConfig::from(&settings.cache));
    let weaver = Weaver::new(
        Arc::clone(&bus),
        Arc::new(source),
        Arc::new(SectionRenderService::new()),
        Arc::new(cache),
    );
    (bus, Arc::new(weaver))
}

async fn run_topics(catalog: &Catalog) -> Result<(), AppError> {
    let mut listing = String::new();
    for key in catalog.topics() {
        listing.push_str(key.as_str());
        listing.push('\n');
    }
    write_stdout(&listing).await
}

async fn run_weave(
    settings: &config::Settings,
    catalog: Arc<Catalog>,
    args: WeaveArgs,
) -> Result<(), AppError> {
    let (_bus, weaver) = build_weaver(settings, catalog);

    for topic in &args.topics {
        match weaver.process_request(topic).await {
            RequestOutcome::Resolved {
                key,
                html,
                from_cache,
            } => {
                info!(key = %key, from_cache, "Topic woven");
                write_stdout(&format!("{html}\n")).await?;
            }
            RequestOutcome::Ignored => warn!(topic = %topic, "Skipping blank topic"),
            RequestOutcome::Failed { key } => {
                return Err(AppError::unexpected(format!("failed to weave `{key}`")));
            }
        }
    }

    Ok(())
}

async fn run_shell(
    settings: &config::Settings,
    catalog: Arc<Catalog>,
    args: ShellArgs,
) -> Result<(), AppError> {
    if let Some(dir) = args.output_dir.as_ref() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(InfraError::from)?;
    }

    let (bus, weaver) = build_weaver(settings, catalog);
    subscribe_terminal(&bus, args.output_dir.map(PageFiles::new));
    weaver.attach();

    info!("Weaver shell ready; enter one topic per line");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(InfraError::from)? {
        bus.publish(WeaverEvent::SearchRequested { query: line });
        weaver.idle().await;
    }

    weaver.idle().await;
    Ok(())
}

/// Output files for one shell session. Each key keeps the first path it was
/// given; keys whose stems collide get a numeric suffix.
struct PageFiles {
    dir: PathBuf,
    assigned: Mutex<HashMap<TopicKey, PathBuf>>,
}

impl PageFiles {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            assigned: Mutex::new(HashMap::new()),
        }
    }

    fn path_for(&self, key: &TopicKey) -> PathBuf {
        let mut assigned = self
            .assigned
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = assigned.get(key) {
            return path.clone();
        }

        let stem = key.file_stem();
        let mut path = self.dir.join(format!("{stem}.html"));
        let mut suffix = 2;
        while assigned.values().any(|taken| *taken == path) {
            path = self.dir.join(format!("{stem}-{suffix}.html"));
            suffix += 1;
        }
        assigned.insert(key.clone(), path.clone());
        path
    }
}

/// Wire the terminal to the bus: notices and errors on stderr, pages on
/// stdout or into the session's output files.
fn subscribe_terminal(bus: &EventBus, files: Option<PageFiles>) {
    bus.subscribe(Channel::LoadingStarted, |envelope| {
        if let WeaverEvent::LoadingStarted { query, .. } = &envelope.event {
            writeln!(io::stderr().lock(), "Weaving: \"{query}\" ...")?;
        }
        Ok(())
    });

    bus.subscribe(Channel::RequestFailed, |envelope| {
        if let WeaverEvent::RequestFailed { query, message, .. } = &envelope.event {
            writeln!(io::stderr().lock(), "error: {message} ({query})")?;
        }
        Ok(())
    });

    bus.subscribe(Channel::RenderReady, move |envelope| {
        let WeaverEvent::RenderReady {
            key,
            html,
            from_cache,
            ..
        } = &envelope.event
        else {
            return Ok(());
        };

        match files.as_ref() {
            Some(files) => {
                let path = files.path_for(key);
                std::fs::write(&path, html.as_bytes())?;
                let origin = if *from_cache { "cached" } else { "new" };
                writeln!(
                    io::stderr().lock(),
                    "Wrote {} ({origin})",
                    path.display()
                )?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{html}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    });

    bus.subscribe(Channel::LibraryChanged, |envelope| {
        let WeaverEvent::LibraryChanged { keys } = &envelope.event else {
            return Ok(());
        };
        let titles: Vec<String> = keys.iter().map(TopicKey::display_title).collect();
        writeln!(
            io::stderr().lock(),
            "Library ({}): {}",
            keys.len(),
            titles.join(", ")
        )?;
        Ok(())
    });
}

async fn write_stdout(text: &str) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .await
        .map_err(InfraError::from)?;
    stdout.flush().await.map_err(InfraError::from)?;
    Ok(())
}
