// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::{Emoji, Key, Term};
use indicatif::{ProgressBar, ProgressStyle};

use upodcatcher::{
    ALL_LIST_ID, App, AudioBackend, Config, Database, DownloadEvent, DownloadObserver,
    DownloadQueue, EpisodeList, EpisodeView, Library, Mailbox, MediaKey, Message, NullView,
    Player, PlayerStatus, ReqwestClient, Storage, TokioLauncher, Track, logging,
};
#[cfg(not(feature = "audio"))]
use upodcatcher::{AudioEngine, EngineNotifier, PlaybackError};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static RETRY: Emoji<'_, '_> = Emoji("🔁 ", "[r] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static CHECK: Emoji<'_, '_> = Emoji("✓ ", "* ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");
static PLAY: Emoji<'_, '_> = Emoji("▶️  ", "> ");

/// Subscribe to podcasts, download episodes and track what you listened to
#[derive(Parser, Debug)]
#[command(name = "upodcatcher")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep database and episodes under this directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to a podcast feed
    Subscribe { url: String },

    /// Remove a feed, its episodes and their downloaded files
    Unsubscribe { feed_id: i64 },

    /// List subscribed feeds
    Feeds,

    /// Look for new episodes (all feeds when no id is given)
    Refresh { feed_id: Option<i64> },

    /// List the episodes of a feed
    Episodes { feed_id: i64 },

    /// Download episodes one after another
    Download {
        #[arg(required = true)]
        track_ids: Vec<i64>,
    },

    /// Mark an episode as listened
    Listened {
        track_id: i64,

        /// Mark as not listened instead
        #[arg(long)]
        unset: bool,
    },

    /// Play episodes (space: pause/resume, n/b: next/previous, s: stop, q: quit)
    Play {
        /// Episode to start with
        track_id: Option<i64>,

        /// Play through this feed
        #[arg(long, conflicts_with = "list")]
        feed: Option<i64>,

        /// Play through this list (the "All" list when nothing is given)
        #[arg(long)]
        list: Option<i64>,
    },

    /// Show a list (the "All" list by default)
    List {
        list_id: Option<i64>,

        /// Drop listened episodes from the list first
        #[arg(long)]
        prune: bool,
    },
}

/// Stand-in for builds without the `audio` feature
#[cfg(not(feature = "audio"))]
struct HeadlessBackend;

#[cfg(not(feature = "audio"))]
impl AudioBackend for HeadlessBackend {
    fn open(
        &self,
        path: &std::path::Path,
        _notifier: EngineNotifier,
    ) -> Result<Box<dyn AudioEngine>, PlaybackError> {
        Err(PlaybackError::OpenFailed {
            path: path.to_path_buf(),
            reason: "built without the audio feature".to_string(),
        })
    }
}

#[cfg(feature = "audio")]
fn audio_backend() -> Box<dyn AudioBackend> {
    Box::new(upodcatcher::RodioBackend)
}

#[cfg(not(feature = "audio"))]
fn audio_backend() -> Box<dyn AudioBackend> {
    Box::new(HeadlessBackend)
}

/// Renders the loaded episode as a progress bar
struct TerminalView {
    bar: ProgressBar,
    status: Option<PlayerStatus>,
}

impl TerminalView {
    fn new(bar: ProgressBar) -> Self {
        Self { bar, status: None }
    }
}

impl EpisodeView for TerminalView {
    fn now_playing(&mut self, track: &Track) {
        self.bar
            .println(format!("{PLAY}{}", track.title.bold().green()));
        self.bar.set_message(truncate_title(&track.title, 40));
        self.bar.set_position(u64::from(track.relative_position()));
    }

    fn transport_updated(&mut self, status: PlayerStatus, relative_position: u8) {
        self.bar.set_position(u64::from(relative_position));
        if self.status != Some(status) {
            self.status = Some(status);
            let label = match status {
                PlayerStatus::Playing => "playing".green(),
                PlayerStatus::Paused => "paused ".yellow(),
                PlayerStatus::Stopped => "stopped".dimmed(),
            };
            self.bar.set_prefix(label.to_string());
        }
    }
}

fn message_for(key: &Key) -> Option<Message> {
    match key {
        Key::Char(' ' | 'p') => Some(Message::Media(MediaKey::PlayPause)),
        Key::Char('n') | Key::ArrowRight => Some(Message::Media(MediaKey::Next)),
        Key::Char('b') | Key::ArrowLeft => Some(Message::Media(MediaKey::Previous)),
        Key::Char('s') => Some(Message::Media(MediaKey::Stop)),
        Key::Char('q') | Key::Escape | Key::CtrlC => Some(Message::Shutdown),
        _ => None,
    }
}

/// Forward key presses to the app loop from a plain thread
///
/// Without a terminal, one command is read per input line. The thread blocks
/// on input and is left behind when the process exits.
fn spawn_key_reader(mailbox: Mailbox) {
    thread::spawn(move || {
        let term = Term::stdout();
        let post = |message: Message| {
            let quit = message == Message::Shutdown;
            mailbox.post(message) && !quit
        };

        if term.is_term() {
            loop {
                let message = match term.read_key() {
                    Ok(key) => message_for(&key),
                    Err(_) => Some(Message::Shutdown),
                };
                if let Some(message) = message
                    && !post(message)
                {
                    return;
                }
            }
        }

        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let key = Key::Char(line.trim().chars().next().unwrap_or(' '));
            if let Some(message) = message_for(&key)
                && !post(message)
            {
                return;
            }
        }
        post(Message::Shutdown);
    });
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
}

fn print_track(track: &Track) {
    let status = if track.downloaded {
        format!("{CHECK}").green()
    } else {
        format!("{CROSS}").dimmed()
    };
    let title = if track.listened {
        track.title.dimmed()
    } else {
        track.title.bold()
    };
    let progress = if track.duration > 0 {
        format!(
            "{}/{} ({}%)",
            format_duration(track.position),
            format_duration(track.duration),
            track.relative_position()
        )
    } else {
        String::new()
    };
    println!(
        "  {:>6} {} {} {} {}",
        track.id.to_string().cyan(),
        status,
        track.date.get(..8).unwrap_or(track.date.as_str()).dimmed(),
        title,
        progress.dimmed()
    );
}

fn resolve_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config =
        Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;

    if let Some(data_dir) = &args.data_dir {
        let relocated = Config::with_data_dir(data_dir);
        config.data_dir = relocated.data_dir;
        config.podcasts_dir = relocated.podcasts_dir;
        config.database = relocated.database;
    }
    config.ensure_dirs()?;
    Ok(config)
}

async fn download(
    config: &Config,
    db: Rc<Database>,
    client: ReqwestClient,
    track_ids: &[i64],
) -> Result<usize> {
    let titles = track_ids
        .iter()
        .filter_map(|id| db.get_track(*id))
        .map(|track| (track.id, track.title))
        .collect();
    let spinner = Arc::new(SpinnerObserver::new(titles));

    let (mailbox, receiver) = Mailbox::channel();
    let launcher = TokioLauncher::new(Arc::new(client), mailbox.clone());
    let mut downloads = DownloadQueue::new(Box::new(launcher), config.max_retries);
    downloads.subscribe(spinner.clone());
    let player = Player::new(audio_backend(), mailbox);
    let storage: Rc<dyn Storage> = db;
    let list = EpisodeList::new(config, storage, player, downloads, Box::new(NullView));
    let mut app = App::new(list, receiver, config.sample_interval());

    for &track_id in track_ids {
        if !app.list_mut().download_track(track_id) {
            spinner.bar.println(format!(
                "  {CROSS}{} {}",
                spinner.title(track_id).yellow(),
                "is unknown or already downloaded".dimmed()
            ));
        }
    }

    app.run_until_downloads_idle().await;

    let (downloaded, failed) = spinner.finish();
    println!(
        "\n{PARTY}{} {} downloaded, {} failed",
        "Done:".bold().green(),
        downloaded.to_string().green().bold(),
        if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().green()
        }
    );
    Ok(failed)
}

async fn play(
    config: &Config,
    db: Rc<Database>,
    client: ReqwestClient,
    track_id: Option<i64>,
    feed: Option<i64>,
    list_id: Option<i64>,
) -> Result<()> {
    let start = match track_id {
        Some(id) => Some(
            db.get_track(id)
                .with_context(|| format!("Episode {id} does not exist"))?,
        ),
        None => None,
    };

    let bar = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{prefix} {wide_msg} [{bar:30.cyan/blue}] {pos:>3}%")
    {
        bar.set_style(style.progress_chars("=> "));
    }

    let (mailbox, receiver) = Mailbox::channel();
    let launcher = TokioLauncher::new(Arc::new(client), mailbox.clone());
    let downloads = DownloadQueue::new(Box::new(launcher), config.max_retries);
    let player = Player::new(audio_backend(), mailbox.clone());
    let storage: Rc<dyn Storage> = db;
    let view = TerminalView::new(bar.clone());
    let mut list = EpisodeList::new(config, storage, player, downloads, Box::new(view));

    match (feed, list_id, &start) {
        (Some(feed_id), _, _) => list.show_feed(feed_id),
        (None, Some(list_id), _) => list.show_list(list_id),
        (None, None, Some(track)) => list.show_feed(track.feed_id),
        (None, None, None) => list.show_list(ALL_LIST_ID),
    }
    if list.rows().is_empty() {
        bail!("Nothing to play");
    }

    let started = match &start {
        Some(track) => {
            let index = list
                .rows()
                .iter()
                .position(|row| row.track.id == track.id)
                .with_context(|| format!("Episode {} is not part of this selection", track.id))?;
            list.activate_play(index)
        }
        None => list.media_play(),
    };
    if !list.is_playing() {
        let hint = if started {
            "Downloading, press space once it is done"
        } else {
            "Nothing downloaded yet, use `upodcatcher download` first"
        };
        bar.println(format!("  {DOWNLOAD}{}", hint.dimmed()));
    }
    println!(
        "  {}",
        "space pause/resume · n next · b previous · s stop · q quit".dimmed()
    );

    let mut app = App::new(list, receiver, config.sample_interval());
    spawn_key_reader(mailbox);
    app.run().await;

    bar.finish_and_clear();
    println!("{SUCCESS}Position saved");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    println!(
        "\n{}{} {}\n",
        MICROPHONE,
        "upodcatcher".bold().magenta(),
        "- Podcast Manager".dimmed()
    );

    let config = resolve_config(&args)?;
    let db = Rc::new(
        Database::open(&config.database)
            .with_context(|| format!("Failed to open {}", config.database.display()))?,
    );
    let client =
        ReqwestClient::new(&config.user_agent).context("Failed to create HTTP client")?;
    let library = Library::new(&client, &*db, &config.podcasts_dir);

    match args.command {
        Command::Subscribe { url } => {
            println!("{SEARCH}Fetching feed: {}", url.cyan());
            let feed_id = library
                .subscribe(&url)
                .await
                .context("Failed to subscribe")?;
            let count = db.get_tracks_from_feed(feed_id).len();
            println!(
                "{SUCCESS}Subscribed as feed {} with {} episodes",
                feed_id.to_string().cyan(),
                count.to_string().green()
            );
        }

        Command::Unsubscribe { feed_id } => {
            if !library.unsubscribe(feed_id) {
                bail!("Feed {feed_id} does not exist");
            }
            println!("{SUCCESS}Removed feed {}", feed_id.to_string().cyan());
        }

        Command::Feeds => {
            for feed in db.get_feeds() {
                let tracks = db.get_tracks_from_feed(feed.id);
                let unheard = tracks.iter().filter(|t| !t.listened).count();
                println!(
                    "  {:>4} {}{} • {} episodes, {} unheard",
                    feed.id.to_string().cyan(),
                    HEADPHONES,
                    feed.title.bold().green(),
                    tracks.len().to_string().cyan(),
                    unheard.to_string().yellow()
                );
            }
        }

        Command::Refresh { feed_id } => {
            let added = match feed_id {
                Some(id) => library.refresh(id).await.context("Failed to refresh")?,
                None => library.refresh_all().await,
            };
            println!("{SUCCESS}{} new episodes", added.to_string().green());
        }

        Command::Episodes { feed_id } => {
            let feed = db
                .get_feed(feed_id)
                .with_context(|| format!("Feed {feed_id} does not exist"))?;
            println!("{HEADPHONES}{}", feed.title.bold().green());
            for track in db.get_tracks_from_feed(feed_id) {
                print_track(&track);
            }
        }

        Command::Download { track_ids } => {
            drop(library);
            let failed = download(&config, Rc::clone(&db), client, &track_ids).await?;
            if failed > 0 {
                std::process::exit(1);
            }
        }

        Command::Play {
            track_id,
            feed,
            list,
        } => {
            drop(library);
            play(&config, Rc::clone(&db), client, track_id, feed, list).await?;
        }

        Command::Listened { track_id, unset } => {
            if db.get_track(track_id).is_none() {
                bail!("Episode {track_id} does not exist");
            }
            let lists = db.get_lists();
            if unset {
                db.set_track_no_listened(track_id);
                for list in &lists {
                    db.set_track_no_listened_in_list(list.id, track_id);
                }
            } else {
                db.set_track_listened(track_id);
                for list in &lists {
                    db.set_track_listened_in_list(list.id, track_id);
                }
            }
            println!("{SUCCESS}Updated episode {}", track_id.to_string().cyan());
        }

        Command::List { list_id, prune } => {
            let list_id = list_id.unwrap_or(ALL_LIST_ID);
            let name = db
                .get_lists()
                .into_iter()
                .find(|list| list.id == list_id)
                .map(|list| list.name)
                .with_context(|| format!("List {list_id} does not exist"))?;
            if prune {
                let removed = db.remove_listened_from_list(list_id);
                println!("{CROSS}Removed {} listened episodes", removed);
            }
            println!("{HEADPHONES}{}", name.bold().green());
            for track in db.get_tracks_from_list(list_id) {
                print_track(&track);
            }
        }
    }

    Ok(())
}
