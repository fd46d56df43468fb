use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use roadmap_tracker::app::command::{self, FocusCommand, ParseResult};
use roadmap_tracker::auth::{AuthProvider, LocalAuth};
use roadmap_tracker::bookmarks::{Bookmark, BookmarkCategory, BookmarkStore, NewBookmark};
use roadmap_tracker::config::session::Session;
use roadmap_tracker::curriculum::{self, Curriculum, DayKey, Difficulty};
use roadmap_tracker::export::{self, Snapshot};
use roadmap_tracker::leaderboard::{Leaderboard, LeaderboardCategory};
use roadmap_tracker::notify::{Inbox, LogNotifier, NotificationKind, Notifier};
use roadmap_tracker::stopwatch::{StopwatchDriver, StopwatchHandle};
use roadmap_tracker::store::FileStore;
use roadmap_tracker::tasks::{CustomTaskStore, NewTask};
use roadmap_tracker::{Config, Options, Tracker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WRAP_WIDTH: usize = 88;

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your progress summary
    Status,
    /// Show the roadmap with completion marks
    Roadmap {
        /// Phase to show (0-based); defaults to the last one viewed
        phase: Option<usize>,
    },
    /// Mark a task complete, or incomplete if it already is
    Toggle {
        /// Task id, e.g. 0-0-0-1-2 or a custom-... id
        task_id: String,
    },
    /// Show or replace the note for a roadmap day
    Note {
        /// Day key, e.g. 0-0-0
        day: String,
        /// New note text; omit to print the current note
        text: Option<String>,
    },
    /// Run the daily streak check
    Streak,
    /// Time a focus session on a task
    Focus {
        /// Task id to time
        task_id: String,
    },
    /// Export your progress to a JSON file
    Export {
        /// Output path (default: roadmap-progress-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace your progress with an exported file
    Import {
        /// Snapshot file to import
        path: PathBuf,
    },
    /// Show the leaderboard
    Leaderboard {
        /// overall, tasks, hours, streak or achievements
        #[arg(short, long, default_value = "overall")]
        category: LeaderboardCategory,
        /// Number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Manage your custom tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage bookmarked resources
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Show recent notifications
    Notifications {
        /// Mark everything read after listing
        #[arg(long)]
        read_all: bool,
        /// Mark one notification read
        #[arg(long, value_name = "ID")]
        read: Option<String>,
        /// Delete a notification by id
        #[arg(long, value_name = "ID")]
        delete: Option<String>,
    },
    /// Sign in as a local profile
    Login {
        /// Display name; the profile id is derived from it
        name: String,
    },
    /// Sign out
    Logout,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task to a roadmap day
    Add {
        /// Day key, e.g. 0-0-0
        day: String,
        /// Task title
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: String,
        /// Estimated minutes
        #[arg(short, long, default_value_t = 30)]
        minutes: u32,
        #[arg(short, long, default_value = "")]
        category: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long = "resource")]
        resources: Vec<String>,
    },
    /// List your custom tasks
    List {
        /// Only tasks on this day
        #[arg(long)]
        day: Option<String>,
    },
    /// Delete one of your custom tasks
    Remove { id: String },
}

#[derive(Subcommand)]
enum BookmarkAction {
    /// Bookmark a resource
    Add {
        title: String,
        url: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// articles, videos, courses, tools, practice or other
        #[arg(short, long, default_value = "other")]
        category: BookmarkCategory,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// List your bookmarks, newest first
    List {
        #[arg(short, long)]
        category: Option<BookmarkCategory>,
    },
    /// Search titles, descriptions and tags
    Search { term: String },
    /// Delete a bookmark
    Remove { id: String },
}

/// Prints notifications and keeps them in the inbox (or only logs them when
/// notifications are turned off)
struct CliNotifier {
    inbox: Option<Inbox>,
    log: LogNotifier,
}

impl CliNotifier {
    fn load(config: &Config) -> Result<Self> {
        let inbox = if config.notifications { Some(Inbox::load()?) } else { None };
        Ok(Self { inbox, log: LogNotifier })
    }

    fn save(&self) -> Result<()> {
        match &self.inbox {
            Some(inbox) => inbox.save(),
            None => Ok(()),
        }
    }
}

impl Notifier for CliNotifier {
    fn notify(&mut self, user_id: &str, kind: NotificationKind, payload: &str) {
        match &mut self.inbox {
            Some(inbox) => {
                println!("* {} {}", kind.title(), payload);
                inbox.notify(user_id, kind, payload);
            }
            None => self.log.notify(user_id, kind, payload),
        }
    }
}

type CliTracker = Tracker<'static, FileStore, CliNotifier>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Open the signed-in user's session and run the once-a-day checks
fn open_tracker(config: &Config, auth: &LocalAuth) -> Result<CliTracker> {
    let user = auth.require_user()?;
    let store = FileStore::in_dir(&Config::data_dir()?);
    let notifier = CliNotifier::load(config)?;
    let today = today();

    let mut tracker =
        Tracker::open(curriculum::builtin(), user, store, notifier, Options::from(config), today)?;

    let custom = CustomTaskStore::load()?;
    let ids: Vec<String> =
        custom.owned_by(&tracker.user().id).iter().map(|t| t.id.clone()).collect();
    tracker.register_custom_tasks(ids);

    tracker.remind_if_idle(today);
    tracker.check_streak(today);
    Ok(tracker)
}

/// Refresh the leaderboard row and save notifications
fn close_tracker(tracker: CliTracker) -> Result<()> {
    if let Some(err) = tracker.last_sync_error() {
        eprintln!("Warning: progress could not be saved: {}", err);
    }

    let mut board = Leaderboard::load()?;
    board.upsert(tracker.leaderboard_entry(Utc::now()));
    board.save()?;

    tracker.into_notifier().save()
}

fn wrap(text: &str, indent: &str) -> String {
    let options =
        textwrap::Options::new(WRAP_WIDTH).initial_indent(indent).subsequent_indent(indent);
    textwrap::fill(text, options)
}

fn parse_day(curriculum: &Curriculum, day: &str) -> Result<DayKey> {
    let key: DayKey = day.parse()?;
    if curriculum.day(key).is_none() {
        bail!("Day {} is not on the roadmap", key);
    }
    Ok(key)
}

fn print_status(tracker: &CliTracker) -> Result<()> {
    let stats = tracker.statistics();
    let data = tracker.data();
    let user = tracker.user();

    println!("{} ({})", user.name(), user.id);
    println!(
        "Progress:     {}/{} roadmap tasks ({}%)",
        stats.curriculum_completed, stats.total_tasks, stats.completion_percentage
    );
    println!(
        "Roadmap:      about {:.0} h of estimated work",
        tracker.curriculum().total_estimated_minutes() as f64 / 60.0
    );
    if stats.completed_tasks > stats.curriculum_completed {
        println!("Custom tasks: {} completed", stats.completed_tasks - stats.curriculum_completed);
    }
    println!(
        "Study time:   {:.1} h ({:.2} h per completed task)",
        stats.total_hours, stats.average_task_hours
    );
    println!(
        "Streak:       {} day(s), longest {} this session",
        data.current_streak,
        tracker.longest_streak()
    );
    for difficulty in Difficulty::ALL {
        println!(
            "  {:<7} {}/{}",
            difficulty.as_str(),
            stats.completed_by_difficulty.get(difficulty),
            stats.tasks_by_difficulty.get(difficulty)
        );
    }

    if data.achievements.is_empty() {
        println!("Achievements: none yet");
    } else {
        println!("Achievements:");
        for achievement in &data.achievements {
            println!("  - {}", achievement);
        }
    }

    if let Some(inbox) = &tracker.notifier().inbox {
        println!("Unread notifications: {}", inbox.unread_count(&user.id));
    }

    let board = Leaderboard::load()?;
    if let Some(rank) = board.rank(&user.id) {
        println!("Leaderboard rank: #{} of {}", rank, board.entries.len());
    }
    Ok(())
}

fn print_roadmap(tracker: &CliTracker, phase_filter: Option<usize>) -> Result<()> {
    let curriculum = tracker.curriculum();
    let data = tracker.data();
    let custom = CustomTaskStore::load()?;

    if let Some(phase) = phase_filter
        && phase >= curriculum.phases.len()
    {
        bail!("Phase {} does not exist (the roadmap has {})", phase, curriculum.phases.len());
    }

    for (p, phase) in curriculum.phases.iter().enumerate() {
        if phase_filter.is_some_and(|wanted| wanted != p) {
            continue;
        }
        println!("{}", phase.title);
        if !phase.description.is_empty() {
            println!("{}", wrap(&phase.description, "  "));
        }
        for (w, week) in phase.weeks.iter().enumerate() {
            println!("\n  {}", week.title);
            if !week.focus.is_empty() {
                println!("  Focus: {}", week.focus);
            }
            for (d, day) in week.days.iter().enumerate() {
                let key = DayKey { phase: p, week: w, day: d };
                println!("\n    {} [{}]", day.label, key);
                for (c, category) in day.categories.iter().enumerate() {
                    println!("      {}", category.name);
                    for (t, task) in category.tasks.iter().enumerate() {
                        let id = format!("{}-{}-{}", key, c, t);
                        let mark = if data.is_completed(&id) { "x" } else { " " };
                        println!(
                            "        [{}] {}  {} ({} min, {})",
                            mark, id, task.text, task.minutes, task.difficulty
                        );
                    }
                }
                let mine = custom.for_day(&tracker.user().id, key);
                if !mine.is_empty() {
                    println!("      Custom");
                    for task in mine {
                        let mark = if data.is_completed(&task.id) { "x" } else { " " };
                        println!("        [{}] {}  {}", mark, task.id, task.title);
                    }
                }
                if let Some(note) = data.note(&key.to_string()) {
                    println!("      Note:");
                    println!("{}", wrap(note, "        "));
                }
            }
        }
        println!();
    }
    Ok(())
}

async fn run_focus(tracker: &mut CliTracker, task_id: &str) -> Result<()> {
    let label = task_label(tracker, task_id)?;
    let handle = StopwatchDriver::spawn();
    handle.start(task_id).await?;
    println!("Focusing on: {}", label);
    println!("{}", command::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match command::parse_command(&line) {
            ParseResult::Ok(FocusCommand::TogglePause) => {
                let status = handle.toggle_pause().await?;
                let elapsed = command::format_elapsed(handle.snapshot().current_time);
                println!("{:?} at {}", status, elapsed);
            }
            ParseResult::Ok(FocusCommand::Stop) => break,
            ParseResult::Ok(FocusCommand::Switch(next)) => {
                let next_label = match task_label(tracker, &next) {
                    Ok(label) => label,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                finish_focus(tracker, &handle).await?;
                handle.start(next.as_str()).await?;
                println!("Focusing on: {}", next_label);
            }
            ParseResult::Ok(FocusCommand::Status) => {
                let state = handle.snapshot();
                let status = if state.is_running { "running" } else { "paused" };
                println!("{} ({})", command::format_elapsed(state.current_time), status);
            }
            ParseResult::Ok(FocusCommand::Help) => println!("{}", command::HELP),
            ParseResult::Ok(FocusCommand::Nop) => {}
            ParseResult::UnknownCommand(cmd) => println!("Unknown command '{}'", cmd),
            ParseResult::MissingArgument(cmd) => println!("'{}' needs an argument", cmd),
        }
    }

    finish_focus(tracker, &handle).await?;
    handle.shutdown();
    Ok(())
}

async fn finish_focus(tracker: &mut CliTracker, handle: &StopwatchHandle) -> Result<()> {
    if let Some(session) = handle.stop().await? {
        let added = tracker.finish_session(&session);
        println!(
            "Stopped after {} (+{:.2} h, total {:.2} h)",
            command::format_elapsed(session.elapsed_secs),
            added,
            tracker.data().total_hours
        );
    }
    Ok(())
}

fn task_label(tracker: &CliTracker, task_id: &str) -> Result<String> {
    if let Some(task) = tracker.curriculum().task_at(task_id) {
        return Ok(task.text.clone());
    }
    let custom = CustomTaskStore::load()?;
    match custom.get(task_id) {
        Some(task) if task.owner_id == tracker.user().id => Ok(task.title.clone()),
        _ => bail!("Unknown task id '{}'", task_id),
    }
}

fn run_task(action: TaskAction, config: &Config, auth: &LocalAuth) -> Result<()> {
    let user = auth.require_user()?;
    let mut store = CustomTaskStore::load()?;
    let curriculum = curriculum::builtin();

    match action {
        TaskAction::Add {
            day,
            title,
            description,
            difficulty,
            minutes,
            category,
            tags,
            resources,
        } => {
            let day = parse_day(curriculum, &day)?;
            let new = NewTask {
                title,
                description,
                difficulty: Difficulty::from_label(&difficulty),
                estimated_minutes: minutes,
                category,
                tags,
                resources,
            };
            let task = store.create(&user.id, day, new);
            println!("Added {} to day {}", task.id, day);
            store.save()?;
        }
        TaskAction::List { day } => {
            let tasks = match day {
                Some(day) => store.for_day(&user.id, parse_day(curriculum, &day)?),
                None => store.owned_by(&user.id),
            };
            if tasks.is_empty() {
                println!("No custom tasks.");
            }
            for task in tasks {
                println!(
                    "{}  [{}] {} ({} min, {})",
                    task.id,
                    task.day_key(),
                    task.title,
                    task.estimated_minutes,
                    task.difficulty
                );
                if !task.tags.is_empty() {
                    println!("    tags: {}", task.tags.join(", "));
                }
            }
        }
        TaskAction::Remove { id } => {
            let task = store.delete(&user.id, &id)?;
            store.save()?;
            println!("Removed \"{}\"", task.title);

            // A deleted task no longer counts as completed
            let mut tracker = open_tracker(config, auth)?;
            if tracker.data().is_completed(&task.id) {
                tracker.toggle_task(&task.id)?;
            }
            close_tracker(tracker)?;
        }
    }
    Ok(())
}

fn print_bookmarks(bookmarks: &[&Bookmark]) {
    if bookmarks.is_empty() {
        println!("No bookmarks.");
    }
    for b in bookmarks {
        println!("{}  [{}] {}\n    {}", b.id, b.category.id(), b.title, b.url);
        if !b.description.is_empty() {
            println!("{}", wrap(&b.description, "    "));
        }
    }
}

fn run_bookmark(action: BookmarkAction, auth: &LocalAuth) -> Result<()> {
    let user = auth.require_user()?;
    let mut store = BookmarkStore::load()?;

    match action {
        BookmarkAction::Add { title, url, description, category, tags } => {
            let bookmark =
                store.add(&user.id, NewBookmark { title, url, description, category, tags });
            println!("Bookmarked {} ({})", bookmark.title, bookmark.id);
            store.save()?;
        }
        BookmarkAction::List { category } => match category {
            Some(category) => print_bookmarks(&store.by_category(&user.id, category)),
            None => print_bookmarks(&store.for_user(&user.id)),
        },
        BookmarkAction::Search { term } => print_bookmarks(&store.search(&user.id, &term)),
        BookmarkAction::Remove { id } => {
            let bookmark = store.delete(&user.id, &id)?;
            store.save()?;
            println!("Removed \"{}\"", bookmark.title);
        }
    }
    Ok(())
}

fn run_notifications(
    config: &Config,
    auth: &LocalAuth,
    read_all: bool,
    read: Option<String>,
    delete: Option<String>,
) -> Result<()> {
    let user = auth.require_user()?;
    let mut inbox = Inbox::load()?;

    if let Some(id) = read {
        if !inbox.mark_read(&user.id, &id) {
            bail!("Notification '{}' not found", id);
        }
        inbox.save()?;
        println!("Marked {} read", id);
        return Ok(());
    }

    if let Some(id) = delete {
        if !inbox.delete(&user.id, &id) {
            bail!("Notification '{}' not found", id);
        }
        inbox.save()?;
        println!("Deleted notification {}", id);
        return Ok(());
    }

    let recent = inbox.recent(&user.id, config.notification_limit);
    if recent.is_empty() {
        println!("No notifications.");
    }
    for n in recent {
        let marker = if n.read { " " } else { "*" };
        println!(
            "{} {} {} - {}",
            marker,
            n.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            n.title,
            n.message
        );
    }

    if read_all {
        let changed = inbox.mark_all_read(&user.id);
        inbox.save()?;
        println!("Marked {} notification(s) read", changed);
    }
    Ok(())
}

fn print_leaderboard(
    config: &Config,
    auth: &LocalAuth,
    category: LeaderboardCategory,
    limit: Option<usize>,
) -> Result<()> {
    if auth.current_user().is_some() {
        // Refreshes this user's own row
        close_tracker(open_tracker(config, auth)?)?;
    }
    let board = Leaderboard::load()?;
    let me = auth.current_user().map(|u| u.id);

    println!("Leaderboard: {}", category);
    let rows = board.by_category(category, limit.unwrap_or(config.leaderboard_limit));
    if rows.is_empty() {
        println!("No entries yet.");
    }
    for row in rows {
        let marker = if me.as_deref() == Some(row.entry.user_id.as_str()) { ">" } else { " " };
        let value = match category {
            LeaderboardCategory::Overall => format!("{:.0} pts", row.entry.score),
            LeaderboardCategory::Hours => format!("{:.1} h", row.entry.total_hours),
            other => format!("{}", row.entry.value(other)),
        };
        println!("{} #{:<3} {:<24} {}", marker, row.rank, row.entry.name, value);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadmap_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut auth = LocalAuth::open(Session::session_path()?)?;

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            let tracker = open_tracker(&config, &auth)?;
            print_status(&tracker)?;
            close_tracker(tracker)?;
        }
        Commands::Roadmap { phase } => {
            let tracker = open_tracker(&config, &auth)?;
            let phase = phase.unwrap_or(auth.session().active_phase);
            print_roadmap(&tracker, Some(phase))?;
            close_tracker(tracker)?;
            auth.session_mut().active_phase = phase;
            auth.persist()?;
        }
        Commands::Toggle { task_id } => {
            let mut tracker = open_tracker(&config, &auth)?;
            let outcome = tracker.toggle_task(&task_id)?;
            if outcome.completed {
                println!("Completed {}", task_id);
            } else {
                println!("Marked {} incomplete", task_id);
            }
            close_tracker(tracker)?;
        }
        Commands::Note { day, text } => {
            let mut tracker = open_tracker(&config, &auth)?;
            match text {
                Some(text) => {
                    tracker.update_note(&day, &text)?;
                    println!("Saved note for day {}", day);
                }
                None => match tracker.data().note(&day) {
                    Some(note) => println!("{}", wrap(note, "")),
                    None => println!("No note for day {}", day),
                },
            }
            close_tracker(tracker)?;
        }
        Commands::Streak => {
            // Opening the session runs the check
            let tracker = open_tracker(&config, &auth)?;
            println!("Current streak: {} day(s)", tracker.data().current_streak);
            close_tracker(tracker)?;
        }
        Commands::Focus { task_id } => {
            let mut tracker = open_tracker(&config, &auth)?;
            run_focus(&mut tracker, &task_id).await?;
            close_tracker(tracker)?;
        }
        Commands::Export { output } => {
            let tracker = open_tracker(&config, &auth)?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::file_name(today())));
            tracker.export_snapshot(Utc::now()).write_to(&path)?;
            println!("Exported progress to {}", path.display());
            close_tracker(tracker)?;
        }
        Commands::Import { path } => {
            let mut tracker = open_tracker(&config, &auth)?;
            let snapshot = Snapshot::read_from(&path)?;
            tracker.import_snapshot(snapshot)?;
            println!(
                "Imported {} completed task(s) from {}",
                tracker.data().completed_count(),
                path.display()
            );
            close_tracker(tracker)?;
        }
        Commands::Leaderboard { category, limit } => {
            print_leaderboard(&config, &auth, category, limit)?;
        }
        Commands::Task { action } => run_task(action, &config, &auth)?,
        Commands::Bookmark { action } => run_bookmark(action, &auth)?,
        Commands::Notifications { read_all, read, delete } => {
            run_notifications(&config, &auth, read_all, read, delete)?;
        }
        Commands::Login { name } => {
            let user = auth.sign_in(&name)?;
            println!("Signed in as {} ({})", user.name(), user.id);
            // Creates progress on first sign-in
            close_tracker(open_tracker(&config, &auth)?)?;
        }
        Commands::Logout => {
            auth.sign_out()?;
            println!("Signed out");
        }
    }

    Ok(())
}
