//! Command implementations for the CLI interface.
//!
//! Every handler takes the shared [`Context`] (database path, configuration,
//! clock) and returns `Result<()>`; `main` reports errors and sets the exit code.

use std::collections::HashSet;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::auth::{authenticate, register, Session};
use crate::clock::Clock;
use crate::config::Config;
use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::priority::{rank, Ranking, ScoredTask};
use crate::recurrence::{sweep_store, toggle_completion};
use crate::reminder::{build_reminder, send_to_all, LogNotifier};
use crate::report::{completion_report, weekly_checkin};
use crate::scheduler::SweepScheduler;
use crate::store::TaskStore;
use crate::task::{
    parse_impact, timestamp_to_datetime, validate_title, Subscription, Task, TaskDraft, TaskPatch, DEFAULT_IMPACT,
};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account. The password is read from stdin.
    Register {
        /// Login id.
        id: String,
        /// Display name (defaults to the id).
        #[arg(long)]
        name: Option<String>,
    },

    /// Log in. The password is read from stdin.
    Login {
        id: String,
    },

    /// End the current session.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Urgency: urgent | not-urgent.
        #[arg(long, value_enum)]
        urgency: Urgency,
        /// Importance: important | not-important.
        #[arg(long, value_enum)]
        importance: Importance,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", weekday names.
        #[arg(long)]
        due: Option<String>,
        /// Impact, a non-negative whole number (default 5).
        #[arg(long, allow_hyphen_values = true)]
        impact: Option<String>,
        /// Recurrence: none | daily | weekly | monthly.
        #[arg(long, value_enum, default_value_t = Frequency::None)]
        frequency: Frequency,
    },

    /// List tasks ranked by priority; suggested tasks are starred.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Priority)]
        sort: SortKey,
        /// Only show one quadrant.
        #[arg(long, value_enum)]
        quadrant: Option<Quadrant>,
        /// Group open tasks by Eisenhower quadrant.
        #[arg(long)]
        matrix: bool,
    },

    /// Show only the suggested tasks.
    Suggest,

    /// View a single task.
    View {
        id: u64,
    },

    /// Update fields on a task.
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_enum)]
        urgency: Option<Urgency>,
        #[arg(long, value_enum)]
        importance: Option<Importance>,
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        #[arg(long, allow_hyphen_values = true)]
        impact: Option<String>,
        #[arg(long, value_enum)]
        frequency: Option<Frequency>,
    },

    /// Mark a task done, or reopen it. Completing a recurring task schedules the next one.
    Toggle {
        id: u64,
    },

    /// Delete a task.
    Delete {
        id: u64,
    },

    /// Search task titles (case-insensitive).
    Search {
        query: String,
    },

    /// Completed tasks, optionally within a date window (inclusive).
    Report {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// Weekly check-in: recent completions, overdue, upcoming and suggestions.
    Checkin,

    /// Create missing successors for completed recurring tasks once.
    Sweep,

    /// Run the periodic sweep (and reminders when enabled) until Ctrl-C.
    Daemon,

    /// Register a push endpoint for overdue reminders.
    Subscribe {
        endpoint: String,
    },

    /// Remove all of your push endpoints.
    Unsubscribe,

    /// Send an overdue reminder to your endpoints now.
    Remind,

    /// Launch the interactive matrix view.
    Ui,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Everything a handler needs besides its arguments.
pub struct Context {
    pub db_path: PathBuf,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(db_path: PathBuf, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { db_path, config, clock }
    }

    /// Path of the session file for this database.
    pub fn session_path(&self) -> PathBuf {
        Session::path_for(&self.db_path)
    }

    /// Open the database file.
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(&self.db_path)
    }

    /// Id of the logged-in user, checked against the accounts in `store`.
    pub fn current_user(&self, store: &FileStore) -> Result<String> {
        let session = Session::require(&self.session_path())?;
        if store.db().user(&session.user_id).is_none() {
            return Err(Error::NotLoggedIn);
        }
        Ok(session.user_id)
    }

    /// Open the store and resolve the logged-in user in one step.
    fn authed(&self) -> Result<(FileStore, String)> {
        let store = self.open_store()?;
        let user = self.current_user(&store)?;
        Ok((store, user))
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn ranking_for(&self, store: &FileStore, user_id: &str) -> Result<Ranking> {
        let today = self.today();
        let open = store.load_open_tasks(user_id, today, self.clock.offset())?;
        Ok(rank(open, today, &self.config.ranking))
    }
}

/// Read one line from `reader` and strip the line ending.
pub fn read_password_from(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::InvalidTask("password must not be empty".into()));
    }
    Ok(password)
}

fn read_password() -> Result<String> {
    read_password_from(&mut io::stdin().lock())
}

/// Create an account.
pub fn cmd_register(ctx: &Context, id: String, name: Option<String>) -> Result<()> {
    let password = read_password()?;
    let mut store = ctx.open_store()?;
    let display = name.unwrap_or_else(|| id.clone());
    store.write(|db| register(db, &id, &display, &password))??;
    println!("Registered {}", id.trim());
    Ok(())
}

/// Verify credentials and start a session.
pub fn cmd_login(ctx: &Context, id: String) -> Result<()> {
    let password = read_password()?;
    let store = ctx.open_store()?;
    let user = authenticate(store.db(), &id, &password)?;
    Session { user_id: user.id.clone() }.save(&ctx.session_path())?;
    info!(user_id = %user.id, "logged in");
    println!("Logged in as {}", user.name);
    Ok(())
}

/// End the session.
pub fn cmd_logout(ctx: &Context) -> Result<()> {
    if Session::clear(&ctx.session_path())? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

/// Print the logged-in user.
pub fn cmd_whoami(ctx: &Context) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let name = store.db().user(&user_id).map(|u| u.name.as_str()).unwrap_or_default();
    println!("{user_id} ({name})");
    Ok(())
}

/// Add a new task for the logged-in user.
pub fn cmd_add(
    ctx: &Context,
    title: String,
    urgency: Urgency,
    importance: Importance,
    due: Option<String>,
    impact: Option<String>,
    frequency: Frequency,
) -> Result<()> {
    let (mut store, user_id) = ctx.authed()?;
    let today = ctx.today();
    let draft = TaskDraft {
        user_id,
        title: validate_title(&title)?,
        urgency,
        importance,
        due_date: due.as_deref().map(|s| parse_due(s, today)).transpose()?,
        impact: impact.as_deref().map(parse_impact).transpose()?.unwrap_or(DEFAULT_IMPACT),
        frequency,
        recurrence_source_id: None,
        created_at_utc: ctx.clock.now().timestamp(),
    };
    let id = store.insert_task(draft)?;
    info!(task_id = id, "added task");
    println!("Added task {id}");
    Ok(())
}

/// Order scored tasks for display.
pub fn sort_scored(items: &mut [&ScoredTask], key: SortKey) {
    match key {
        // Ranker order is already priority order.
        SortKey::Priority => {}
        SortKey::Due => items.sort_by_key(|s| (s.task.due_date.is_none(), s.task.due_date, s.task.id)),
        SortKey::Id => items.sort_by_key(|s| s.task.id),
    }
}

/// List the user's tasks with their priority.
pub fn cmd_list(ctx: &Context, all: bool, sort: SortKey, quadrant: Option<Quadrant>, matrix: bool) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let today = ctx.today();
    let ranking = ctx.ranking_for(&store, &user_id)?;
    let suggested = ranking.suggested_ids();

    if matrix {
        print_matrix(&ranking, &suggested, sort, today);
    } else {
        let mut rows: Vec<&ScoredTask> = ranking
            .ranked
            .iter()
            .filter(|s| quadrant.map_or(true, |q| s.task.quadrant() == q))
            .collect();
        sort_scored(&mut rows, sort);
        if rows.is_empty() {
            println!("No open tasks.");
        } else {
            print_table(&rows, &suggested, today);
        }
    }

    if all {
        let mut done: Vec<&Task> = store
            .db()
            .tasks_for_user(&user_id)
            .into_iter()
            .filter(|t| t.completed && quadrant.map_or(true, |q| t.quadrant() == q))
            .collect();
        done.sort_by_key(|t| t.id);
        if !done.is_empty() {
            println!("\nCompleted:");
            print_plain_table(&done, today);
        }
    }
    Ok(())
}

fn print_matrix(ranking: &Ranking, suggested: &HashSet<u64>, sort: SortKey, today: NaiveDate) {
    for (_, (q, mut tasks)) in ranking.by_quadrant() {
        println!("== {} ({}) ==", format_quadrant(q), tasks.len());
        if tasks.is_empty() {
            println!("  -");
        } else {
            sort_scored(&mut tasks, sort);
            print_table(&tasks, suggested, today);
        }
        println!();
    }
}

/// Show the ranker's suggestions.
pub fn cmd_suggest(ctx: &Context) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let ranking = ctx.ranking_for(&store, &user_id)?;
    if ranking.suggested.is_empty() {
        println!("Nothing to suggest: no open tasks.");
        return Ok(());
    }
    let rows: Vec<&ScoredTask> = ranking.suggested.iter().collect();
    print_table(&rows, &ranking.suggested_ids(), ctx.today());
    Ok(())
}

/// View detailed information about a task.
pub fn cmd_view(ctx: &Context, id: u64) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let Some(task) = store.find_task(id, &user_id)? else {
        println!("Task {id} not found.");
        return Ok(());
    };
    let today = ctx.today();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Quadrant:     {}", format_quadrant(task.quadrant()));
    println!("Urgency:      {}", format_urgency(task.urgency));
    println!("Importance:   {}", format_importance(task.importance));
    println!("Due:          {}", match task.due_date {
        Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
        None => "-".into(),
    });
    println!("Impact:       {}", task.impact);
    println!("Repeats:      {}", format_frequency(task.frequency));
    println!("Completed:    {}", match task.completed_at_utc {
        Some(ts) if task.completed => timestamp_to_datetime(ts).to_rfc3339(),
        _ if task.completed => "yes".into(),
        _ => "no".into(),
    });
    println!("Created UTC:  {}", timestamp_to_datetime(task.created_at_utc).to_rfc3339());
    if let Some(src) = task.recurrence_source_id {
        println!("Follows:      #{src}");
    }
    if !task.completed {
        let ranking = ctx.ranking_for(&store, &user_id)?;
        if let Some(s) = ranking.ranked.iter().find(|s| s.task.id == id) {
            let star = if ranking.is_suggested(id) { " (suggested)" } else { "" };
            println!("Priority:     {:.2}{star}", s.priority);
            println!("Days left:    {}", s.days_until_due);
        }
    }
    Ok(())
}

/// Turn edit flags into a validated patch.
#[allow(clippy::too_many_arguments)]
pub fn build_patch(
    title: Option<String>,
    urgency: Option<Urgency>,
    importance: Option<Importance>,
    due: Option<String>,
    clear_due: bool,
    impact: Option<String>,
    frequency: Option<Frequency>,
    today: NaiveDate,
) -> Result<TaskPatch> {
    let due_date = if clear_due {
        Some(None)
    } else {
        due.as_deref().map(|s| parse_due(s, today).map(Some)).transpose()?
    };
    Ok(TaskPatch {
        title: title.as_deref().map(validate_title).transpose()?,
        urgency,
        importance,
        due_date,
        impact: impact.as_deref().map(parse_impact).transpose()?,
        frequency,
    })
}

/// Update fields on a task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    ctx: &Context,
    id: u64,
    title: Option<String>,
    urgency: Option<Urgency>,
    importance: Option<Importance>,
    due: Option<String>,
    clear_due: bool,
    impact: Option<String>,
    frequency: Option<Frequency>,
) -> Result<()> {
    let patch = build_patch(title, urgency, importance, due, clear_due, impact, frequency, ctx.today())?;
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    let (mut store, user_id) = ctx.authed()?;
    if store.write(|db| db.edit_task(id, &user_id, &patch))? == 0 {
        println!("Task {id} not found.");
    } else {
        info!(task_id = id, "edited task");
        println!("Updated {id}");
    }
    Ok(())
}

/// Flip completion; completing a recurring task creates its successor.
pub fn cmd_toggle(ctx: &Context, id: u64) -> Result<()> {
    let (mut store, user_id) = ctx.authed()?;
    let outcome = toggle_completion(&mut store, ctx.clock.as_ref(), &ctx.config.recurrence.policy, &user_id, id)?;
    let Some(outcome) = outcome else {
        println!("Task {id} not found.");
        return Ok(());
    };
    if outcome.completed {
        println!("Completed {id}");
    } else {
        println!("Reopened {id}");
    }
    if let Some(next) = outcome.successor {
        let due = next.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!("Next occurrence: task {} due {due}", next.id);
    }
    Ok(())
}

/// Delete a task.
pub fn cmd_delete(ctx: &Context, id: u64) -> Result<()> {
    let (mut store, user_id) = ctx.authed()?;
    if store.write(|db| db.delete_task(id, &user_id))? == 0 {
        println!("Task {id} not found.");
    } else {
        info!(task_id = id, "deleted task");
        println!("Deleted {id}");
    }
    Ok(())
}

/// Search task titles.
pub fn cmd_search(ctx: &Context, query: String) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let hits = store.db().search(&user_id, &query);
    if hits.is_empty() {
        println!("No tasks match '{query}'.");
    } else {
        print_plain_table(&hits, ctx.today());
    }
    Ok(())
}

/// Completed tasks within a window.
pub fn cmd_report(ctx: &Context, start: Option<String>, end: Option<String>) -> Result<()> {
    let today = ctx.today();
    let start = start.as_deref().map(|s| parse_due(s, today)).transpose()?;
    let end = end.as_deref().map(|s| parse_due(s, today)).transpose()?;
    let (store, user_id) = ctx.authed()?;
    let offset = ctx.clock.offset();
    let done = completion_report(store.db().tasks_for_user(&user_id), start, end, offset);
    if done.is_empty() {
        println!("No completed tasks in range.");
        return Ok(());
    }
    println!("{:<5} {:<12} {:<10} {}", "ID", "Completed", "Quadrant", "Title");
    for t in &done {
        println!(
            "{:<5} {:<12} {:<10} {}",
            t.id,
            t.completion_date(offset),
            format_quadrant(t.quadrant()),
            truncate(&t.title, 60)
        );
    }
    println!("{} task(s) completed.", done.len());
    Ok(())
}

/// Weekly check-in summary.
pub fn cmd_checkin(ctx: &Context) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let today = ctx.today();
    let offset = ctx.clock.offset();
    let tasks: Vec<Task> = store
        .db()
        .tasks_for_user(&user_id)
        .into_iter()
        .filter(|t| t.created_date(offset) <= today)
        .cloned()
        .collect();
    let window = ctx.config.checkin.window_days;
    let c = weekly_checkin(&tasks, today, offset, window, &ctx.config.ranking);

    println!("Completed in the last {window} days: {}", c.completed.len());
    for t in &c.completed {
        println!("  #{:<4} {} ({})", t.id, t.title, t.completion_date(offset));
    }
    println!("Overdue: {}", c.overdue.len());
    for t in &c.overdue {
        println!("  #{:<4} {} ({})", t.id, t.title, format_due_relative(t.due_date, today));
    }
    println!("Due in the next {window} days: {}", c.upcoming.len());
    for t in &c.upcoming {
        println!("  #{:<4} {} ({})", t.id, t.title, format_due_relative(t.due_date, today));
    }
    println!("Suggested focus:");
    if c.ranking.suggested.is_empty() {
        println!("  -");
    }
    for s in &c.ranking.suggested {
        println!("  #{:<4} {} [{:.2}]", s.task.id, s.task.title, s.priority);
    }
    Ok(())
}

/// One catch-up pass of the recurrence sweep.
pub fn cmd_sweep(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let report = sweep_store(&mut store, ctx.clock.as_ref(), &ctx.config.recurrence.policy)?;
    println!(
        "Examined {} recurring task(s), created {} successor(s), {} already scheduled.",
        report.examined,
        report.regenerated.len(),
        report.already_regenerated
    );
    for (source, successor) in &report.regenerated {
        println!("  #{source} -> #{successor}");
    }
    Ok(())
}

/// Run the sweep daemon in the foreground.
pub fn cmd_daemon(ctx: &Context) -> Result<()> {
    let interval = Duration::from_secs(ctx.config.recurrence.sweep_interval_secs);
    let mut scheduler = SweepScheduler::new(
        &ctx.db_path,
        Arc::clone(&ctx.clock),
        ctx.config.recurrence.policy,
        interval,
    );
    if ctx.config.reminders.enabled {
        scheduler = scheduler.with_notifier(Box::new(LogNotifier));
    }
    scheduler.run_blocking()
}

/// Register a push endpoint.
pub fn cmd_subscribe(ctx: &Context, endpoint: String) -> Result<()> {
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        return Err(Error::InvalidTask("endpoint must not be empty".into()));
    }
    let (mut store, user_id) = ctx.authed()?;
    let sub = Subscription {
        user_id,
        endpoint: endpoint.clone(),
        created_at_utc: ctx.clock.now().timestamp(),
    };
    if store.write(|db| db.add_subscription(sub))? {
        println!("Subscribed {endpoint}");
    } else {
        println!("Already subscribed.");
    }
    Ok(())
}

/// Drop every endpoint of the user.
pub fn cmd_unsubscribe(ctx: &Context) -> Result<()> {
    let (mut store, user_id) = ctx.authed()?;
    let removed = store.write(|db| db.remove_subscriptions(&user_id))?;
    println!("Removed {removed} subscription(s).");
    Ok(())
}

/// Push an overdue reminder to the user's endpoints now.
pub fn cmd_remind(ctx: &Context) -> Result<()> {
    let (store, user_id) = ctx.authed()?;
    let today = ctx.today();
    let open = store.load_open_tasks(&user_id, today, ctx.clock.offset())?;
    let Some(reminder) = build_reminder(&open, today) else {
        println!("No overdue tasks.");
        return Ok(());
    };
    let subs = store.db().subscriptions_for(&user_id);
    if subs.is_empty() {
        println!("{}", reminder.body);
        println!("No push endpoints registered; use `prio subscribe <endpoint>`.");
        return Ok(());
    }
    let sent = send_to_all(&LogNotifier, &subs, &reminder);
    println!("Sent {sent} of {} reminder(s).", subs.len());
    Ok(())
}

/// Launch the matrix TUI.
pub fn cmd_ui(ctx: &Context) -> Result<()> {
    let (_, user_id) = ctx.authed()?;
    run_tui(ctx, &user_id)
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Database file used when `--db` is not given.
pub fn default_db_path(config: &Config) -> PathBuf {
    config.data_dir().join("tasks.json")
}

/// Create the directory holding `db_path` if needed.
pub fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::priority::RankingPolicy;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn task(id: u64, due: Option<NaiveDate>, impact: u32) -> Task {
        Task {
            id,
            user_id: "alice".into(),
            title: format!("t{id}"),
            urgency: Urgency::Urgent,
            importance: Importance::Important,
            due_date: due,
            impact,
            frequency: Frequency::None,
            completed: false,
            completed_at_utc: None,
            recurrence_source_id: None,
            regenerated: false,
            created_at_utc: 0,
        }
    }

    #[test]
    fn password_is_one_line_without_terminator() {
        let mut input = io::Cursor::new("s3cret pass\r\nignored\n");
        assert_eq!(read_password_from(&mut input).unwrap(), "s3cret pass");

        let mut empty = io::Cursor::new("\n");
        assert!(read_password_from(&mut empty).is_err());
    }

    #[test]
    fn patch_from_flags() {
        let today = d(2025, 4, 7);
        let p = build_patch(Some("  New ".into()), None, Some(Importance::NotImportant), Some("tomorrow".into()), false, Some("8".into()), None, today)
            .unwrap();
        assert_eq!(p.title.as_deref(), Some("New"));
        assert_eq!(p.due_date, Some(Some(d(2025, 4, 8))));
        assert_eq!(p.impact, Some(8));
        assert_eq!(p.importance, Some(Importance::NotImportant));

        let cleared = build_patch(None, None, None, None, true, None, None, today).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        assert!(build_patch(None, None, None, None, false, None, None, today).unwrap().is_empty());
        assert!(build_patch(Some("   ".into()), None, None, None, false, None, None, today).is_err());
        assert!(build_patch(None, None, None, None, false, Some("-1".into()), None, today).is_err());
        assert!(build_patch(None, None, None, Some("someday".into()), false, None, None, today).is_err());
    }

    #[test]
    fn sort_keys_reorder_ranked_rows() {
        let today = d(2025, 4, 7);
        let ranking = rank(
            vec![task(1, None, 9), task(2, Some(d(2025, 4, 20)), 1), task(3, Some(d(2025, 4, 8)), 5)],
            today,
            &RankingPolicy::default(),
        );
        let ids = |rows: &[&ScoredTask]| rows.iter().map(|s| s.task.id).collect::<Vec<_>>();

        let mut rows: Vec<&ScoredTask> = ranking.ranked.iter().collect();
        sort_scored(&mut rows, SortKey::Priority);
        assert_eq!(ids(&rows), vec![3, 1, 2]);

        sort_scored(&mut rows, SortKey::Due);
        assert_eq!(ids(&rows), vec![3, 2, 1]);

        sort_scored(&mut rows, SortKey::Id);
        assert_eq!(ids(&rows), vec![1, 2, 3]);
    }

    #[test]
    fn commands_require_a_known_session_user() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(
            dir.path().join("tasks.json"),
            Config::default(),
            Arc::new(FixedClock::on(d(2025, 4, 7))),
        );
        assert!(matches!(ctx.authed(), Err(Error::NotLoggedIn)));

        Session { user_id: "ghost".into() }.save(&ctx.session_path()).unwrap();
        assert!(matches!(ctx.authed(), Err(Error::NotLoggedIn)));

        let mut store = ctx.open_store().unwrap();
        store.write(|db| register(db, "ghost", "Ghost", "pw")).unwrap().unwrap();
        let (_, user) = ctx.authed().unwrap();
        assert_eq!(user, "ghost");
    }

    #[test]
    fn default_db_path_uses_configured_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/srv/prio"));
        assert_eq!(default_db_path(&config), PathBuf::from("/srv/prio/tasks.json"));
    }
}
