use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::cli::commands::*;
use crate::cli::dates::{day_or_today, parse_day_arg};
use crate::cli::output::*;
use crate::io::folder::{self, abbreviate_path};
use crate::io::recovery;
use crate::io::settings_io;
use crate::io::store::FolderStore;
use crate::io::watcher::FolderWatcher;
use crate::ops::search;
use crate::ops::timeline::TimelineManager;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Global flags shared by every command
struct Context {
    json: bool,
    dir: Option<PathBuf>,
    settings_path: PathBuf,
}

/// The storage folder chosen for this run
struct ResolvedFolder {
    path: PathBuf,
    fell_back: bool,
    notice: Option<String>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context {
        json: cli.json,
        dir: cli.dir.map(PathBuf::from),
        settings_path: cli
            .settings
            .map(PathBuf::from)
            .unwrap_or_else(settings_io::settings_path),
    };

    match cli.command {
        None => cmd_show(&ctx, ShowArgs::default()),
        Some(cmd) => match cmd {
            // Read commands
            Commands::Show(args) => cmd_show(&ctx, args),
            Commands::Timeline(args) => cmd_timeline(&ctx, args),
            Commands::Search(args) => cmd_search(&ctx, args),
            Commands::Watch(args) => cmd_watch(&ctx, args),

            // Write commands
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Done(args) => cmd_done(&ctx, args),
            Commands::Undo(args) => cmd_undo(&ctx, args),
            Commands::Rm(args) => cmd_rm(&ctx, args),

            // Storage
            Commands::Folder(args) => cmd_folder(&ctx, args),
            Commands::Recovery(args) => cmd_recovery(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Pick the storage folder: `-C` wins, otherwise the remembered folder with
/// fallback to the default.
fn resolve_folder(ctx: &Context) -> Result<ResolvedFolder, Box<dyn std::error::Error>> {
    if let Some(ref dir) = ctx.dir {
        let path = folder::validate_folder(dir)?;
        return Ok(ResolvedFolder {
            path,
            fell_back: false,
            notice: None,
        });
    }

    let default = folder::default_folder();
    let resolution = folder::resolve_folder(&ctx.settings_path, &default)?;
    let notice = resolution.notice.map(|e| e.to_string());
    if let Some(ref msg) = notice {
        eprintln!(
            "warning: {}; using default folder {}",
            msg,
            abbreviate_path(&resolution.folder)
        );
    }
    Ok(ResolvedFolder {
        path: resolution.folder,
        fell_back: resolution.fell_back,
        notice,
    })
}

/// Build the store and timeline for this run and load everything.
fn open_timeline(ctx: &Context) -> Result<TimelineManager<FolderStore>, Box<dyn std::error::Error>> {
    let settings = settings_io::read_settings_from(&ctx.settings_path);
    let resolved = resolve_folder(ctx)?;

    let store = FolderStore::new(&resolved.path).with_active_file(&settings.storage.active_file);
    let mut manager =
        TimelineManager::new(store, today()).with_window_days(settings.timeline.window_days);
    if resolved.fell_back {
        manager.flag_fallback(resolved.notice.unwrap_or_default());
    }
    manager.load_data();
    Ok(manager)
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_day(ctx: &Context, manager: &TimelineManager<FolderStore>, day: NaiveDate) -> CmdResult {
    let todos = manager.todos_for_date(day);
    if ctx.json {
        return print_json(&day_to_json(day, manager.today(), &todos));
    }
    print!("{}", render_day(day, manager.today(), &todos));
    Ok(())
}

/// Convert a 1-based number from the day view into an index.
fn index_of(number: usize, len: usize, what: &str, day: NaiveDate) -> Result<usize, String> {
    if number == 0 || number > len {
        return Err(format!(
            "no {} todo #{} on {} (there are {})",
            what,
            number,
            day.format("%Y-%m-%d"),
            len
        ));
    }
    Ok(number - 1)
}

/// The active file stores no dates, so open todos only ever appear under
/// today once a command exits. Refuse days where they would be lost.
fn check_open_day(day: NaiveDate, today: NaiveDate, allow_past: bool) -> Result<(), String> {
    if day > today {
        return Err(format!(
            "open todos are kept without a date and show under today; cannot use {}",
            day.format("%Y-%m-%d")
        ));
    }
    if day < today && !allow_past {
        return Err(format!(
            "no open todos on {}: unfinished todos are listed under today",
            day.format("%Y-%m-%d")
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(ctx: &Context, args: ShowArgs) -> CmdResult {
    let manager = open_timeline(ctx)?;
    let day = day_or_today(args.date.as_deref(), manager.today())?;
    print_day(ctx, &manager, day)
}

fn cmd_timeline(ctx: &Context, args: TimelineArgs) -> CmdResult {
    let manager = open_timeline(ctx)?;
    let today = manager.today();

    let rows: Vec<TimelineDayJson> = manager
        .visible_dates()
        .iter()
        .map(|&day| {
            let todos = manager.todos_for_date(day);
            TimelineDayJson {
                date: day,
                today: day == today,
                active: todos.active.len(),
                completed: todos.completed.len(),
            }
        })
        .filter(|row| args.all || row.today || row.active > 0 || row.completed > 0)
        .collect();

    if ctx.json {
        return print_json(&rows);
    }
    for row in &rows {
        println!(
            "{}",
            render_timeline_row(row.date, today, row.active, row.completed)
        );
    }
    Ok(())
}

fn cmd_search(ctx: &Context, args: SearchArgs) -> CmdResult {
    let re = Regex::new(&args.pattern)
        .map_err(|e| format!("invalid pattern '{}': {}", args.pattern, e))?;
    let manager = open_timeline(ctx)?;
    let hits = search::search_todos(&re, manager.active(), manager.completed_by_date());

    if ctx.json {
        let items: Vec<SearchHitJson> = hits.iter().map(search_hit_to_json).collect();
        return print_json(&items);
    }
    if hits.is_empty() {
        println!("No matches.");
    }
    for hit in &hits {
        println!("{}", render_search_hit(hit));
    }
    Ok(())
}

fn cmd_watch(ctx: &Context, args: ShowArgs) -> CmdResult {
    let mut manager = open_timeline(ctx)?;
    let watched = std::fs::canonicalize(manager.store().folder())?;
    let watcher = FolderWatcher::start(&watched)?;

    print_day(ctx, &manager, day_or_today(args.date.as_deref(), manager.today())?)?;
    loop {
        if watcher.wait().is_empty() {
            return Ok(());
        }
        manager.set_today(today());
        manager.load_data();

        let day = day_or_today(args.date.as_deref(), manager.today())?;
        println!();
        print_day(ctx, &manager, day)?;
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let mut manager = open_timeline(ctx)?;
    let day = day_or_today(args.date.as_deref(), manager.today())?;
    check_open_day(day, manager.today(), true)?;
    manager.add_todo(&args.title, day)?;
    if !ctx.json {
        println!(
            "Added \"{}\" to {}",
            args.title.trim(),
            day_heading(manager.today(), manager.today())
        );
        return Ok(());
    }
    print_day(ctx, &manager, manager.today())
}

fn cmd_done(ctx: &Context, args: ItemArgs) -> CmdResult {
    let mut manager = open_timeline(ctx)?;
    let day = day_or_today(args.date.as_deref(), manager.today())?;
    check_open_day(day, manager.today(), false)?;

    let (id, title) = {
        let todos = manager.todos_for_date(day);
        let idx = index_of(args.number, todos.active.len(), "open", day)?;
        (todos.active[idx].id, todos.active[idx].title.clone())
    };
    manager.complete_todo(id, day)?;
    if !ctx.json {
        println!("Done: {}", title);
        return Ok(());
    }
    print_day(ctx, &manager, day)
}

fn cmd_undo(ctx: &Context, args: ItemArgs) -> CmdResult {
    let mut manager = open_timeline(ctx)?;
    let day = day_or_today(args.date.as_deref(), manager.today())?;

    let (id, title) = {
        let todos = manager.todos_for_date(day);
        let idx = index_of(args.number, todos.completed.len(), "completed", day)?;
        (todos.completed[idx].id, todos.completed[idx].title.clone())
    };
    manager.undo_completed_todo(id, day)?;
    if !ctx.json {
        println!("Reopened: {}", title);
        return Ok(());
    }
    print_day(ctx, &manager, day)
}

fn cmd_rm(ctx: &Context, args: RmArgs) -> CmdResult {
    let mut manager = open_timeline(ctx)?;
    let day = day_or_today(args.date.as_deref(), manager.today())?;
    if !args.completed {
        check_open_day(day, manager.today(), false)?;
    }

    let (id, title) = {
        let todos = manager.todos_for_date(day);
        let item = if args.completed {
            let idx = index_of(args.number, todos.completed.len(), "completed", day)?;
            &todos.completed[idx]
        } else {
            let idx = index_of(args.number, todos.active.len(), "open", day)?;
            todos.active[idx]
        };
        (item.id, item.title.clone())
    };
    manager.delete_todo(id, day)?;
    if !ctx.json {
        println!("Deleted: {}", title);
        return Ok(());
    }
    print_day(ctx, &manager, day)
}

// ---------------------------------------------------------------------------
// Storage folder
// ---------------------------------------------------------------------------

fn cmd_folder(ctx: &Context, args: FolderCmd) -> CmdResult {
    match args.action {
        None | Some(FolderAction::Show) => cmd_folder_show(ctx),
        Some(FolderAction::Set(a)) => cmd_folder_set(ctx, a),
        Some(FolderAction::Reset) => cmd_folder_reset(ctx),
    }
}

fn cmd_folder_show(ctx: &Context) -> CmdResult {
    let resolved = resolve_folder(ctx)?;
    if ctx.json {
        return print_json(&FolderJson {
            folder: resolved.path.to_string_lossy().to_string(),
            fell_back: resolved.fell_back,
            notice: resolved.notice,
        });
    }
    println!("{}", resolved.path.display());
    Ok(())
}

fn cmd_folder_set(ctx: &Context, args: FolderSetArgs) -> CmdResult {
    let folder = folder::change_folder(&ctx.settings_path, Path::new(&args.path))?;
    if ctx.json {
        return print_json(&FolderJson {
            folder: folder.to_string_lossy().to_string(),
            fell_back: false,
            notice: None,
        });
    }
    println!("Storage folder: {}", abbreviate_path(&folder));
    Ok(())
}

fn cmd_folder_reset(ctx: &Context) -> CmdResult {
    folder::reset_folder(&ctx.settings_path)?;
    let default = folder::default_folder();
    if ctx.json {
        return print_json(&FolderJson {
            folder: default.to_string_lossy().to_string(),
            fell_back: false,
            notice: None,
        });
    }
    println!("Storage folder: {} (default)", abbreviate_path(&default));
    Ok(())
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> CmdResult {
    let resolved = resolve_folder(ctx)?;
    let folder = resolved.path;

    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&folder).display());
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = match prune.before {
                Some(ref s) => {
                    let day = parse_day_arg(s, today())?;
                    let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();
                    Some(Utc.from_utc_datetime(&midnight))
                }
                None => None,
            };
            let removed = recovery::prune_recovery(&folder, before, prune.all)?;
            println!("Pruned {} recovery entries", removed);
            Ok(())
        }
        None => {
            let entries = recovery::read_recovery_entries(&folder, Some(args.limit.unwrap_or(10)));
            if ctx.json {
                let items: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                return print_json(&items);
            }
            if entries.is_empty() {
                println!("No recovery entries.");
            }
            for entry in &entries {
                print!("{}", render_recovery_entry(entry));
            }
            Ok(())
        }
    }
}
