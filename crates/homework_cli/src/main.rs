use clap::{CommandFactory, Parser};
use homework_cli::cli::{Cli, Command, ResetKind, collect_config_overrides};
use homework_cli::session::Session;
use homework_core::config::{load_config_with_fallback, merge_overrides};
use homework_core::error::AppError;
use homework_core::model::catalog::{self, TaskKind};
use homework_core::model::{Character, DailyState, DualField};
use homework_core::notify::notifier_from_env;
use homework_core::storage::json_store;
use homework_core::{TaskStore, TaskView};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;

#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn mark(done: bool) -> &'static str {
    if done { "done" } else { "-" }
}

fn status_label(state: DailyState) -> String {
    match state {
        DailyState::Counted { remaining, max } => format!("{remaining}/{max} left"),
        DailyState::Done(done) => mark(done).to_string(),
        DailyState::Shared(done) => format!("{} (shared)", mark(done)),
        DailyState::DualState(tower) => format!(
            "daily: {} / weekly: {}",
            mark(tower.daily_done),
            mark(tower.weekly_complete)
        ),
    }
}

fn print_board(character: &Character) {
    let daily: Vec<BoardRow> = character
        .daily_tasks()
        .map(|(def, state)| BoardRow {
            task: def.label.to_string(),
            id: def.id.to_string(),
            status: status_label(state),
        })
        .collect();
    let weekly: Vec<BoardRow> = character
        .weekly_tasks()
        .map(|(def, done)| BoardRow {
            task: def.label.to_string(),
            id: def.id.to_string(),
            status: mark(done).to_string(),
        })
        .collect();

    println!("== {} ==", character.name());
    println!("DAILY");
    println!("{}", Table::new(daily).with(Style::rounded()));
    println!("WEEKLY");
    println!("{}", Table::new(weekly).with(Style::rounded()));
}

fn print_roster_plain(store: &TaskStore) {
    let selected = store.selected_character().map(Character::name);
    for character in store.characters() {
        let prefix = if selected == Some(character.name()) {
            "[SELECTED] "
        } else {
            ""
        };
        println!("{}{}", prefix, character.name());
    }
}

fn print_roster_json(store: &TaskStore) {
    let selected = store.selected_character().map(Character::name);
    let payload: Vec<serde_json::Value> = store
        .characters()
        .iter()
        .map(|character| {
            serde_json::json!({
                "name": character.name(),
                "selected": selected == Some(character.name()),
            })
        })
        .collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn task_label(task: &str) -> &str {
    catalog::find_task(task).map_or(task, |def| def.label)
}

fn task_max(task: &str) -> u32 {
    match catalog::find_task(task).map(|def| def.kind) {
        Some(TaskKind::Counted { max }) => max,
        _ => 0,
    }
}

/// Resolves an explicit character name, or the selected one when omitted.
fn target(store: &TaskStore, character: Option<&str>) -> Result<String, AppError> {
    match character {
        Some(name) => Ok(store.character(name)?.name().to_string()),
        None => store
            .selected_character()
            .map(|character| character.name().to_string())
            .ok_or_else(|| AppError::not_found("no characters")),
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn build_session(cli: &Cli) -> Result<Session, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "config ignored, using defaults");
    }

    let overrides = collect_config_overrides(&cli.config_override)?;
    let config = merge_overrides(&loaded.config, &overrides);
    let schedule = config.schedule()?;
    let store_path = json_store::store_path()?;
    let notifier = notifier_from_env()?;

    Ok(Session::new(store_path, schedule, notifier))
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let session = build_session(&cli)?;
    let now = OffsetDateTime::now_utc();

    match cli.command {
        Command::Add { name } => {
            let Some(name) = name else {
                return Err(AppError::invalid_input("name is required"));
            };

            let added = session.run(now, |store| store.add_character(&name))?.value;
            if cli.json {
                println!("{}", serde_json::json!({ "name": added }));
            } else {
                println!("Added character: {added}");
            }
        }
        Command::Rename { old_name, new_name } => {
            let renamed = session
                .run(now, |store| store.rename_character(&old_name, &new_name))?
                .value;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "old_name": old_name.trim(), "name": renamed })
                );
            } else {
                println!("Renamed character: {} -> {}", old_name.trim(), renamed);
            }
        }
        Command::Remove { name } => {
            let removed = session.run(now, |store| store.remove_character(&name))?.value;
            if cli.json {
                println!("{}", json_store::character_json(&removed));
            } else {
                println!("Removed character: {}", removed.name());
            }
        }
        Command::Select { name } => {
            let selected = session
                .run(now, |store| {
                    store
                        .select_character(&name)
                        .map(|character| character.name().to_string())
                })?
                .value;
            if cli.json {
                println!("{}", serde_json::json!({ "name": selected }));
            } else {
                println!("Selected character: {selected}");
            }
        }
        Command::Roster => {
            let store = session.run(now, |store| Ok(store.clone()))?.value;
            if cli.json {
                print_roster_json(&store);
            } else if store.characters().is_empty() {
                println!("No characters");
            } else {
                print_roster_plain(&store);
            }
        }
        Command::Show { name } => {
            let character = session
                .run(now, |store| match store.board(name.as_deref())? {
                    TaskView::Board(character) => Ok(Some(character.clone())),
                    TaskView::NoCharacters => Ok(None),
                })?
                .value;
            match (character, cli.json) {
                (Some(character), true) => println!("{}", json_store::character_json(&character)),
                (Some(character), false) => print_board(&character),
                (None, true) => println!("null"),
                (None, false) => println!("No characters"),
            }
        }
        Command::Toggle { task, character } => {
            let (name, done) = session
                .run(now, |store| {
                    let name = target(store, character.as_deref())?;
                    let done = store.toggle_bool_task(&name, &task)?;
                    Ok((name, done))
                })?
                .value;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "character": name, "task": task.trim(), "done": done })
                );
            } else {
                println!("{}: {} ({})", task_label(&task), mark(done), name);
            }
        }
        Command::Use { task, character } => {
            let (name, remaining) = session
                .run(now, |store| {
                    let name = target(store, character.as_deref())?;
                    let remaining = store.decrement_counted_task(&name, &task)?;
                    Ok((name, remaining))
                })?
                .value;
            print_counted(cli.json, &name, &task, remaining);
        }
        Command::Undo { task, character } => {
            let (name, remaining) = session
                .run(now, |store| {
                    let name = target(store, character.as_deref())?;
                    let remaining = store.increment_counted_task(&name, &task)?;
                    Ok((name, remaining))
                })?
                .value;
            print_counted(cli.json, &name, &task, remaining);
        }
        Command::Guild { state } => {
            let value = state.enabled();
            session.run(now, |store| {
                store.set_shared_task(value);
                Ok(())
            })?;
            if cli.json {
                println!("{}", serde_json::json!({ "guildAttendance": value }));
            } else {
                println!(
                    "{}: {} (all characters)",
                    task_label(catalog::GUILD_ATTENDANCE),
                    mark(value)
                );
            }
        }
        Command::Tower {
            field,
            state,
            character,
        } => {
            let field = DualField::from(field);
            let (name, tower) = session
                .run(now, |store| {
                    let name = target(store, character.as_deref())?;
                    let tower = store.set_dual_state(&name, field, state.enabled())?;
                    Ok((name, tower))
                })?
                .value;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "character": name,
                        "dailyDone": tower.daily_done,
                        "weeklyComplete": tower.weekly_complete,
                    })
                );
            } else {
                println!(
                    "{} {}: {} ({})",
                    task_label(catalog::SPECTRAL_TOWER),
                    field.key(),
                    mark(state.enabled()),
                    name
                );
            }
        }
        Command::Reset { kind } => {
            session.run(now, |store| {
                match kind {
                    ResetKind::Daily => store.manual_daily_reset(now),
                    ResetKind::Weekly => store.manual_weekly_reset(now),
                }
                Ok(())
            })?;
            let (key, message) = match kind {
                ResetKind::Daily => ("daily", "일일 숙제가 초기화되었습니다."),
                ResetKind::Weekly => ("weekly", "주간 숙제가 초기화되었습니다."),
            };
            if cli.json {
                println!("{}", serde_json::json!({ "reset": key }));
            } else {
                println!("{message}");
            }
        }
        Command::Check => {
            let resets = session.run(now, |_| Ok(()))?.resets;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "daily": resets.daily, "weekly": resets.weekly })
                );
            } else if !resets.fired() {
                println!("No reset due");
            }
        }
        Command::Export { output } => {
            let document = session.run(now, |store| Ok(store.serialize()))?.value;
            match output {
                Some(path) => {
                    json_store::write_document(&path, &document)?;
                    if cli.json {
                        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
                    } else {
                        println!("Exported roster to {}", path.display());
                    }
                }
                None => {
                    let content = serde_json::to_string_pretty(&document)
                        .map_err(|err| AppError::malformed_data(err.to_string()))?;
                    println!("{content}");
                }
            }
        }
        Command::Import { path } => {
            let document = json_store::read_document(&path)?;
            let imported = TaskStore::deserialize(&document, session.schedule())?;
            let outcome = session.run(now, |store| {
                *store = imported;
                Ok((store.check_and_apply_resets(now), store.characters().len()))
            })?;
            let (resets, count) = outcome.value;
            session.announce(resets);
            if cli.json {
                println!("{}", serde_json::json!({ "characters": count }));
            } else {
                println!("Imported {count} characters");
            }
        }
    }

    Ok(())
}

fn print_counted(json: bool, name: &str, task: &str, remaining: u32) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "character": name, "task": task.trim(), "remaining": remaining })
        );
    } else {
        println!(
            "{}: {}/{} left ({})",
            task_label(task),
            remaining,
            task_max(task),
            name
        );
    }
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("homework".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("HOMEWORK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if !err.use_stderr() {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
