use clap::{CommandFactory, Parser};
use crossbeam_channel::{Receiver, never, select, unbounded};
use planner_cli::cli::{Cli, Command, collect_overrides};
use planner_cli::output;
use planner_core::calendar::{self, render_month};
use planner_core::config::{self, Config, ConfigOverrides, Palette, palette_for_theme};
use planner_core::error::AppError;
use planner_core::legacy;
use planner_core::notify::{Notifier, notifier_from_env};
use planner_core::planner_api::{self, NewTask, TaskEdit};
use planner_core::reminder::{ReminderEvent, ReminderHandle};
use std::io::{self, BufRead};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "PLANNER_LOG";

struct Runtime {
    config: Config,
    palette: Palette,
}

impl Runtime {
    fn new(base: &Config, overrides: &ConfigOverrides) -> Self {
        let config = config::merge_overrides(base, overrides);
        let palette = palette_for_theme(config.theme.as_deref());
        Self { config, palette }
    }
}

fn load_base_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "using default configuration");
    }
    loaded.config
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
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

fn run_command(cli: Cli, runtime: &Runtime) -> Result<(), AppError> {
    let reminder = &runtime.config.reminder;

    match cli.command {
        Command::Add {
            title,
            date,
            time,
            priority,
            description,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let task = planner_api::add_task(NewTask {
                title,
                date,
                time,
                priority,
                description,
            })?;
            if cli.json {
                println!("{}", output::task_json(&task));
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            time,
            date,
        } => {
            let task = planner_api::edit_task(
                &id,
                TaskEdit {
                    title,
                    description,
                    priority,
                    time,
                    date,
                },
            )?;
            if cli.json {
                println!("{}", output::task_json(&task));
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = planner_api::delete_task(&id)?;
            if cli.json {
                println!("{}", output::task_json(&task));
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Done { id } => {
            let task = planner_api::complete_task(&id)?;
            if cli.json {
                println!("{}", output::task_json(&task));
            } else {
                println!("Completed task: {} ({})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = planner_api::get_task_by_id(&id)?;
            if cli.json {
                println!("{}", output::task_json(&task));
            } else {
                println!("{}", output::task_details(&task));
            }
        }
        Command::List => {
            let tasks = planner_api::list_tasks()?;
            if cli.json {
                println!("{}", output::tasks_json(&tasks));
            } else {
                println!("{}", output::tasks_table(&tasks));
            }
        }
        Command::Sort => {
            let tasks = planner_api::sort_tasks()?;
            if cli.json {
                println!("{}", output::tasks_json(&tasks));
            } else {
                println!("{}", output::tasks_table(&tasks));
            }
        }
        Command::Search { term } => {
            let tasks = planner_api::search_tasks(&term)?;
            if cli.json {
                println!("{}", output::tasks_json(&tasks));
            } else {
                println!("{}", output::tasks_table(&tasks));
            }
        }
        Command::Day { date } => {
            let day = planner_api::tasks_on_date(date)?;
            if cli.json {
                println!("{}", output::day_json(date, &day));
            } else {
                println!("{}", output::tasks_table(&day.tasks));
                if let Some(index) = day.first_index {
                    println!("First in list order: #{}", index + 1);
                }
            }
        }
        Command::Upcoming { all } => {
            let mut tasks = planner_api::upcoming_tasks(reminder.lookahead_days)?;
            if !all {
                tasks.truncate(reminder.upcoming_limit);
            }
            if cli.json {
                println!("{}", output::tasks_json(&tasks));
            } else if tasks.is_empty() {
                println!("No upcoming tasks");
            } else {
                for task in &tasks {
                    println!("{}", legacy::render_line(task));
                }
            }
        }
        Command::Today { notify } => {
            let notice = planner_api::today_summary()?;
            if notify {
                notifier_from_env()?.notify(&notice)?;
            }
            if cli.json {
                println!("{}", output::summary_json(&notice, notify));
            } else {
                println!("{}", notice.message);
            }
        }
        Command::Calendar { month } => {
            let (year, month) = match month {
                Some(raw) => calendar::parse_month(&raw)?,
                None => {
                    let today = planner_api::today();
                    (today.year(), today.month())
                }
            };
            let view = planner_api::calendar_month(year, month)?;
            if cli.json {
                println!("{}", output::month_json(&view));
            } else {
                print!("{}", render_month(&view, &runtime.palette));
            }
        }
        Command::Import { file } => {
            let outcome = planner_api::import_legacy(&file)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "imported": output::tasks_json(&outcome.imported),
                        "skipped": outcome.skipped,
                    })
                );
            } else {
                println!(
                    "Imported {} task(s), skipped {}",
                    outcome.imported.len(),
                    outcome.skipped.len()
                );
                for line in &outcome.skipped {
                    println!("Skipped: {line}");
                }
            }
        }
        Command::Notify => {
            let notice = planner_api::send_reminder(reminder.lookahead_days)?;
            if cli.json {
                println!("{}", output::notice_json(notice.as_ref()));
            } else {
                match notice {
                    Some(notice) => println!("Sent reminder: {}", notice.message.replace('\n', " ")),
                    None => println!("No tasks due today or tomorrow"),
                }
            }
        }
    }

    Ok(())
}

fn print_reminder_event(event: ReminderEvent) {
    match event {
        ReminderEvent::Delivered(notice) => {
            println!("[{}] {}", notice.title, notice.message.replace('\n', " "));
        }
        ReminderEvent::Failed { notice, error } => {
            eprintln!("ERROR: {} ({})", error, notice.title);
        }
    }
}

fn start_reminders(config: &Config) -> Option<ReminderHandle> {
    let offset = planner_api::local_offset();
    let spawned = planner_api::list_tasks().and_then(|tasks| {
        let notifier = notifier_from_env()?;
        ReminderHandle::spawn(tasks, config.reminder, offset, notifier)
    });

    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("ERROR: {}", err);
            tracing::warn!(error = %err, "reminders disabled for this session");
            None
        }
    }
}

/// Feeds stdin lines into a channel so the shell can wait on input and
/// reminder events at the same time. The channel closes at end of input.
fn spawn_line_reader() -> Result<Receiver<String>, AppError> {
    let (line_tx, line_rx) = unbounded();
    std::thread::Builder::new()
        .name("planner-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "stopped reading input");
                        break;
                    }
                }
            }
        })
        .map_err(|err| AppError::io(err.to_string()))?;
    Ok(line_rx)
}

enum ShellStep {
    Continue,
    Exit,
}

fn run_shell_line(line: &str, base: &Config, reminders: Option<&ReminderHandle>) -> ShellStep {
    let line = line.trim();
    if line.is_empty() {
        return ShellStep::Continue;
    }

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ShellStep::Exit;
    }

    if line == "help" || line == "?" {
        print_help();
        return ShellStep::Continue;
    }

    let args = match split_command_line(line) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            return ShellStep::Continue;
        }
    };

    if args.is_empty() {
        return ShellStep::Continue;
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("planner".to_string());
    argv.extend(args);

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            return ShellStep::Continue;
        }
    };

    let overrides = match collect_overrides(&cli.config_override) {
        Ok(overrides) => overrides,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            return ShellStep::Continue;
        }
    };
    let runtime = Runtime::new(base, &overrides);

    if let Err(err) = run_command(cli, &runtime) {
        eprintln!("ERROR: {}", err);
        return ShellStep::Continue;
    }

    if let Some(handle) = reminders {
        match planner_api::list_tasks() {
            Ok(tasks) => {
                if let Err(err) = handle.replace_tasks(tasks) {
                    tracing::warn!(error = %err, "could not refresh reminder snapshot");
                }
            }
            Err(err) => tracing::warn!(error = %err, "could not reload tasks for reminders"),
        }
    }

    ShellStep::Continue
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let reminders = start_reminders(base);
    let lines = spawn_line_reader()?;
    let mut events = reminders
        .as_ref()
        .map(|handle| handle.events().clone())
        .unwrap_or_else(never);

    loop {
        let mut events_closed = false;
        let step = select! {
            recv(events) -> event => {
                match event {
                    Ok(event) => print_reminder_event(event),
                    Err(_) => events_closed = true,
                }
                ShellStep::Continue
            },
            recv(lines) -> line => match line {
                Ok(line) => run_shell_line(&line, base, reminders.as_ref()),
                Err(_) => ShellStep::Exit,
            },
        };

        if events_closed {
            events = never();
        }
        if let ShellStep::Exit = step {
            break;
        }
    }

    if let Some(handle) = reminders {
        for event in handle.try_events() {
            print_reminder_event(event);
        }
        handle.shutdown()?;
    }

    Ok(())
}

fn main() {
    init_tracing();
    // Resolve the local offset while this is still the only thread.
    let _ = planner_api::local_offset();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive(&load_base_config()) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                let _ = err.print();
                return;
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let overrides = match collect_overrides(&cli.config_override) {
        Ok(overrides) => overrides,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };
    let runtime = Runtime::new(&load_base_config(), &overrides);

    if let Err(err) = run_command(cli, &runtime) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
