//! Lift Tracker
//!
//! Command line front end of the workout tracker: runs rest timers, countdowns and
//! a stopwatch in the terminal, records workouts and shows history, personal
//! records and progress, and manages templates and programs.

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use time::{macros::format_description, Duration, OffsetDateTime};
use tokio::{
    runtime::Runtime,
    sync::{broadcast, broadcast::error::RecvError, RwLock},
};

use lift_rs::{
    api::{
        controller::{ProgressionApi, SettingsApi, TemplateApi, TimerApi},
        model::TimerModelApi,
        service::WorkoutStore,
    },
    components::{
        progression::ProgressionComponent,
        reminder::TokioReminderScheduler,
        settings::SettingsComponent,
        store::DocumentStore,
        template::TemplateComponent,
        timer::{spawn_ticker, TimerComponent},
    },
    core::{
        config::AppConfig,
        constants::{DEFAULT_OVERALL_DAYS, DEFAULT_PROGRESSION_DAYS, REST_ADJUST_STEP},
        events::AppEvent,
        format::{
            format_clock, format_countdown, format_long_time, format_volume,
            format_workout_duration,
        },
    },
    model::{
        catalog::{exercises_in, find_exercise, search_exercises, Category, Exercise},
        progression::RecordKind,
        template::{ProgramGoal, WorkoutProgram},
        timer::{TimerMode, TimerModel, TimerPhase},
        workout::{SetEntry, Workout, WorkoutExercise},
    },
};

#[derive(Debug, Parser)]
#[command(name = "lift-rs", version, about = "Workout timer and progression tracker")]
struct Cli {
    /// User id, overrides LIFT_USER.
    #[arg(long, global = true)]
    user: Option<String>,
    /// Store file, overrides LIFT_STORE_PATH.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Weight unit used for display.
    #[arg(long, global = true, default_value = "kg")]
    unit: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count down from a given time.
    Timer {
        #[arg(short, long, default_value_t = 5)]
        minutes: u32,
        #[arg(short, long, default_value_t = 0)]
        seconds: u32,
    },
    /// Count up until interrupted with Ctrl-C.
    Stopwatch,
    /// Rest between sets, using the recommended rest of an exercise.
    Rest {
        /// Catalog id of the exercise.
        #[arg(short, long)]
        exercise: Option<String>,
        /// Rest length in seconds, overrides the recommendation.
        #[arg(short, long)]
        seconds: Option<u32>,
        /// Seconds added to (or, negative, taken from) the rest, in steps of 15s.
        #[arg(long, allow_negative_numbers = true, default_value_t = 0)]
        adjust: i64,
        /// Do not remember the adjusted rest for the exercise.
        #[arg(long)]
        no_remember: bool,
    },
    /// Record a finished workout of one exercise.
    Log {
        /// Catalog id of the exercise.
        #[arg(short, long)]
        exercise: String,
        /// A completed set as WEIGHTxREPS, or REPS for bodyweight sets.
        #[arg(short = 's', long = "set", required = true, value_parser = parse_set)]
        sets: Vec<SetEntry>,
        /// Name of the workout, defaults to the exercise name.
        #[arg(short, long)]
        name: Option<String>,
        /// Length of the workout in minutes.
        #[arg(short, long)]
        minutes: Option<u32>,
    },
    /// Show recent workouts and training totals.
    Workouts {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show workouts, volume and new records over a period.
    Progress {
        #[arg(short, long, default_value_t = DEFAULT_OVERALL_DAYS)]
        days: u32,
    },
    /// Show the most recent sessions of an exercise.
    History {
        #[arg(short, long)]
        exercise: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show personal records, most recent first.
    Records,
    /// Show the progress of an exercise.
    Stats {
        #[arg(short, long)]
        exercise: String,
        #[arg(short, long, default_value_t = DEFAULT_PROGRESSION_DAYS)]
        days: u32,
    },
    /// Browse the exercise catalog.
    Exercises {
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Manage workout templates.
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Manage training programs.
    Program {
        #[command(subcommand)]
        action: ProgramAction,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateAction {
    /// Save a recorded workout as a template.
    Save {
        /// Id of the recorded workout.
        #[arg(short, long)]
        workout: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// List your templates, or the most used public ones.
    List {
        #[arg(long)]
        popular: bool,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a template and count the use.
    Use { id: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ProgramAction {
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        weeks: u32,
        #[arg(long)]
        days: u32,
        #[arg(short, long, value_parser = parse_goal, default_value = "general")]
        goal: ProgramGoal,
    },
    List,
    /// Make a program the active one.
    Start { id: String },
    /// Count a finished training day of a program.
    Advance { id: String },
}

fn parse_set(raw: &str) -> Result<SetEntry, String> {
    let number_error = |e: std::num::ParseIntError| format!("invalid reps in {:?}: {}", raw, e);
    let set = match raw.split_once(['x', 'X']) {
        Some((weight, reps)) => {
            let weight: f64 = weight
                .trim()
                .parse()
                .map_err(|e| format!("invalid weight in {:?}: {}", raw, e))?;
            let reps: u32 = reps.trim().parse().map_err(number_error)?;
            SetEntry::new(weight, reps)
        }
        None => SetEntry {
            reps: Some(raw.trim().parse().map_err(number_error)?),
            completed: true,
            ..Default::default()
        },
    };
    set.validate().map_err(|e| format!("{:?}: {}", raw, e))?;
    Ok(set)
}

fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .map_err(|_| format!("unknown {} {:?}", what, raw))
}

fn parse_category(raw: &str) -> Result<Category, String> {
    parse_enum(raw, "category")
}

fn parse_goal(raw: &str) -> Result<ProgramGoal, String> {
    parse_enum(raw, "goal")
}

fn lookup_exercise(id: &str) -> Result<Exercise> {
    find_exercise(id)
        .ok_or_else(|| anyhow!("no exercise with id {:?}, see `lift-rs exercises`", id))
}

fn short_date(date: OffsetDateTime) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Main entry point of the application.
///
/// Initializes logging and configuration, then runs the requested command on a
/// Tokio runtime.
fn main() -> Result<()> {
    // Initialize logger with environment-specific settings.
    env_logger::Builder::from_env(
        Env::default()
            .filter_or("LIFT_LOG_LEVEL", "info")
            .write_style_or("LIFT_LOG_STYLE", "auto"),
    )
    .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(user) = cli.user.clone() {
        config.user_id = user;
    }
    if let Some(store) = cli.store.clone() {
        config.store_path = store;
    }

    let rt = Runtime::new().context("Unable to create Runtime")?;
    rt.block_on(run(cli, config))
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Timer { minutes, seconds } => {
            let (tx, _) = broadcast::channel(64);
            let scheduler = Arc::new(TokioReminderScheduler::new(tx.clone()));
            let mut timer = TimerComponent::new(TimerModel::default(), scheduler);
            timer.set_duration(minutes, seconds)?;
            run_timer(timer, tx, 0, format_clock).await
        }
        Command::Stopwatch => {
            let (tx, _) = broadcast::channel(64);
            let scheduler = Arc::new(TokioReminderScheduler::new(tx.clone()));
            let mut timer = TimerComponent::new(TimerModel::default(), scheduler);
            timer.set_mode(TimerMode::Stopwatch)?;
            run_timer(timer, tx, 0, format_long_time).await
        }
        Command::Rest {
            exercise,
            seconds,
            adjust,
            no_remember,
        } => {
            let exercise = exercise.as_deref().map(lookup_exercise).transpose()?;
            let settings = match &exercise {
                Some(_) => {
                    let store = open_store(&config).await?;
                    Some(SettingsComponent::new(store, &config.user_id))
                }
                None => None,
            };
            let rest = match (seconds, &exercise, &settings) {
                (Some(seconds), _, _) => seconds,
                (None, Some(exercise), Some(settings)) => settings.rest_seconds(exercise).await,
                _ => config.default_rest,
            };
            let adjust = adjust / REST_ADJUST_STEP * REST_ADJUST_STEP;
            if let (Some(exercise), Some(settings)) = (&exercise, &settings) {
                if adjust != 0 && !no_remember {
                    let adjusted = u32::try_from((i64::from(rest) + adjust).max(0))
                        .unwrap_or(u32::MAX);
                    if let Err(e) = settings.remember_rest(&exercise.id, adjusted).await {
                        warn!("Could not remember rest time: {:?}", e);
                    }
                }
            }
            let name = exercise.map_or_else(|| "your exercise".to_string(), |e| e.name);
            let (tx, _) = broadcast::channel(64);
            let scheduler = Arc::new(TokioReminderScheduler::new(tx.clone()));
            let timer = TimerComponent::rest(rest, &name, scheduler);
            run_timer(timer, tx, adjust, format_countdown).await
        }
        Command::Log {
            exercise,
            sets,
            name,
            minutes,
        } => {
            let exercise = lookup_exercise(&exercise)?;
            let tracker = ProgressionComponent::new(open_store(&config).await?, &config.user_id);
            let end = OffsetDateTime::now_utc();
            let start = end - Duration::minutes(i64::from(minutes.unwrap_or(0)));
            let name = name.unwrap_or_else(|| exercise.name.clone());
            let mut performed = WorkoutExercise::new(exercise.clone());
            performed.sets = sets;
            let mut workout =
                Workout::from_session(&config.user_id, &name, vec![performed], start, end);
            if minutes.is_none() {
                workout.duration_minutes = None;
            }
            let outcome = tracker
                .log_workout(&workout)
                .await?
                .into_iter()
                .next()
                .unwrap_or_default();
            println!("Saved workout {} ({}).", workout.name, workout.id);
            match outcome.history {
                Some(history) => println!(
                    "Logged {} sets of {}: {} total, best {:.1} {}",
                    history.sets.len(),
                    exercise.name,
                    format_volume(history.total_volume, &cli.unit),
                    history.max_weight,
                    cli.unit
                ),
                None => println!("No completed sets, nothing logged."),
            }
            for update in outcome.updates {
                println!("  New personal record: {} {:.1}", update.kind, update.value);
            }
            Ok(())
        }
        Command::Workouts { limit } => {
            let tracker = open_tracker(&config).await?;
            let workouts = tracker.recent_workouts(limit).await?;
            if workouts.is_empty() {
                println!("No workouts yet.");
            }
            for workout in &workouts {
                let stats = workout.stats();
                println!(
                    "{}  {:<16} {:>7}  {}/{} sets  {}  {}",
                    short_date(workout.date),
                    workout.name,
                    workout
                        .duration_minutes
                        .map_or_else(|| "-".to_string(), format_workout_duration),
                    stats.completed_sets,
                    stats.total_sets,
                    format_volume(stats.total_volume, &cli.unit),
                    workout.summary()
                );
            }
            let summary = tracker.workout_summary().await?;
            println!(
                "{} workouts, {} lifted, {} day streak",
                summary.total_workouts,
                format_volume(summary.total_volume, &cli.unit),
                summary.current_streak
            );
            Ok(())
        }
        Command::Progress { days } => {
            let tracker = open_tracker(&config).await?;
            let progress = tracker.overall_progress(days).await?;
            println!(
                "Last {} days: {} workouts, {} total, {} per workout",
                progress.period_days,
                progress.total_workouts,
                format_volume(progress.total_volume, &cli.unit),
                format_volume(progress.average_workout_volume, &cli.unit)
            );
            for record in &progress.recent_records {
                println!("  {}  {}", short_date(record.last_updated), record.exercise_name);
            }
            Ok(())
        }
        Command::History { exercise, limit } => {
            let exercise = lookup_exercise(&exercise)?;
            let tracker = open_tracker(&config).await?;
            let history = tracker.exercise_history(&exercise.id, limit).await?;
            if history.is_empty() {
                println!("No history for {} yet.", exercise.name);
            }
            for row in history {
                let sets: Vec<String> = row
                    .sets
                    .iter()
                    .map(|s| format!("{}x{}", s.weight(), s.reps()))
                    .collect();
                println!(
                    "{}  {}  {}",
                    short_date(row.date),
                    format_volume(row.total_volume, &cli.unit),
                    sets.join(", ")
                );
            }
            Ok(())
        }
        Command::Records => {
            let tracker = open_tracker(&config).await?;
            let records = tracker.user_records().await?;
            if records.is_empty() {
                println!("No personal records yet.");
            }
            for record in records {
                println!("{} ({})", record.exercise_name, short_date(record.last_updated));
                for kind in RecordKind::ALL {
                    if let Some(entry) = record.entry(kind) {
                        println!(
                            "  {:<16} {:>8.1}  {}",
                            kind.to_string(),
                            entry.value,
                            short_date(entry.date)
                        );
                    }
                }
            }
            Ok(())
        }
        Command::Stats { exercise, days } => {
            let exercise = lookup_exercise(&exercise)?;
            let tracker = open_tracker(&config).await?;
            let stats = tracker.progression_stats(&exercise.id, days).await?;
            println!(
                "{} over {} days: {} sessions",
                exercise.name, stats.period_days, stats.workout_count
            );
            println!("  volume   {:+.1}%", stats.volume_increase);
            println!("  strength {:+.1}%", stats.strength_increase);
            for point in &stats.weight_trend {
                println!("  {}  {:.1} {}", short_date(point.date), point.value, cli.unit);
            }
            Ok(())
        }
        Command::Exercises { category, search } => {
            let mut exercises = match category {
                Some(category) => exercises_in(category),
                None => search_exercises(""),
            };
            if let Some(query) = search {
                let needle = query.to_lowercase();
                exercises.retain(|e| e.name.to_lowercase().contains(&needle));
            }
            for exercise in exercises {
                println!(
                    "{:>4}  {:<28} {:?}/{:?}  rest {}",
                    exercise.id,
                    exercise.name,
                    exercise.category,
                    exercise.equipment,
                    format_countdown(exercise.default_rest_seconds())
                );
            }
            Ok(())
        }
        Command::Template { action } => run_template(action, &config).await,
        Command::Program { action } => run_program(action, &config).await,
    }
}

async fn run_template(action: TemplateAction, config: &AppConfig) -> Result<()> {
    let store = open_store(config).await?;
    let planner = TemplateComponent::new(store.clone(), &config.user_id);
    match action {
        TemplateAction::Save {
            workout,
            name,
            description,
            tags,
        } => {
            let workout = store
                .get_workout(workout.clone())
                .await?
                .ok_or_else(|| anyhow!("no workout with id {:?}, see `lift-rs workouts`", workout))?;
            let template = planner
                .save_as_template(&name, &description, &workout.exercises, tags)
                .await?;
            println!("Saved template {} ({}).", template.name, template.id);
        }
        TemplateAction::List { popular, limit } => {
            let templates = if popular {
                planner.popular_templates(limit).await?
            } else {
                planner.user_templates().await?
            };
            if templates.is_empty() {
                println!("No templates.");
            }
            for template in templates {
                println!(
                    "{}  {:<20} used {}x  {}",
                    template.id,
                    template.name,
                    template.use_count,
                    template.tags.join(", ")
                );
            }
        }
        TemplateAction::Use { id } => {
            let template = planner.use_template(&id).await?;
            println!("{}: {}", template.name, template.description);
            for exercise in &template.exercises {
                let rest = exercise
                    .rest_time
                    .map_or_else(String::new, |r| format!(", rest {}", format_countdown(r)));
                println!(
                    "  {:>4}  {:<28} {} x {}{}",
                    exercise.exercise_id,
                    exercise.exercise_name,
                    exercise.sets,
                    exercise.reps_range,
                    rest
                );
            }
        }
        TemplateAction::Delete { id } => {
            planner.delete_template(&id).await?;
            println!("Deleted template {}.", id);
        }
    }
    Ok(())
}

async fn run_program(action: ProgramAction, config: &AppConfig) -> Result<()> {
    let planner = TemplateComponent::new(open_store(config).await?, &config.user_id);
    match action {
        ProgramAction::Create {
            name,
            description,
            weeks,
            days,
            goal,
        } => {
            let program = planner
                .create_program(&name, &description, weeks, days, goal)
                .await?;
            println!("Created program {} ({}).", program.name, program.id);
        }
        ProgramAction::List => {
            let programs = planner.user_programs().await?;
            if programs.is_empty() {
                println!("No programs.");
            }
            for program in &programs {
                print_program(program);
            }
        }
        ProgramAction::Start { id } => print_program(&planner.start_program(&id).await?),
        ProgramAction::Advance { id } => {
            let program = planner.advance_program(&id).await?;
            print_program(&program);
            if let Some(day) = program.today() {
                println!("  next: {}", day.name);
            }
        }
    }
    Ok(())
}

fn print_program(program: &WorkoutProgram) {
    let status = if program.is_active {
        format!("week {} day {}", program.current_week, program.current_day)
    } else if program.completed_at.is_some() {
        "completed".to_string()
    } else {
        "inactive".to_string()
    };
    println!(
        "{}  {:<20} {} ({}), {:.0}% done",
        program.id,
        program.name,
        status,
        program.goal,
        program.progress_percent()
    );
}

async fn open_store(config: &AppConfig) -> Result<Arc<DocumentStore>> {
    Ok(Arc::new(DocumentStore::open(&config.store_path).await?))
}

async fn open_tracker(config: &AppConfig) -> Result<ProgressionComponent<DocumentStore>> {
    Ok(ProgressionComponent::new(
        open_store(config).await?,
        &config.user_id,
    ))
}

/// Runs a timer in the terminal until it finishes or Ctrl-C is pressed.
async fn run_timer(
    timer: TimerComponent<TokioReminderScheduler>,
    tx: broadcast::Sender<AppEvent>,
    adjust: i64,
    render: fn(u32) -> String,
) -> Result<()> {
    let mut rx = tx.subscribe();
    let timer = Arc::new(RwLock::new(timer));
    {
        let mut timer = timer.write().await;
        timer.start().await?;
        if adjust != 0 {
            timer.adjust(adjust).await?;
        }
    }
    let ticker = spawn_ticker(timer.clone(), tx);
    print_clock(render(timer.read().await.snapshot().display_seconds()));

    loop {
        tokio::select! {
            event = rx.recv() => match screen_update(event) {
                ScreenUpdate::Clock(seconds) => print_clock(render(seconds)),
                ScreenUpdate::Message(text) => println!("\n{}", text),
                ScreenUpdate::Nothing => {}
                ScreenUpdate::CheckFinished => {
                    if timer.read().await.snapshot().phase == TimerPhase::Finished {
                        println!("\rDone!    ");
                        break;
                    }
                }
                ScreenUpdate::Done => {
                    println!("\rDone!    ");
                    break;
                }
                ScreenUpdate::Stop => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let elapsed = timer.read().await.get_elapsed();
                timer.write().await.close().await?;
                println!();
                if elapsed > 0 {
                    info!("Stopped after {}.", format_long_time(elapsed));
                }
                break;
            }
        }
    }
    ticker.abort();
    Ok(())
}

/// What the terminal does with an event of the bus.
#[derive(Debug, PartialEq, Eq)]
enum ScreenUpdate {
    Clock(u32),
    Message(String),
    Nothing,
    /// Events were dropped; the completion may have been among them.
    CheckFinished,
    Done,
    Stop,
}

fn screen_update(event: Result<AppEvent, RecvError>) -> ScreenUpdate {
    match event {
        Ok(AppEvent::TimerTick(snapshot)) => ScreenUpdate::Clock(snapshot.display_seconds()),
        Ok(AppEvent::TimerCompleted(_)) => ScreenUpdate::Done,
        Ok(AppEvent::Reminder { title, body }) => {
            ScreenUpdate::Message(format!("{} {}", title, body))
        }
        Ok(_) => ScreenUpdate::Nothing,
        Err(RecvError::Lagged(skipped)) => {
            warn!("Terminal fell behind, skipped {} timer events.", skipped);
            ScreenUpdate::CheckFinished
        }
        Err(RecvError::Closed) => ScreenUpdate::Stop,
    }
}

fn print_clock(clock: String) {
    print!("\r{}    ", clock);
    let _ = std::io::stdout().flush();
}
