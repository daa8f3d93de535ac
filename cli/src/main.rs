mod commands;
mod config;
mod platform;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;
use std::process;

use crate::commands::{
    DayPlanEdit, Scheduler, cmd_done, cmd_meal_add, cmd_meal_delete, cmd_meal_edit,
    cmd_meal_list, cmd_notify_cancel, cmd_notify_cancel_all, cmd_notify_fire, cmd_notify_init,
    cmd_notify_list, cmd_notify_schedule, cmd_notify_settings, cmd_notify_test, cmd_plan_reset,
    cmd_plan_set, cmd_plan_show, cmd_sleep_delete, cmd_sleep_edit, cmd_sleep_list,
    cmd_sleep_log, cmd_sleep_settings,
};
use crate::config::Config;
use crate::platform::FilePlatform;
use vitalflow_core::db::Database;

#[derive(Parser)]
#[command(
    name = "vitalflow",
    version,
    about = "A wellness tracker with meal, workout, and sleep reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and manage meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Log and manage sleep
    Sleep {
        #[command(subcommand)]
        command: SleepCommands,
    },
    /// View or edit the weekly plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage reminders
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },
    /// Mark one of today's activities as done
    Done {
        /// Activity: workout, breakfast, lunch, dinner, sleep
        activity: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Log a meal
    Add {
        /// Meal name
        name: String,
        /// Calories
        #[arg(short, long)]
        calories: u32,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short = 't', long = "type", default_value = "snack")]
        meal_type: String,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meals for a day (sorted by time)
    List {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a meal
    Edit {
        /// Meal ID (or a unique prefix)
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New calories
        #[arg(short, long)]
        calories: Option<u32>,
        /// New meal type
        #[arg(short = 't', long = "type")]
        meal_type: Option<String>,
        /// New time (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// Move to another date
        #[arg(long)]
        date: Option<String>,
        /// New notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal
    Delete {
        /// Meal ID (or a unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SleepCommands {
    /// Log a night of sleep
    Log {
        /// Bedtime (HH:MM)
        bedtime: String,
        /// Wake-up time (HH:MM)
        wakeup: String,
        /// Quality: excellent, good, fair, poor
        #[arg(short, long, default_value = "good")]
        quality: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sleep records, most recent first
    List {
        /// Show at most this many records
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a sleep record
    Edit {
        /// Record ID (or a unique prefix)
        id: String,
        /// New bedtime (HH:MM)
        #[arg(long)]
        bedtime: Option<String>,
        /// New wake-up time (HH:MM)
        #[arg(long)]
        wakeup: Option<String>,
        /// New quality
        #[arg(short, long)]
        quality: Option<String>,
        /// New notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a sleep record
    Delete {
        /// Record ID (or a unique prefix)
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change bedtime, wake time, and sleep goal
    Settings {
        /// Bedtime reminder time (HH:MM)
        #[arg(long)]
        bedtime: Option<String>,
        /// Wake time (HH:MM)
        #[arg(long)]
        wake_time: Option<String>,
        /// Nightly sleep goal in hours
        #[arg(long)]
        goal: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Show the weekly plan
    Show {
        /// A single day: monday-sunday or mon-sun
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one day of the plan (empty time clears a slot)
    Set {
        /// Day: monday-sunday or mon-sun
        day: String,
        /// Workout type (e.g. Cardio, Strength, Yoga, Rest)
        #[arg(long)]
        workout: Option<String>,
        /// Workout duration in minutes (0 makes it a rest day)
        #[arg(long)]
        duration: Option<u32>,
        /// Workout time (HH:MM)
        #[arg(long)]
        workout_time: Option<String>,
        /// Breakfast time (HH:MM)
        #[arg(long)]
        breakfast: Option<String>,
        /// Lunch time (HH:MM)
        #[arg(long)]
        lunch: Option<String>,
        /// Dinner time (HH:MM)
        #[arg(long)]
        dinner: Option<String>,
        /// Bedtime (HH:MM)
        #[arg(long)]
        bedtime: Option<String>,
        /// Wake-up time (HH:MM)
        #[arg(long)]
        wakeup: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore the default weekly plan
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum NotifyCommands {
    /// Request permission and set up notification channels
    Init {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Schedule today's reminders (once per day unless forced)
    Schedule {
        /// Reschedule even if already done today
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List scheduled reminders
    List {
        /// Only this category: meal, workout, sleep, summary
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel every reminder of one category
    Cancel {
        /// Category: meal, workout, sleep, summary
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel all reminders
    CancelAll {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a test notification right away
    Test {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change notification settings
    Settings {
        /// Turn on: global, meals, workouts, sleep, summary, sound, vibration
        #[arg(long, value_delimiter = ',')]
        enable: Vec<String>,
        /// Turn off: global, meals, workouts, sleep, summary, sound, vibration
        #[arg(long, value_delimiter = ',')]
        disable: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deliver reminders that are due (run periodically)
    Fire {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;
    let platform = FilePlatform::open(&config.queue_path)?;
    let mut scheduler: Scheduler<'_> = Scheduler::new(&db, platform);

    // Reminder management commands drive the scheduler themselves.
    if !matches!(cli.command, Commands::Notify { .. }) {
        scheduler.initialize();
        if let Some(report) = scheduler.schedule_daily_if_due() {
            debug!("Launch scheduling: {report:?}");
        }
    }

    match cli.command {
        Commands::Meal { command } => match command {
            MealCommands::Add {
                name,
                calories,
                meal_type,
                time,
                date,
                notes,
                json,
            } => cmd_meal_add(
                &db,
                &mut scheduler,
                &name,
                calories,
                &meal_type,
                &time,
                date,
                notes,
                json,
            ),
            MealCommands::List { date, json } => cmd_meal_list(&db, date, json),
            MealCommands::Edit {
                id,
                name,
                calories,
                meal_type,
                time,
                date,
                notes,
                json,
            } => cmd_meal_edit(
                &db,
                &mut scheduler,
                &id,
                name.as_deref(),
                calories,
                meal_type.as_deref(),
                time.as_deref(),
                date,
                notes,
                json,
            ),
            MealCommands::Delete { id, json } => cmd_meal_delete(&db, &mut scheduler, &id, json),
        },
        Commands::Sleep { command } => match command {
            SleepCommands::Log {
                bedtime,
                wakeup,
                quality,
                date,
                notes,
                json,
            } => cmd_sleep_log(&db, &bedtime, &wakeup, &quality, date, notes, json),
            SleepCommands::List { limit, json } => cmd_sleep_list(&db, limit, json),
            SleepCommands::Edit {
                id,
                bedtime,
                wakeup,
                quality,
                notes,
                json,
            } => cmd_sleep_edit(
                &db,
                &id,
                bedtime.as_deref(),
                wakeup.as_deref(),
                quality.as_deref(),
                notes,
                json,
            ),
            SleepCommands::Delete { id, json } => cmd_sleep_delete(&db, &id, json),
            SleepCommands::Settings {
                bedtime,
                wake_time,
                goal,
                json,
            } => cmd_sleep_settings(
                &db,
                &mut scheduler,
                bedtime.as_deref(),
                wake_time.as_deref(),
                goal,
                json,
            ),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Show { day, json } => cmd_plan_show(&db, day.as_deref(), json),
            PlanCommands::Set {
                day,
                workout,
                duration,
                workout_time,
                breakfast,
                lunch,
                dinner,
                bedtime,
                wakeup,
                json,
            } => {
                let edit = DayPlanEdit {
                    workout,
                    duration,
                    workout_time,
                    breakfast,
                    lunch,
                    dinner,
                    bedtime,
                    wakeup,
                };
                cmd_plan_set(&db, &mut scheduler, &day, edit, json)
            }
            PlanCommands::Reset { json } => cmd_plan_reset(&db, &mut scheduler, json),
        },
        Commands::Notify { command } => {
            if !matches!(command, NotifyCommands::Init { .. } | NotifyCommands::Fire { .. }) {
                scheduler.initialize();
            }
            match command {
                NotifyCommands::Init { json } => cmd_notify_init(&mut scheduler, json),
                NotifyCommands::Schedule { force, json } => {
                    cmd_notify_schedule(&mut scheduler, force, json)
                }
                NotifyCommands::List { category, json } => {
                    cmd_notify_list(&scheduler, category.as_deref(), json)
                }
                NotifyCommands::Cancel { category, json } => {
                    cmd_notify_cancel(&mut scheduler, &category, json)
                }
                NotifyCommands::CancelAll { json } => cmd_notify_cancel_all(&mut scheduler, json),
                NotifyCommands::Test { json } => cmd_notify_test(&mut scheduler, json),
                NotifyCommands::Settings {
                    enable,
                    disable,
                    json,
                } => cmd_notify_settings(&db, &mut scheduler, &enable, &disable, json),
                NotifyCommands::Fire { json } => cmd_notify_fire(&mut scheduler, json),
            }
        }
        Commands::Done {
            activity,
            date,
            undo,
            json,
        } => cmd_done(&db, &activity, date, undo, json),
    }
}
