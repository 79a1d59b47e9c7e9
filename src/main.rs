use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use habitline::db::Database;
use habitline::models::*;
use habitline::render;

#[derive(Parser)]
#[command(name = "hbl")]
#[command(about = "Habit and routine planner with a per-day timeline")]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage habit templates
    #[command(subcommand)]
    Habit(HabitCommands),
    /// Manage the steps of a habit
    #[command(subcommand)]
    Step(StepCommands),
    /// Manage day plans and their timelines
    #[command(subcommand)]
    Plan(PlanCommands),
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Add a habit template
    Add {
        name: String,
        /// The tiny opening move that starts the habit
        first_action: String,
    },
    /// List all habit templates
    List {
        /// Print structured JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum StepCommands {
    /// Attach a step to a habit
    Add {
        habit_id: i64,
        title: String,
        /// Position among siblings
        #[arg(long, default_value_t = 1)]
        order: i64,
        /// Parent step id for nesting
        #[arg(long)]
        parent: Option<i64>,
    },
    /// List a habit's steps as an indented tree
    List {
        habit_id: i64,
        /// Print structured JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Create the plan for a date (no-op if it already exists)
    Init {
        /// Date as YYYY-MM-DD; defaults to today
        date: Option<PlanDate>,
    },
    /// Expand a habit into a date's timeline
    Add {
        /// Date as YYYY-MM-DD
        date: PlanDate,
        habit_id: i64,
        /// Scheduled time as HH:MM (e.g. 07:30)
        #[arg(long)]
        time: Option<PlanTime>,
    },
    /// Show a date's merged timeline
    Show {
        /// Date as YYYY-MM-DD
        date: PlanDate,
        /// Print structured JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a timeline item done
    Done { item_id: i64 },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "habitline=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<Database> {
    let db = match path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let db = open_database(cli.db)?;

    match cli.command {
        Commands::Habit(HabitCommands::Add { name, first_action }) => {
            let habit = db.create_habit(CreateHabitInput { name, first_action })?;
            println!("Added habit id={} name={}", habit.id, habit.name);
        }
        Commands::Habit(HabitCommands::List { json }) => {
            let habits = db.list_habits()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else {
                print!("{}", render::render_habits(&habits));
            }
        }
        Commands::Step(StepCommands::Add {
            habit_id,
            title,
            order,
            parent,
        }) => {
            let step = db.add_step(
                habit_id,
                CreateStepInput {
                    parent_step_id: parent,
                    title,
                    sort_order: order,
                },
            )?;
            println!(
                "Added step id={} habit_id={} title={}",
                step.id, step.habit_id, step.title
            );
        }
        Commands::Step(StepCommands::List { habit_id, json }) => {
            let rows = db.list_steps(habit_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", render::render_steps(&rows));
            }
        }
        Commands::Plan(PlanCommands::Init { date }) => {
            let date = date.unwrap_or_else(PlanDate::today);
            match db.plan_init(date)? {
                PlanInitOutcome::Created { plan_id } => {
                    println!("Created plan id={plan_id} date={date}");
                }
                PlanInitOutcome::AlreadyExists { plan_id } => {
                    println!("Plan already exists id={plan_id} date={date}");
                }
            }
        }
        Commands::Plan(PlanCommands::Add {
            date,
            habit_id,
            time,
        }) => {
            let outcome = db.add_habit_to_plan(date, habit_id, time)?;
            println!(
                "Added habit to plan date={date} habit_id={habit_id} (+{} items)",
                outcome.items_added
            );
            println!("habit_item_id={}", outcome.habit_item_id);
        }
        Commands::Plan(PlanCommands::Show { date, json }) => {
            let rows = db.show_plan(date)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Timeline {date}");
                print!("{}", render::render_timeline(&rows));
            }
        }
        Commands::Plan(PlanCommands::Done { item_id }) => match db.mark_done(item_id)? {
            MarkDoneOutcome::Done { item } => {
                println!("Done item_id={}", item.id);
            }
            MarkDoneOutcome::AlreadyDone { .. } => {
                println!("Already done");
            }
        },
    }

    Ok(())
}
