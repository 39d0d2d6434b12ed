use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tasklist::{
    BackendKind, Category, Config, DeleteGate, KeyValueStore, Priority, Query, SortOrder, StatusFilter, Task,
    TaskFields, TaskStore, query,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "tasklist - keep track of short personal tasks")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Config file (default: <config dir>/tasklist/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the task data (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short, long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// More log output; repeat for more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task description
        text: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change an existing task; omitted fields keep their value
    Edit {
        /// Task id or unique id prefix
        id: String,

        /// New description
        #[arg(short, long)]
        text: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,

        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        no_category: bool,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        no_due: bool,
    },

    /// Toggle a task between pending and completed
    Done {
        /// Task id or unique id prefix
        id: String,
    },

    /// Delete a task after confirmation
    Delete {
        /// Task id or unique id prefix
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    List {
        #[arg(short, long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,

        /// Case-insensitive text to search for
        #[arg(short = 'q', long, default_value = "")]
        search: String,

        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        sort: SortOrder,
    },

    /// Show one task
    Show {
        /// Task id or unique id prefix
        id: String,
    },
}

#[derive(Args)]
struct FieldArgs {
    #[arg(short = 'C', long, value_enum)]
    category: Option<Category>,

    #[arg(short, long, value_enum)]
    priority: Option<Priority>,

    /// Due date (YYYY-MM-DD), today or later
    #[arg(long)]
    due: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Setup tracing
    let level = log_level(&config.log_level, cli.verbose)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    // Open store
    let backend = config.open_backend()?;
    let mut store = TaskStore::new(backend).with_key(config.storage_key.clone());
    store.load();

    run(cli, &mut store)
}

fn log_level(configured: &str, verbose: u8) -> Result<Level> {
    const LEVELS: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

    let base: Level = configured
        .parse()
        .map_err(|_| eyre!("Invalid log level: {}", configured))?;
    let index = LEVELS.iter().position(|l| *l == base).unwrap_or(1);
    Ok(LEVELS[(index + verbose as usize).min(LEVELS.len() - 1)])
}

fn run<B: KeyValueStore>(cli: Cli, store: &mut TaskStore<B>) -> Result<()> {
    match cli.command {
        Commands::Add { text, fields } => {
            let mut new = TaskFields::new(text);
            new.category = fields.category;
            new.priority = fields.priority.unwrap_or_default();
            new.due_date = fields.due;

            let task = store.create(new)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("{} {}", "Added".green(), format_task(&task, store.today()));
            }
        }
        Commands::Edit {
            id,
            text,
            fields,
            no_category,
            no_due,
        } => {
            let id = store.resolve(&id)?;
            let mut changed = store
                .get(&id)
                .map(Task::fields)
                .ok_or_else(|| eyre!("Task not found: {}", id))?;

            if let Some(text) = text {
                changed.text = text;
            }
            if fields.category.is_some() || no_category {
                changed.category = fields.category;
            }
            if let Some(priority) = fields.priority {
                changed.priority = priority;
            }
            if fields.due.is_some() || no_due {
                changed.due_date = fields.due;
            }

            let task = store.edit(&id, changed)?;
            if cli.json {
                print_json(&task)?;
            } else {
                println!("{} {}", "Updated".green(), format_task(&task, store.today()));
            }
        }
        Commands::Done { id } => {
            let id = store.resolve(&id)?;
            store.toggle_complete(&id)?;
            if let Some(task) = store.get(&id) {
                if cli.json {
                    print_json(task)?;
                } else {
                    let state = if task.is_completed { "Completed".green() } else { "Reopened".yellow() };
                    println!("{} {}", state, format_task(task, store.today()));
                }
            }
        }
        Commands::Delete { id, yes } => {
            let id = store.resolve(&id)?;
            let mut gate = DeleteGate::new();
            gate.request(id);

            let confirmed = yes || {
                let task = store.get(&id).ok_or_else(|| eyre!("Task not found: {}", id))?;
                confirm(&format!("Delete \"{}\"?", task.text))?
            };

            if confirmed {
                gate.confirm(store)?;
                println!("{} {}", "Deleted".red(), short_id(&id.to_string()));
            } else {
                gate.cancel();
                println!("Cancelled");
            }
        }
        Commands::List { status, search, sort } => {
            let q = Query::new(status, search, sort);
            let view = query(store.all(), &q);

            if cli.json {
                print_json(&view)?;
            } else if view.is_empty() {
                println!("{}", "No tasks found".dimmed());
            } else {
                let today = store.today();
                for task in view {
                    println!("{}", format_task(task, today));
                }
            }
        }
        Commands::Show { id } => {
            let id = store.resolve(&id)?;
            let task = store.get(&id).ok_or_else(|| eyre!("Task not found: {}", id))?;
            if cli.json {
                print_json(task)?;
            } else {
                println!("{:<10} {}", "id:".bold(), task.id);
                println!("{:<10} {}", "text:".bold(), task.text);
                println!(
                    "{:<10} {}",
                    "status:".bold(),
                    if task.is_completed { "completed" } else { "pending" }
                );
                println!(
                    "{:<10} {}",
                    "category:".bold(),
                    task.category.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
                );
                println!("{:<10} {}", "priority:".bold(), task.priority);
                println!(
                    "{:<10} {}",
                    "due:".bold(),
                    task.due_date.map(|d| d.to_string()).unwrap_or_else(|| "no due date".to_string())
                );
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

fn format_task(task: &Task, today: NaiveDate) -> String {
    let id = task.id.to_string();
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let text = if task.is_completed {
        task.text.dimmed().strikethrough().to_string()
    } else {
        task.text.clone()
    };

    let mut line = format!("{} {} {}", short_id(&id).cyan(), check, text);

    if let Some(category) = task.category {
        line.push_str(&format!(" {}", format!("#{}", category).blue()));
    }
    match task.priority {
        Priority::High => line.push_str(&format!(" {}", "!high".red().bold())),
        Priority::Low => line.push_str(&format!(" {}", "low".dimmed())),
        Priority::Normal => {}
    }
    if let Some(due) = task.due_date {
        let due = format!("due {}", due);
        if task.is_overdue(today) {
            line.push_str(&format!(" {}", format!("{} (overdue)", due).red()));
        } else {
            line.push_str(&format!(" {}", due.yellow()));
        }
    }

    line
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
