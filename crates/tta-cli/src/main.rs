use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tta_core::{ImportResult, RowError, SkillId};
use tta_import::{parse_level_rules, parse_members, parse_tasks, skill_definition_from_column};
use tta_storage::{
    export_level_rules_csv, export_members_csv, export_tasks_csv, AllocationStore, SnapshotFile,
};

#[derive(Parser)]
#[command(name = "tta")]
#[command(about = "Team task allocation and review engine", long_about = None)]
struct Cli {
    /// Snapshot file holding the full store state.
    #[arg(long, default_value = "tta-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the level-rules CSV, replacing the current rules
    ImportRules { file: PathBuf },
    /// Import the member-profile CSV, replacing the current members
    ImportMembers {
        file: PathBuf,
        #[command(flatten)]
        options: ImportOptions,
    },
    /// Import the task-allocation CSV, replacing the current tasks
    ImportTasks {
        file: PathBuf,
        #[command(flatten)]
        options: ImportOptions,
    },
    /// Back-fill every member and task to the current skill schema
    Sync,
    /// Print the derived allocation view for every task
    Compute,
    /// Re-serialize one entity kind as CSV
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage the skill schema
    Skill {
        #[command(subcommand)]
        action: SkillCommands,
    },
}

#[derive(clap::Args)]
struct ImportOptions {
    /// Register discovered skill columns before importing
    #[arg(long)]
    accept_new_skills: bool,
    /// Import without the discovered columns instead of aborting
    #[arg(long, conflicts_with = "accept_new_skills")]
    reject_new_skills: bool,
    /// Commit successfully parsed rows even when some rows failed
    #[arg(long)]
    allow_partial: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Members,
    Tasks,
    LevelRules,
}

#[derive(Subcommand)]
enum SkillCommands {
    /// List the registered skill dimensions
    List,
    /// Register a skill by name (the name doubles as its CSV column)
    Add { name: String },
    /// Remove a skill and strip it from every member and task
    Remove { id: String },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let snapshot = SnapshotFile::new(&cli.state);
    let mut store = snapshot
        .load()
        .with_context(|| format!("failed to load state from {:?}", cli.state))?;

    match cli.command {
        Commands::ImportRules { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {:?}", file))?;
            let result = parse_level_rules(&text)?;
            report_row_errors(&result.errors);
            if !result.success {
                bail!("{} row(s) failed validation; nothing imported", result.errors.len());
            }
            info!(count = result.records.len(), "imported level rules");
            println!("Imported {} level rule(s)", result.records.len());
            store.set_level_rules(result.records);
            snapshot.save(&store)?;
        }
        Commands::ImportMembers { file, options } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {:?}", file))?;
            let result = run_import(&mut store, &options, |store| {
                parse_members(&text, store.schema())
            })?;
            println!("Imported {} member(s)", result.records.len());
            store.set_members(result.records);
            snapshot.save(&store)?;
        }
        Commands::ImportTasks { file, options } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {:?}", file))?;
            let result = run_import(&mut store, &options, |store| {
                parse_tasks(&text, store.schema())
            })?;
            println!("Imported {} task(s)", result.records.len());
            store.set_tasks(result.records);
            snapshot.save(&store)?;
        }
        Commands::Sync => {
            let inserted = store.sync();
            println!("Back-filled {inserted} skill entr(ies)");
            snapshot.save(&store)?;
        }
        Commands::Compute => {
            for (task, view) in store.task_views() {
                println!("{} [{}]", task.name, view.review_status);
                println!("  max complexity : {}", view.max_complexity);
                println!("  suitability    : {}", view.suitability_score);
                if !view.skill_gaps.is_empty() {
                    println!("  gaps           : {}", view.skill_gaps.join(", "));
                }
                match &view.suggested_reviewer {
                    Some(reviewer) => {
                        println!("  reviewer       : {} ({})", reviewer, view.reviewer_validity);
                        if !view.review_focus.is_empty() {
                            println!("  {}", view.review_focus);
                        }
                    }
                    None => println!("  reviewer       : {}", view.reviewer_validity),
                }
            }
        }
        Commands::Export { kind, out } => {
            let csv = match kind {
                ExportKind::Members => export_members_csv(&store),
                ExportKind::Tasks => export_tasks_csv(&store),
                ExportKind::LevelRules => export_level_rules_csv(&store),
            };
            match out {
                Some(path) => {
                    fs::write(&path, csv).with_context(|| format!("failed to write {:?}", path))?
                }
                None => println!("{csv}"),
            }
        }
        Commands::Skill { action } => match action {
            SkillCommands::List => {
                for skill in store.schema().iter() {
                    println!(
                        "{}  {} ({}) <- column {:?}",
                        skill.id, skill.name, skill.short_name, skill.source_column_name
                    );
                }
            }
            SkillCommands::Add { name } => {
                let definition = skill_definition_from_column(&name);
                let id = definition.id.clone();
                store.add_skill(definition)?;
                println!("Registered skill {id}");
                snapshot.save(&store)?;
            }
            SkillCommands::Remove { id } => {
                let id = SkillId::new(id);
                match store.remove_skill(&id) {
                    Some(removed) => println!("Removed skill {}", removed.name),
                    None => println!("No skill with id {id}"),
                }
                snapshot.save(&store)?;
            }
        },
    }

    Ok(())
}

/// Shared two-phase import flow for the files with dynamic skill columns:
/// parse, settle the discovered-column decision, reconcile and re-parse when
/// accepted, then enforce the row-error policy.
fn run_import<T>(
    store: &mut AllocationStore,
    options: &ImportOptions,
    parse: impl Fn(&AllocationStore) -> Result<ImportResult<T>, tta_core::SchemaError>,
) -> Result<ImportResult<T>> {
    let mut result = parse(store)?;

    if !result.discovered_skill_columns.is_empty() {
        if options.accept_new_skills {
            let created = reconcile(store, &result.discovered_skill_columns)?;
            info!(count = created, "registered discovered skills");
            // With the schema extended the same text resolves completely.
            result = parse(store)?;
        } else if options.reject_new_skills {
            println!(
                "Ignoring {} unregistered column(s): {}",
                result.discovered_skill_columns.len(),
                result.discovered_skill_columns.join(", ")
            );
        } else {
            bail!(
                "found unregistered skill column(s): {}; rerun with --accept-new-skills or --reject-new-skills",
                result.discovered_skill_columns.join(", ")
            );
        }
    }

    report_row_errors(&result.errors);
    if !result.success && !options.allow_partial {
        bail!(
            "{} row(s) failed validation; rerun with --allow-partial to keep the {} valid row(s)",
            result.errors.len(),
            result.records.len()
        );
    }
    Ok(result)
}

fn reconcile(store: &mut AllocationStore, columns: &[String]) -> Result<usize> {
    // The store owns its collections, so reconciliation goes through the
    // schema-mutating operation followed by a full sync.
    let mut created = 0;
    for column in columns {
        if store.schema().by_column(column).is_none() {
            store.add_skill(skill_definition_from_column(column))?;
            created += 1;
        }
    }
    store.sync();
    Ok(created)
}

fn report_row_errors(errors: &[RowError]) {
    for error in errors {
        eprintln!("row {}, column {:?}: {}", error.row, error.column, error.message);
    }
}
