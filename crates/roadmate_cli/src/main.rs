//! Offline board viewer.
//!
//! # Responsibility
//! - Print the cached boards of one identity from the local snapshot.
//! - List cached identities when called without arguments.

use clap::Parser;
use log::info;
use roadmate_core::{
    column_of, init_logging, CoreConfig, Project, SnapshotRepository, SqliteSnapshotRepository,
    TaskStatus,
};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "roadmate_cli")]
#[command(version, about = "Print cached Roadmate boards")]
struct Cli {
    /// Identity whose cached snapshot to show; lists cached identities when omitted.
    username: Option<String>,

    /// Only print the project with this name (case-insensitive).
    project: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CoreConfig::from_env();
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("logging disabled: {err}");
    }

    match run(&config, cli.username.as_deref(), cli.project.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CoreConfig, username: Option<&str>, project_filter: Option<&str>) -> Result<(), String> {
    let db_path = config.cache_db_path();
    let repo = SqliteSnapshotRepository::open(&db_path, username.unwrap_or_default())
        .map_err(|err| format!("cannot open cache {}: {err}", db_path.display()))?;

    let Some(username) = username else {
        let summaries = repo.list_summaries().map_err(|err| err.to_string())?;
        if summaries.is_empty() {
            println!("no cached sessions in {}", db_path.display());
        } else {
            println!("cached sessions in {}:", db_path.display());
        }
        for summary in summaries {
            println!(
                "  {} ({} projects, saved at {})",
                summary.namespace, summary.project_count, summary.saved_at
            );
        }
        return Ok(());
    };

    let Some(snapshot) = repo.load().map_err(|err| err.to_string())? else {
        println!("no cached projects for `{username}`");
        return Ok(());
    };
    info!(
        "event=cli_view module=cli status=ok projects={}",
        snapshot.projects.len()
    );

    let projects = snapshot
        .projects
        .iter()
        .filter(|project| {
            project_filter.map_or(true, |name| project.name.eq_ignore_ascii_case(name.trim()))
        })
        .collect::<Vec<_>>();
    if projects.is_empty() {
        return Err(format!(
            "no cached project named `{}`",
            project_filter.unwrap_or_default()
        ));
    }
    for project in projects {
        print_board(project);
    }
    Ok(())
}

fn print_board(project: &Project) {
    let pin = if project.is_pinned { " [pinned]" } else { "" };
    println!("{}{pin}", project.name);
    for member in project.members_for_display() {
        println!("  @{} ({})", member.username, member.display_role());
    }
    for status in TaskStatus::ALL {
        let column = column_of(&project.tasks, status);
        println!("  {} ({})", status.title(), column.len());
        for task in column {
            let assignee = task
                .assignee_username
                .as_deref()
                .map(|name| format!(" @{name}"))
                .unwrap_or_default();
            println!(
                "    {}. {} [difficulty {}]{assignee}",
                task.sort_index + 1,
                task.title,
                task.difficulty
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn positional_arguments_are_optional() {
        let cli = Cli::try_parse_from(["roadmate_cli"]).unwrap();
        assert_eq!((cli.username, cli.project), (None, None));

        let cli = Cli::try_parse_from(["roadmate_cli", "alice", "Alpha"]).unwrap();
        assert_eq!(cli.username.as_deref(), Some("alice"));
        assert_eq!(cli.project.as_deref(), Some("Alpha"));
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["roadmate_cli", "alice", "Alpha", "Beta"]).is_err());
    }
}
