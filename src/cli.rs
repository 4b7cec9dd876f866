use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::error::ExitCode;
use crate::history::fs_host::ScmKind;

#[derive(Debug, Parser)]
#[command(
    name = "changelog-history",
    version,
    about = "Keep the change logs of deleted builds browsable from later builds"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScmArg {
    Svn,
    None,
}

impl From<ScmArg> for ScmKind {
    fn from(value: ScmArg) -> Self {
        match value {
            ScmArg::Svn => ScmKind::Svn,
            ScmArg::None => ScmKind::None,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a finished build, optionally with its change log.
    RecordBuild {
        #[arg(long)]
        job: String,
        #[arg(long)]
        build: u64,
        #[arg(long, value_enum, default_value = "svn")]
        scm: ScmArg,
        #[arg(long)]
        change_log: Option<PathBuf>,
    },
    /// Delete a build, carrying its change log forward to the next build.
    DeleteBuild {
        #[arg(long)]
        job: String,
        #[arg(long)]
        build: u64,
    },
    /// Render the change log history of a build.
    History {
        #[arg(long)]
        job: String,
        #[arg(long)]
        build: u64,
    },
    /// Serve a path below `<build>/changelog-history/`, e.g. `5/changes`.
    Show {
        #[arg(long)]
        job: String,
        #[arg(long)]
        build: u64,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Render the "changes" page of a build, or of the whole job.
    Changes {
        #[arg(long)]
        job: String,
        #[arg(long)]
        build: Option<u64>,
    },
    /// Show resolved paths, configuration and jobs.
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(page) = &report.page {
        print!("{page}");
    } else {
        for detail in &report.details {
            println!("{detail}");
        }
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::RecordBuild {
            job,
            build,
            scm,
            change_log,
        } => commands::record_build::run(&commands::record_build::RecordBuildOptions {
            job,
            build,
            scm: scm.into(),
            change_log,
        })?,
        Command::DeleteBuild { job, build } => {
            commands::delete_build::run(&commands::delete_build::DeleteBuildOptions { job, build })?
        }
        Command::History { job, build } => {
            commands::history::run(&commands::history::HistoryOptions { job, build })?
        }
        Command::Show { job, build, path } => {
            commands::show::run(&commands::show::ShowOptions { job, build, path })?
        }
        Command::Changes { job, build } => {
            commands::changes::run(&commands::changes::ChangesOptions { job, build })?
        }
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    Ok(if report.ok {
        ExitCode::Ok
    } else {
        ExitCode::Issue
    })
}
