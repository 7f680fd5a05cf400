//! Build tasks for the snippet-lint workspace.
//!
//! Run with `cargo xtask <task>`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation tasks")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages into DIR
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
    /// Generate shell completions into DIR
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out: PathBuf,
        /// Only generate for this shell
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
}

fn main() -> ExitCode {
    let xtask = Xtask::parse();
    let result = match xtask.task {
        Task::Man { out } => gen_man(&out),
        Task::Completions { out, shell } => gen_completions(&out, shell),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtask: {err}");
            ExitCode::FAILURE
        }
    }
}

fn gen_man(out: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out)?;
    let cmd = snippet_lint::command();
    clap_mangen::generate_to(cmd, out)?;
    println!("man pages written to {}", out.display());
    Ok(())
}

fn gen_completions(out: &Path, only: Option<Shell>) -> std::io::Result<()> {
    fs::create_dir_all(out)?;
    let shells: Vec<Shell> = match only {
        Some(shell) => vec![shell],
        None => Shell::value_variants().to_vec(),
    };
    for shell in shells {
        let mut cmd = snippet_lint::command();
        let path = clap_complete::generate_to(shell, &mut cmd, "snippet-lint", out)?;
        println!("{shell} completions written to {}", path.display());
    }
    Ok(())
}
