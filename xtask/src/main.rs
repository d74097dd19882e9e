use anyhow::{
    Context,
    Result,
    ensure,
};
use clap::{
    Parser,
    Subcommand,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    process::Command,
};

const CRATES: [&str; 3] = ["arena-engine", "ledger", "arena-tui"];

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Arena helper tasks (fmt, clippy, tests)",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check formatting without rewriting files
    Fmt,
    /// Run clippy for the entire workspace with warnings-as-errors
    Clippy,
    /// Run unit tests, for one crate or all of them
    Test {
        /// Only test this crate
        #[arg(long, short)]
        package: Option<String>,
    },
    /// fmt, clippy, then every test
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = repo_root()?;

    match cli.command {
        Commands::Fmt => run_fmt(&root)?,
        Commands::Clippy => run_clippy(&root)?,
        Commands::Test { package } => match package {
            Some(package) => {
                ensure!(
                    CRATES.contains(&package.as_str()),
                    "unknown crate {package}; expected one of {}",
                    CRATES.join(", ")
                );
                run_tests(&root, &package)?;
            }
            None => {
                for package in CRATES {
                    run_tests(&root, package)?;
                }
            }
        },
        Commands::Ci => {
            run_fmt(&root)?;
            run_clippy(&root)?;
            for package in CRATES {
                run_tests(&root, package)?;
            }
        }
    }

    Ok(())
}

fn repo_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

fn run_fmt(root: &Path) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all").arg("--check").current_dir(root);
    run_command(cmd, "cargo fmt --check")
}

fn run_clippy(root: &Path) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy")
        .arg("--workspace")
        .arg("--all-targets")
        .arg("--all-features")
        .arg("--")
        .arg("-D")
        .arg("warnings")
        .current_dir(root);
    run_command(cmd, "cargo clippy")
}

fn run_tests(root: &Path, package: &str) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test").arg("-p").arg(package).current_dir(root);
    run_command(cmd, &format!("cargo test -p {package}"))
}

fn run_command(mut cmd: Command, label: &str) -> Result<()> {
    println!("Running: {}", label);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {label}"))?;
    ensure!(status.success(), "{label} failed with status {status}");
    Ok(())
}
