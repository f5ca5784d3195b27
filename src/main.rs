use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kit::areas::repository::Repository;
use kit::commands::porcelain::log::LogOptions;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "kit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A small content-addressable version control engine",
    long_about = "kit stores file snapshots as content-addressed objects, \
    stages them through a plain-text index and chains them into commits. \
    It covers the core of git's data model, not its full command set.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(short, long, global = true, help = "Log debug diagnostics to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command stores the content of the given files and records them in the index. \
        Directories are expanded to every file below them."
    )]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "rm",
        about = "Unstage files",
        long_about = "This command removes the given files, or everything below the given directories, \
        from the index. The working tree is left untouched."
    )]
    Rm {
        #[arg(index = 1, required = true, help = "Files or directories to unstage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command snapshots the index as a tree and records it as a commit on top of HEAD. \
        The author is read from KIT_AUTHOR_NAME and KIT_AUTHOR_EMAIL, the date from KIT_AUTHOR_DATE if set."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "log",
        about = "Show commit history",
        long_about = "This command shows the commits reachable from HEAD, newest first."
    )]
    Log {
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
    },
    #[command(
        name = "write-tree",
        about = "Store the index as a tree object",
        long_about = "This command builds tree objects from the index and prints the root tree ID."
    )]
    WriteTree,
    #[command(
        name = "cat-file",
        about = "Print the content or type of an object",
        long_about = "This command prints the content (-p) or the type (-t) of an object in the repository. \
        It requires the SHA of the object to be specified; abbreviated SHAs are accepted.",
        group = clap::ArgGroup::new("mode").required(true).args(["pretty", "show_type"])
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object's content")]
        pretty: bool,
        #[arg(short = 't', help = "Show the object's type")]
        show_type: bool,
        #[arg(index = 1, help = "The object SHA")]
        sha: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash an object and optionally write it to the object database",
        long_about = "This command hashes an object file and can write it to the object database. \
        It requires the path to the file to be specified."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "ls-tree",
        about = "List the contents of a tree object",
        long_about = "This command lists the entries of a tree, or of the tree a commit points to. \
        Use HEAD for the current commit."
    )]
    LsTree {
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, help = "Tree or commit SHA, or HEAD")]
        sha: String,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn open_repository(path: Option<PathBuf>) -> Result<Repository> {
    let path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    Repository::new(&path, Box::new(std::io::stdout()))
        .with_context(|| format!("Failed to open repository at {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path } => open_repository(path)?.init()?,
        Commands::Add { paths } => open_repository(None)?.add(&paths)?,
        Commands::Rm { paths } => open_repository(None)?.rm(&paths)?,
        Commands::Commit { message } => open_repository(None)?.commit(&message)?,
        Commands::Log { oneline } => open_repository(None)?.log(&LogOptions { oneline })?,
        Commands::WriteTree => open_repository(None)?.write_tree()?,
        Commands::CatFile { show_type, sha, .. } => {
            open_repository(None)?.cat_file(&sha, show_type)?
        }
        Commands::HashObject { write, file } => open_repository(None)?.hash_object(&file, write)?,
        Commands::LsTree { recursive, sha } => open_repository(None)?.ls_tree(&sha, recursive)?,
    }

    Ok(())
}
