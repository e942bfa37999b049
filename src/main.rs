use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use dfs_facade::fs::{ClientOp, CountingClient, DfsClient, FileStatus, FsPermission};
use dfs_facade::services::tracing_setup;
use dfs_facade::{
    ClientConnector, DownloadOptions, FacadeConfig, FacadeLifecycle, FilesystemFacade,
    LifecycleError, SchemeConnector, UploadOptions,
};
use std::cell::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

/// Command-line front end for the filesystem facade
#[derive(Parser, Debug)]
#[command(name = "dfs")]
#[command(about = "Run filesystem facade operations from the shell", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (default: <config dir>/dfs-facade/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Server address overriding the configuration, e.g. mem://local or file:///srv/dfs
    #[arg(long, value_name = "ADDRESS", global = true)]
    address: Option<String>,

    /// Path to log file (default: warnings and errors on stderr)
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print per-call client statistics to stderr on exit
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a path exists
    Exists { path: String },

    /// Create a directory and its parents
    Mkdir {
        path: String,
        /// Octal permission, e.g. 750
        #[arg(long, value_parser = parse_mode)]
        mode: Option<u16>,
    },

    /// List directories (or single files)
    Ls {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Only show entries whose path contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Copy a local file or directory into the filesystem
    Put {
        local: PathBuf,
        remote: String,
        /// Fail instead of replacing an existing target
        #[arg(long)]
        no_overwrite: bool,
        /// Remove the local source after copying
        #[arg(long = "move")]
        move_source: bool,
    },

    /// Copy a file or directory to the local filesystem
    Get {
        remote: String,
        local: PathBuf,
        /// Skip writing checksum files next to the local copy
        #[arg(long)]
        raw: bool,
        /// Remove the remote source after copying
        #[arg(long = "move")]
        move_source: bool,
    },

    /// Delete a file or directory
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },

    /// Rename or move a path
    Mv { src: String, dst: String },

    /// Show the status of a path without following symlinks
    Stat { path: String },

    /// Summarize space used below a path
    Du { path: String },

    /// Print a file's checksum
    Checksum { path: String },

    /// Show filesystem capacity and usage
    Df { path: Option<String> },

    /// Manage directory snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommand,
    },

    /// Print the effective configuration as JSON and exit
    DumpConfig,
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// Take a snapshot; the name defaults to a timestamp
    Create { path: String, name: Option<String> },
    Delete { path: String, name: String },
    Rename {
        path: String,
        old_name: String,
        new_name: String,
    },
}

fn parse_mode(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s, 8)
        .ok()
        .filter(|mode| *mode <= 0o1777)
        .ok_or_else(|| format!("invalid octal mode: {s}"))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dfs-facade").join("config.json"))
}

fn load_config(args: &Args) -> AnyhowResult<FacadeConfig> {
    let mut config = match &args.config {
        Some(path) => FacadeConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => FacadeConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => FacadeConfig::default(),
        },
    };

    if let Some(address) = &args.address {
        config.server_address = address.clone();
        config.enabled = true;
    }
    Ok(config)
}

fn format_time(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

fn format_status(status: &FileStatus) -> String {
    let kind = if status.is_dir {
        'd'
    } else if status.is_symlink() {
        'l'
    } else {
        '-'
    };
    let replication = if status.is_dir {
        "-".to_string()
    } else {
        status.replication.to_string()
    };
    let mut line = format!(
        "{kind}{} {:>3} {:<10} {:<10} {:>12} {} {}",
        status.permission,
        replication,
        status.owner,
        status.group,
        status.length,
        format_time(status.modification_time),
        status.path
    );
    if let Some(target) = &status.symlink {
        line.push_str(" -> ");
        line.push_str(target);
    }
    line
}

fn print_json<T: serde::Serialize>(value: &T) -> AnyhowResult<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Turn a best-effort `false` into an error for the shell
fn ensure_done(done: bool, op: ClientOp, path: &str) -> AnyhowResult<()> {
    if !done {
        anyhow::bail!("{op} did not succeed for {path} (see the log for the cause)");
    }
    Ok(())
}

fn run(facade: &FilesystemFacade, command: &Command, json: bool) -> AnyhowResult<()> {
    match command {
        Command::Exists { path } => {
            let exists = facade.exist(path)?;
            if json {
                print_json(&exists)?;
            } else {
                println!("{exists}");
            }
        }

        Command::Mkdir { path, mode } => {
            let done = match mode {
                Some(mode) => facade.mkdirs_with_permission(path, FsPermission::new(*mode))?,
                None => facade.mkdirs(path)?,
            };
            ensure_done(done, ClientOp::Mkdirs, path)?;
        }

        Command::Ls { paths, filter } => {
            let statuses = match filter {
                Some(needle) => {
                    let accept = |p: &str| p.contains(needle.as_str());
                    facade.list_status_batch(paths, Some(&accept))?
                }
                None if paths.len() == 1 => facade.list_status(&paths[0])?,
                None => facade.list_status_batch(paths, None)?,
            };
            if json {
                print_json(&statuses)?;
            } else {
                for status in &statuses {
                    println!("{}", format_status(status));
                }
            }
        }

        Command::Put {
            local,
            remote,
            no_overwrite,
            move_source,
        } => {
            let options = UploadOptions::new()
                .with_overwrite(!no_overwrite)
                .with_delete_source(*move_source);
            let done = facade.upload_with(local, remote, options)?;
            ensure_done(done, ClientOp::CopyFromLocal, remote)?;
        }

        Command::Get {
            remote,
            local,
            raw,
            move_source,
        } => {
            let options = DownloadOptions::new()
                .with_raw_local_fs(*raw)
                .with_delete_source(*move_source);
            facade.download_with(remote, local, options)?;
        }

        Command::Rm { path, recursive } => {
            let done = facade.delete_with(path, *recursive)?;
            ensure_done(done, ClientOp::Delete, path)?;
        }

        Command::Mv { src, dst } => {
            let done = facade.rename(src, dst)?;
            ensure_done(done, ClientOp::Rename, src)?;
        }

        Command::Stat { path } => {
            let status = facade.file_link_status(path)?;
            if json {
                print_json(&status)?;
            } else {
                println!("{}", format_status(&status));
            }
        }

        Command::Du { path } => {
            let summary = facade.content_summary(path)?;
            if json {
                print_json(&summary)?;
            } else {
                println!(
                    "{:>12} {:>12} {:>18} {:>18} {}",
                    summary.directory_count,
                    summary.file_count,
                    summary.length,
                    summary.space_consumed,
                    path
                );
            }
        }

        Command::Checksum { path } => {
            let checksum = facade.file_checksum(path)?;
            if json {
                print_json(&checksum)?;
            } else {
                match checksum {
                    Some(checksum) => println!("{path}\t{checksum}"),
                    None => println!("{path}\tNONE"),
                }
            }
        }

        Command::Df { path } => {
            let status = facade.status(path.as_deref())?;
            if json {
                print_json(&status)?;
            } else {
                let percent = if status.capacity == 0 {
                    0.0
                } else {
                    status.used as f64 * 100.0 / status.capacity as f64
                };
                println!(
                    "{:<24} {:>16} {:>16} {:>16} {:>5}",
                    "Filesystem", "Size", "Used", "Available", "Use%"
                );
                println!(
                    "{:<24} {:>16} {:>16} {:>16} {:>4.0}%",
                    facade.scheme(),
                    status.capacity,
                    status.used,
                    status.remaining,
                    percent
                );
            }
        }

        Command::Snapshot { action } => match action {
            SnapshotCommand::Create { path, name } => {
                let snapshot = facade.create_snapshot(path, name.as_deref())?;
                println!("{snapshot}");
            }
            SnapshotCommand::Delete { path, name } => {
                let done = facade.delete_snapshot(path, name)?;
                ensure_done(done, ClientOp::DeleteSnapshot, path)?;
            }
            SnapshotCommand::Rename {
                path,
                old_name,
                new_name,
            } => {
                let done = facade.rename_snapshot(path, old_name, new_name)?;
                ensure_done(done, ClientOp::RenameSnapshot, path)?;
            }
        },

        Command::DumpConfig => {}
    }
    Ok(())
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let default_level = if args.log_file.is_some() {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_setup::init_global(args.log_file.as_deref(), default_level)
        .context("Failed to initialize logging")?;

    let config = load_config(&args)?;

    // Handle dump-config early (no connection needed)
    if let Command::DumpConfig = args.command {
        return print_json(&config);
    }

    let counting: OnceCell<Arc<CountingClient>> = OnceCell::new();
    let connector = |config: &FacadeConfig| -> Result<Arc<dyn DfsClient>, LifecycleError> {
        let client = Arc::new(CountingClient::new(SchemeConnector.connect(config)?));
        let _ = counting.set(Arc::clone(&client));
        Ok(client as Arc<dyn DfsClient>)
    };

    let lifecycle =
        FacadeLifecycle::start(&config, &connector).context("Failed to start filesystem facade")?;
    let facade = lifecycle.facade().context(
        "Filesystem facade is disabled; pass --address or set \"enabled\": true in the config file",
    )?;

    let result = run(facade, &args.command, args.json);
    lifecycle.shutdown();

    if args.stats {
        if let Some(client) = counting.get() {
            let metrics = client.metrics();
            for (op, calls) in metrics.iter() {
                eprintln!("{:<24} {calls}", op.as_str());
            }
            eprintln!("{:<24} {}", "total", metrics.total_calls());
        }
    }

    result
}
