//! Line-oriented review console
//!
//! A thin caller of [`ReviewEngine`]: one command per stdin line, plain
//! text on stdout. Anything richer belongs to a real UI.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::config::{AppConfig, ConfigStorage, CredentialMode, Keychain};
use crate::error::{EngineError, EngineResult};
use crate::media::{DisplayFlags, MediaKind};
use crate::preview::{fetch_bytes, TempPreview};
use crate::remote::{RemoteFs, RemoteSession};
use crate::review::{CommitStart, ReviewEngine, ReviewPhase, Step, UndoOutcome};
use crate::ssh::{KnownHostsStore, PingResult, SshConfig};

const HELP: &str = "k keep | d delete | u undo | c commit now | s save | v view | r refresh \
| f images|videos|both | i <file>... import | x clear cache | p ping | n reconnect | l logout | q quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Keep,
    Delete,
    Undo,
    CommitNow,
    Save,
    View,
    Refresh,
    Flags(DisplayFlags),
    Import(Vec<PathBuf>),
    ClearCache,
    Ping,
    Reconnect,
    Logout,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let cmd = match words.next()? {
            "k" => Self::Keep,
            "d" => Self::Delete,
            "u" => Self::Undo,
            "c" => Self::CommitNow,
            "s" => Self::Save,
            "v" => Self::View,
            "r" => Self::Refresh,
            "f" => {
                let (show_images, show_videos) = match words.next()? {
                    "images" => (true, false),
                    "videos" => (false, true),
                    "both" => (true, true),
                    _ => return None,
                };
                Self::Flags(DisplayFlags {
                    show_images,
                    show_videos,
                })
            }
            "i" => {
                let files: Vec<PathBuf> = words.by_ref().map(PathBuf::from).collect();
                if files.is_empty() {
                    return None;
                }
                Self::Import(files)
            }
            "x" => Self::ClearCache,
            "p" => Self::Ping,
            "n" => Self::Reconnect,
            "l" => Self::Logout,
            "q" => Self::Quit,
            "?" | "h" | "help" => Self::Help,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Reply to the commit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitAnswer {
    Confirm { backup: Option<PathBuf> },
    Cancel,
}

impl CommitAnswer {
    /// `y`, or `b <folder>` to back up first; anything else cancels
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("y"), _) => Self::Confirm { backup: None },
            (Some("b"), Some(dir)) => Self::Confirm {
                backup: Some(PathBuf::from(dir)),
            },
            _ => Self::Cancel,
        }
    }
}

/// Reply after a commit that deleted nothing because it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAnswer {
    Retry,
    ReconnectAndRetry,
    Cancel,
}

impl RetryAnswer {
    /// `r` or `n`; anything else, end of input included, cancels
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "r" => Self::Retry,
            "n" => Self::ReconnectAndRetry,
            _ => Self::Cancel,
        }
    }
}

struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn prompt(&mut self, text: &str) -> EngineResult<Option<String>> {
        let mut stdout = tokio::io::stdout();
        let io = |e: std::io::Error| EngineError::Remote(e.to_string());
        stdout.write_all(text.as_bytes()).await.map_err(io)?;
        stdout.flush().await.map_err(io)?;
        self.lines
            .next_line()
            .await
            .map_err(io)
    }
}

/// Load state, connect, and review until `q`, `l` or end of input
pub async fn run() -> EngineResult<()> {
    let storage = ConfigStorage::new()?;
    let mut config = storage.load().await?;
    if !config.has_connection() {
        storage.save(&config).await?;
        println!(
            "No connection configured. Set host and username in {}",
            storage.path().display()
        );
        return Ok(());
    }

    let mut console = Console::new();
    let keychain = Keychain::new();
    let secret = resolve_secret(&mut console, &keychain, &storage, &mut config).await?;

    let ssh = config.ssh_config(secret);
    let session = Arc::new(RemoteSession::new(Arc::new(KnownHostsStore::open_default())));
    session
        .connect(ssh.clone(), &[config.originals_root.as_str()])
        .await?;

    let mut engine = ReviewEngine::open(session.clone(), storage, config).await?;
    let preview = TempPreview::new();
    println!("{} items to review. {}", engine.len(), HELP);

    loop {
        show_current(&engine);
        let Some(line) = console.prompt("> ").await? else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            println!("{}", HELP);
            continue;
        };

        let outcome = match command {
            Command::Quit => break,
            Command::Logout => {
                preview.clear();
                return engine.logout(&keychain).await;
            }
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            // A dialog left open by an earlier failure comes back first
            _ if engine.phase() == ReviewPhase::Committing => {
                commit_dialog(&mut console, &mut engine, &session, &ssh).await
            }
            other => execute(&mut console, &mut engine, &session, &ssh, &preview, other).await,
        };
        if let Err(e) = outcome {
            tracing::error!("{}", e);
            println!("Error: {}", e);
        }
    }

    engine.save_progress().await?;
    session.disconnect().await;
    Ok(())
}

async fn execute(
    console: &mut Console,
    engine: &mut ReviewEngine,
    session: &RemoteSession,
    ssh: &SshConfig,
    preview: &TempPreview,
    command: Command,
) -> EngineResult<()> {
    match command {
        Command::Keep => {
            if engine.keep().await? == Step::ReachedEnd {
                start_commit(console, engine, session, ssh, false).await?;
            }
        }
        Command::Delete => {
            if engine.delete_current().await? == Step::ReachedEnd {
                start_commit(console, engine, session, ssh, false).await?;
            }
        }
        Command::Undo => {
            if let UndoOutcome::NothingToUndo = engine.undo().await? {
                println!("\x07Nothing to undo");
            }
        }
        Command::CommitNow => start_commit(console, engine, session, ssh, true).await?,
        Command::Save => engine.save_progress().await?,
        Command::View => {
            if let Some(entry) = engine.current().cloned() {
                match entry.kind {
                    MediaKind::Image => {
                        let bytes = fetch_bytes(engine.fs(), &entry.remote_path).await?;
                        println!("{} ({} bytes)", entry.remote_path, bytes.len());
                    }
                    MediaKind::Video => {
                        let local = preview.fetch(engine.fs(), &entry.remote_path).await?;
                        println!("Saved to {}", local.display());
                    }
                }
            }
        }
        Command::Refresh => engine.refresh().await?,
        Command::Flags(flags) => engine.apply_display_flags(flags).await?,
        Command::Import(files) => {
            let report = engine.import_files(&files).await?;
            println!(
                "Imported {}, failed {}",
                report.uploaded.len(),
                report.failed.len()
            );
            for failure in &report.failed {
                println!("  {}: {}", failure.local_path.display(), failure.error);
            }
        }
        Command::ClearCache => {
            let report = engine.clear_cache().await?;
            println!(
                "Removed {} files and {} folders",
                report.files_deleted, report.dirs_deleted
            );
        }
        Command::Ping => match session.ping().await? {
            PingResult::Ok => println!("Connection alive"),
            PingResult::Timeout => println!("Ping timed out"),
            PingResult::IoError => println!("Connection lost"),
        },
        Command::Reconnect => {
            reconnect(engine, session, ssh).await?;
            println!("Reconnected, {} items to review", engine.len());
        }
        Command::Help => println!("{}", HELP),
        Command::Quit | Command::Logout => {}
    }
    Ok(())
}

/// Open the commit flow and run the dialog
async fn start_commit(
    console: &mut Console,
    engine: &mut ReviewEngine,
    session: &RemoteSession,
    ssh: &SshConfig,
    early: bool,
) -> EngineResult<()> {
    let start = if early {
        engine.bulk_commit_now()?
    } else {
        engine.begin_commit()?
    };
    if start == CommitStart::NothingQueued {
        println!("Nothing queued for deletion");
        return Ok(());
    }
    commit_dialog(console, engine, session, ssh).await
}

/// List the queue, then confirm (optionally with a backup folder) or
/// cancel. A commit that fails before deleting anything can be retried,
/// retried after a reconnect, or cancelled.
async fn commit_dialog(
    console: &mut Console,
    engine: &mut ReviewEngine,
    session: &RemoteSession,
    ssh: &SshConfig,
) -> EngineResult<()> {
    let paths = engine.pending().to_vec();
    println!("{} file(s) queued for deletion:", paths.len());
    for path in &paths {
        println!("  {}", path);
    }
    let answer = console
        .prompt("Delete now? [y / n / b <backup folder>] ")
        .await?
        .unwrap_or_default();
    let backup = match CommitAnswer::parse(&answer) {
        CommitAnswer::Confirm { backup } => backup,
        CommitAnswer::Cancel => return cancel_commit(engine).await,
    };

    let resolution = loop {
        match engine.confirm_commit(backup.as_deref()).await {
            Ok(resolution) => break resolution,
            Err(e) => {
                tracing::error!("Commit failed: {}", e);
                println!("Commit failed, nothing deleted: {}", e);
                let answer = console
                    .prompt("[r retry / n reconnect and retry / c cancel] ")
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_default();
                match RetryAnswer::parse(&answer) {
                    RetryAnswer::Retry => {}
                    RetryAnswer::ReconnectAndRetry => {
                        if let Err(e) = reconnect(engine, session, ssh).await {
                            println!("Reconnect failed: {}", e);
                        }
                    }
                    RetryAnswer::Cancel => return cancel_commit(engine).await,
                }
            }
        }
    };

    let report = &resolution.report;
    println!("Deleted {}, failed {}", report.succeeded, report.failed.len());
    for name in report.failed_names() {
        println!("  failed: {}", name);
    }
    if !report.backup_failed.is_empty() {
        println!("  {} backup(s) failed", report.backup_failed.len());
    }
    if let Some(e) = &resolution.persist_error {
        println!("Warning: progress not saved: {}", e);
    }
    Ok(())
}

async fn cancel_commit(engine: &mut ReviewEngine) -> EngineResult<()> {
    engine.cancel_commit().await?;
    println!("Kept {} queued", engine.pending().len());
    Ok(())
}

/// Open a fresh connection with the same settings. The catalog is rebuilt
/// unless a commit dialog is open.
async fn reconnect(
    engine: &mut ReviewEngine,
    session: &RemoteSession,
    ssh: &SshConfig,
) -> EngineResult<()> {
    let root = engine.config().originals_root.clone();
    session.connect(ssh.clone(), &[root.as_str()]).await?;
    if engine.phase() != ReviewPhase::Committing {
        engine.refresh().await?;
    }
    Ok(())
}

/// Password from the keychain (asking once and storing it if absent), or
/// the key passphrase, asked every time
async fn resolve_secret(
    console: &mut Console,
    keychain: &Keychain,
    storage: &ConfigStorage,
    config: &mut AppConfig,
) -> EngineResult<Option<String>> {
    match config.credential_mode {
        CredentialMode::Password => {
            if let Some(id) = &config.password_keychain_id {
                return Ok(Some(keychain.get(id)?));
            }
            let password = console.prompt("Password: ").await?.unwrap_or_default();
            config.password_keychain_id = Some(keychain.store_new(&password)?);
            storage.save(config).await?;
            Ok(Some(password))
        }
        CredentialMode::Key => {
            let passphrase = console
                .prompt("Key passphrase (empty for none): ")
                .await?
                .filter(|p| !p.is_empty());
            Ok(passphrase)
        }
    }
}

fn show_current(engine: &ReviewEngine) {
    match engine.current() {
        Some(entry) => println!(
            "[{}/{}] {:?} {} ({} queued)",
            engine.index() + 1,
            engine.len(),
            entry.kind,
            entry.remote_path,
            engine.pending().len()
        ),
        None => println!("No item ({} queued)", engine.pending().len()),
    }
}
