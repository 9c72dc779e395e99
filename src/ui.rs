// UI layer: resolves the API token, drives an upload session, and prints
// what happened to every file. A spinner shows which file is in flight.

use crate::api::OverviewClient;
use crate::candidate::base_name;
use crate::config::Cli;
use crate::session::{FileReport, SendOutcome, Session};
use anyhow::{Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOKEN_FILE: &str = ".overview_upload_token";

/// Upload the file or directory named on the command line, then finish
/// the session if anything was sent.
pub fn run(cli: Cli) -> Result<()> {
    let path = cli.path.clone();
    if !path.exists() {
        anyhow::bail!("Cannot find file or directory {}", path.display());
    }

    let token = resolve_token(cli.token.as_deref())?;
    if cli.save_token {
        persist_token(&token)?;
    }

    let client = OverviewClient::new(&cli.server, &token).context("Failed to build HTTP client")?;
    let server = client.base_url().to_string();
    let mut session = Session::new(client, cli.options());

    if cli.clear {
        session
            .clear_previous_uploads()
            .context("Failed to clear previous uploads")?;
    }

    let spinner = spinner()?;
    if path.is_dir() {
        spinner.set_message(format!("Uploading {}...", path.display()));
        let report = session.send_directory_with(&path, |file| {
            spinner.println(describe(file));
            spinner.set_message(format!("{} done", file.name));
        });
        spinner.finish_and_clear();
        println!(
            "{} uploaded, {} skipped, {} failed",
            report.uploaded(),
            report.skipped(),
            report.failed()
        );
    } else {
        spinner.set_message(format!("Uploading {}...", path.display()));
        let name = base_name(&path);
        let result = session.send_file(&path);
        spinner.finish_and_clear();
        let outcome = result.with_context(|| format!("Failed to upload {}", path.display()))?;
        println!("{}", describe(&FileReport { name, result: Ok(outcome) }));
    }

    // Send a finish only if we actually uploaded something (may have skipped all)
    if session.finish().context("Failed to finish upload")? {
        println!(
            "Finished uploading {} files. Browse to {}/documentsets to watch progress",
            session.uploaded(),
            server
        );
    } else {
        println!("No files uploaded, nothing to finish");
    }
    Ok(())
}

fn spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

/// One human-readable line per file.
pub fn describe(file: &FileReport) -> String {
    match &file.result {
        Ok(SendOutcome::Uploaded { .. }) => format!("Uploaded {}", file.name),
        Ok(SendOutcome::SkippedUnsupported) => {
            format!("Skipping {}, Overview cannot read this format", file.name)
        }
        Ok(SendOutcome::SkippedDuplicate) => format!("Skipping {}, already on server", file.name),
        Err(err) => format!("Error, skipping {}: {}", file.name, err),
    }
}

/// Token from the command line or environment, else one saved earlier, else
/// ask for it when someone is at the terminal.
fn resolve_token(given: Option<&str>) -> Result<String> {
    if let Some(token) = given.and_then(usable_token) {
        return Ok(token);
    }
    if let Some(token) = load_token().ok().as_deref().and_then(usable_token) {
        return Ok(token);
    }
    if std::io::stdin().is_terminal() {
        // `Password` hides input in terminal.
        let entered: String = Password::new().with_prompt("API token").interact()?;
        return require_token(&entered);
    }
    anyhow::bail!("An API token is required: pass --token or set OVERVIEW_API_TOKEN")
}

fn usable_token(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn require_token(raw: &str) -> Result<String> {
    match usable_token(raw) {
        Some(token) => Ok(token),
        None => anyhow::bail!("An API token is required, got an empty one"),
    }
}

fn token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE)
}

/// Persist token into a file in the user's home directory.
fn persist_token(token: &str) -> Result<()> {
    write_token(&token_path(), token)
}

/// Load token from the user's home directory file.
fn load_token() -> Result<String> {
    read_token(&token_path())
}

// Only the owner may read the saved token.
fn write_token(path: &Path, token: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let save = || -> std::io::Result<()> {
        let mut file = options.open(path)?;
        // `mode` only applies when the file is created.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(token.as_bytes())
    };
    save().with_context(|| format!("Failed to save token to {}", path.display()))
}

fn read_token(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;

    #[test]
    fn given_token_wins_and_is_trimmed() {
        assert_eq!(resolve_token(Some("  abc \n")).unwrap(), "abc");
    }

    #[test]
    fn blank_tokens_are_rejected() {
        assert_eq!(usable_token(" \n\t"), None);
        assert!(require_token("").is_err());
        assert!(require_token("   ").is_err());
        assert_eq!(require_token(" typed \n").unwrap(), "typed");
    }

    #[test]
    fn token_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        write_token(&path, "secret").unwrap();
        write_token(&path, "newer").unwrap();
        assert_eq!(read_token(&path).unwrap(), "newer");
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_token(&path, "secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn every_outcome_is_described() {
        let line = |result| describe(&FileReport { name: "a.pdf".into(), result });
        assert_eq!(
            line(Ok(SendOutcome::Uploaded { handle: uuid::Uuid::nil() })),
            "Uploaded a.pdf"
        );
        assert!(line(Ok(SendOutcome::SkippedUnsupported)).contains("cannot read"));
        assert!(line(Ok(SendOutcome::SkippedDuplicate)).contains("already on server"));
        let failed = line(Err(UploadError::InvalidHeader("x".into())));
        assert!(failed.starts_with("Error, skipping a.pdf"));
    }
}
