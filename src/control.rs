//! Out-of-band control channel.
//!
//! A Unix-domain socket accepting UTF-8 line commands:
//!
//! ```text
//! url http://panel.lan:8123/lovelace/0
//! reload
//! ```
//!
//! Every line is answered with `ok` or `error: <reason>`.

use crate::app::event::AppEvent;
use crate::error::ControlError;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Url(String),
    Reload,
}

impl ControlCommand {
    pub fn to_line(&self) -> String {
        match self {
            ControlCommand::Url(url) => format!("url {}\n", url),
            ControlCommand::Reload => "reload\n".to_string(),
        }
    }

    pub fn into_event(self) -> AppEvent {
        match self {
            ControlCommand::Url(url) => AppEvent::PushUrl { url },
            ControlCommand::Reload => AppEvent::Reload,
        }
    }
}

pub fn parse_command(line: &str) -> Result<ControlCommand, ControlError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ControlError::Empty);
    }
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    match cmd.to_ascii_lowercase().as_str() {
        "url" => {
            if arg.is_empty() {
                Err(ControlError::MissingArgument("url"))
            } else {
                Ok(ControlCommand::Url(arg.to_string()))
            }
        }
        "reload" => Ok(ControlCommand::Reload),
        _ => Err(ControlError::Unknown(cmd.to_string())),
    }
}

/// Listening control socket. The socket file is removed on drop.
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlServer {
    pub fn bind(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if path.exists() {
            cleanup_stale_socket(path)?;
        }
        let listener = UnixListener::bind(path)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o660))?;
        tracing::info!("Control socket listening on {}", path.display());
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept clients until the task is aborted or the controller goes away.
    pub fn spawn(self, event_tx: mpsc::UnboundedSender<AppEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.listener.accept().await {
                    Ok((stream, _)) => {
                        let tx = event_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, tx).await {
                                tracing::debug!("Control client error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Control socket accept failed: {}", e);
                        break;
                    }
                }
                if event_tx.is_closed() {
                    break;
                }
            }
        })
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

async fn serve_client(
    stream: UnixStream,
    event_tx: mpsc::UnboundedSender<AppEvent>,
) -> io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match parse_command(&line) {
            Ok(cmd) => {
                tracing::info!("Control command: {:?}", cmd);
                if event_tx.send(cmd.into_event()).is_ok() {
                    "ok\n".to_string()
                } else {
                    "error: kiosk is shutting down\n".to_string()
                }
            }
            Err(e) => format!("error: {}\n", e),
        };
        write.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

fn cleanup_stale_socket(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.file_type().is_socket() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("refusing to overwrite non-socket path at {}", path.display()),
        ));
    }
    match std::os::unix::net::UnixStream::connect(path) {
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("socket {} is already active", path.display()),
        )),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            fs::remove_file(path)
        }
        Err(err) => Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("socket {} could not be validated as stale: {}", path.display(), err),
        )),
    }
}

/// Send one command to a running kiosk and return its reply.
pub async fn send_command(path: &Path, command: &ControlCommand) -> Result<String> {
    let stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("Failed to connect to {}", path.display()))?;
    let (read, mut write) = stream.into_split();
    write
        .write_all(command.to_line().as_bytes())
        .await
        .context("Failed to send command")?;
    write.shutdown().await.context("Failed to send command")?;

    let mut reply = String::new();
    BufReader::new(read)
        .read_line(&mut reply)
        .await
        .context("Failed to read reply")?;
    let reply = reply.trim().to_string();
    if let Some(reason) = reply.strip_prefix("error: ") {
        bail!("Kiosk refused command: {}", reason);
    }
    Ok(reply)
}
