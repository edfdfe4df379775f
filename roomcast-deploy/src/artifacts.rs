use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::collaborators::ArtifactWriter;

/// Writes artifacts to the local filesystem
///
/// Contents go to a sibling temp file which is then renamed over the
/// destination, so readers never see a half-written config. With `sudo`
/// the same steps run as `sudo mkdir`, `sudo tee` and `sudo mv`.
#[derive(Debug, Clone, Default)]
pub struct FsArtifactWriter {
    use_sudo: bool,
}

impl FsArtifactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sudo(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    async fn write_direct(&self, path: &Path, tmp: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = parent_dir(path) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(tmp, contents).await?;
        tokio::fs::rename(tmp, path).await
    }

    async fn write_privileged(&self, path: &Path, tmp: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = parent_dir(path) {
            run(sudo(&[OsStr::new("mkdir"), OsStr::new("-p"), parent.as_os_str()])).await?;
        }

        let (mut command, line) = sudo(&[OsStr::new("tee"), tmp.as_os_str()]);
        tracing::debug!(command = %line, "running");
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(contents.as_bytes()).await?;
        }
        check(line, child.wait_with_output().await?)?;

        run(sudo(&[OsStr::new("mv"), OsStr::new("-f"), tmp.as_os_str(), path.as_os_str()])).await
    }

    async fn remove_temp(&self, tmp: &Path) {
        let removed = if self.use_sudo {
            run(sudo(&[OsStr::new("rm"), OsStr::new("-f"), tmp.as_os_str()])).await
        } else {
            match tokio::fs::remove_file(tmp).await {
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        };
        if let Err(error) = removed {
            tracing::warn!(path = %tmp.display(), %error, "failed to remove temp file");
        }
    }
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".roomcast-tmp");
    path.with_file_name(name)
}

/// A `sudo` command and its printable form
fn sudo(args: &[&OsStr]) -> (Command, String) {
    let mut line = vec!["sudo".to_string()];
    line.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));

    let mut command = Command::new("sudo");
    command.args(args).kill_on_drop(true);
    (command, line.join(" "))
}

async fn run((mut command, line): (Command, String)) -> io::Result<()> {
    tracing::debug!(command = %line, "running");
    let output = command.stdin(Stdio::null()).output().await?;
    check(line, output)
}

fn check(line: String, output: std::process::Output) -> io::Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(io::Error::other(format!(
        "{} exited with {}: {}",
        line,
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    )))
}

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let tmp = temp_path(path);
        let result = if self.use_sudo {
            self.write_privileged(path, &tmp, contents).await
        } else {
            self.write_direct(path, &tmp, contents).await
        };

        if let Err(error) = result {
            self.remove_temp(&tmp).await;
            return Err(error);
        }

        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("asound.conf");
        let writer = FsArtifactWriter::new();

        writer.write(&path, "first\n").await.unwrap();
        writer.write(&path, "second\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // A regular file cannot be used as a directory
        let result = FsArtifactWriter::new().write(&blocker.join("asound.conf"), "x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file
        let path = dir.path().join("asound.conf");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let result = FsArtifactWriter::new().write(&path, "pcm.x {}\n").await;
        assert!(result.is_err());
        assert!(!temp_path(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_sudo_command_line() {
        let tmp = Path::new("/etc/asound.conf.roomcast-tmp");
        let (_, line) = sudo(&[OsStr::new("tee"), tmp.as_os_str()]);
        assert_eq!(line, "sudo tee /etc/asound.conf.roomcast-tmp");

        let (_, line) = sudo(&[
            OsStr::new("mv"),
            OsStr::new("-f"),
            tmp.as_os_str(),
            Path::new("/etc/asound.conf").as_os_str(),
        ]);
        assert_eq!(line, "sudo mv -f /etc/asound.conf.roomcast-tmp /etc/asound.conf");
    }

    #[test]
    fn test_sudo_flag() {
        assert!(!FsArtifactWriter::new().use_sudo);
        assert!(FsArtifactWriter::with_sudo(true).use_sudo);
    }
}
