//! HTML → PDF printing through a headless Chromium process.
//!
//! Each render gets its own temp directory and its own browser process. Both are
//! released when the render future finishes or is dropped: the directory by
//! `TempDir`'s destructor, the process by `kill_on_drop`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::AppError;

#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn print_pdf(&self, html: &str) -> Result<Vec<u8>, AppError>;
}

pub struct ChromePdfEngine {
    chrome_bin: String,
    timeout: Duration,
}

impl ChromePdfEngine {
    pub fn new(chrome_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            chrome_bin: chrome_bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfEngine for ChromePdfEngine {
    async fn print_pdf(&self, html: &str) -> Result<Vec<u8>, AppError> {
        let workdir = tempfile::Builder::new()
            .prefix("vitae-render")
            .tempdir()
            .map_err(|e| AppError::RenderFailed(format!("temp dir: {e}")))?;
        let html_path = workdir.path().join("cv.html");
        let pdf_path = workdir.path().join("cv.pdf");
        tokio::fs::write(&html_path, html)
            .await
            .map_err(|e| AppError::RenderFailed(format!("write html: {e}")))?;

        let mut command = Command::new(&self.chrome_bin);
        command
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg("--run-all-compositor-stages-before-draw")
            .arg(format!("--user-data-dir={}", workdir.path().join("profile").display()))
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", html_path.display()));

        debug!("Printing PDF with {}", self.chrome_bin);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                warn!("PDF printing exceeded {}s; browser killed", self.timeout.as_secs());
                AppError::RenderFailed(format!(
                    "PDF printing timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::RenderFailed(format!("failed to start {}: {e}", self.chrome_bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::RenderFailed(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pdf = tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| AppError::RenderFailed(format!("browser produced no PDF: {e}")))?;
        if !pdf.starts_with(b"%PDF") {
            return Err(AppError::RenderFailed("browser output is not a PDF".to_string()));
        }

        Ok(pdf)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Writes an executable stand-in for the browser.
    fn fake_browser(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake-chrome");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reads_pdf_written_by_browser() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_browser(
            &dir,
            r#"for a in "$@"; do case "$a" in --print-to-pdf=*) printf '%%PDF-1.7 fake' > "${a#--print-to-pdf=}";; esac; done"#,
        );
        let engine = ChromePdfEngine::new(bin.display().to_string(), Duration::from_secs(10));

        let pdf = engine.print_pdf("<html></html>").await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_render_failed_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_browser(&dir, "echo 'no display' >&2; exit 3");
        let engine = ChromePdfEngine::new(bin.display().to_string(), Duration::from_secs(10));

        let err = engine.print_pdf("<html></html>").await.unwrap_err();
        assert!(matches!(err, AppError::RenderFailed(ref m) if m.contains("no display")));
    }

    #[tokio::test]
    async fn test_hung_browser_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_browser(&dir, "sleep 30");
        let engine = ChromePdfEngine::new(bin.display().to_string(), Duration::from_millis(300));

        let err = engine.print_pdf("<html></html>").await.unwrap_err();
        assert!(matches!(err, AppError::RenderFailed(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_missing_binary_is_render_failed() {
        let engine = ChromePdfEngine::new("/nonexistent/chromium", Duration::from_secs(1));
        let err = engine.print_pdf("<html></html>").await.unwrap_err();
        assert!(matches!(err, AppError::RenderFailed(_)));
    }
}
