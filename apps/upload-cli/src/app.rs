//! Wires the config, the endpoint and the progress bar to the upload client.

use anyhow::Context;
use coursemart_uploader::{
    ChunkedUploadClient, HttpEndpoint, MemoryEndpoint, ProgressFn, UploadEndpoint, UploadError,
    UploadOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::Args;
use crate::config::Config;

/// Uploads `args.file` and returns the reassembled object's reference.
pub async fn run(args: &Args, config: &Config) -> anyhow::Result<UploadOutcome> {
    let cancel = CancellationToken::new();
    let client =
        ChunkedUploadClient::new(config.upload_config())?.with_cancel_token(cancel.clone());

    // Ctrl-C stops before the next chunk attempt.
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling upload");
                cancel.cancel();
            }
        }
    });

    let endpoint: Box<dyn UploadEndpoint> = if args.dry_run {
        tracing::info!("dry run: uploading to in-process store");
        Box::new(MemoryEndpoint::new())
    } else {
        Box::new(
            HttpEndpoint::with_options(
                &config.endpoint,
                config.request_timeout(),
                Some(config.auth_token.as_str()),
            )
            .context("failed to build HTTP client")?,
        )
    };

    let bar = progress_bar();
    let on_progress: Box<ProgressFn> = {
        let bar = bar.clone();
        Box::new(move |pct: u8| bar.set_position(u64::from(pct)))
    };

    let result = client
        .upload_path(&*endpoint, &args.file, Some(&*on_progress))
        .await;
    cancel.cancel();

    match result {
        Ok(outcome) => {
            bar.finish_with_message("done");
            tracing::info!(
                upload_id = %outcome.upload_id,
                chunks = outcome.total_chunks,
                bytes = outcome.total_bytes,
                "upload finished"
            );
            Ok(outcome)
        }
        Err(e) => {
            bar.abandon_with_message("failed");
            let summary = describe_failure(&e);
            Err(anyhow::Error::new(e).context(summary))
        }
    }
}

/// One-line summary telling the user which stage failed.
pub fn describe_failure(err: &UploadError) -> String {
    match err {
        UploadError::Validation(_) => "invalid upload request".into(),
        UploadError::ChunkUpload { chunk, attempts, .. } => {
            format!("upload failed at chunk {chunk} after {attempts} attempts; restart the upload")
        }
        UploadError::Combine { upload_id, .. } => format!(
            "all chunks of upload {upload_id} were stored but reassembly failed"
        ),
        UploadError::Cancelled => "upload cancelled".into(),
        UploadError::Io(_) => "could not read the source file".into(),
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let template = "{spinner} [{elapsed_precise}] {bar:40} {pos}% {msg}";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemart_uploader::TransportError;
    use std::path::PathBuf;

    fn args(file: PathBuf, dry_run: bool) -> Args {
        Args {
            file,
            endpoint: None,
            chunk_size: None,
            max_retries: None,
            config: None,
            dry_run,
        }
    }

    #[tokio::test]
    async fn dry_run_uploads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ebook.pdf");
        std::fs::write(&path, vec![7u8; 2500]).unwrap();

        let config = Config {
            chunk_size: 1000,
            ..Default::default()
        };
        let outcome = run(&args(path, true), &config).await.unwrap();

        assert_eq!(outcome.total_chunks, 3);
        assert_eq!(outcome.total_bytes, 2500);
        assert!(outcome.url.starts_with("memory://"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();

        let err = run(&args(path, true), &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("invalid upload request"));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"x").unwrap();

        let config = Config {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(run(&args(path, true), &config).await.is_err());
    }

    #[tokio::test]
    async fn malformed_endpoint_fails_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"x").unwrap();

        let config = Config {
            endpoint: "not a url".into(),
            ..Default::default()
        };
        let started = std::time::Instant::now();
        let err = run(&args(path, false), &config).await.unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("invalid endpoint URL"), "{msg}");
        // No chunk attempt, so no backoff either.
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }

    #[test]
    fn failure_summaries_name_the_stage() {
        let chunk = UploadError::ChunkUpload {
            chunk: 4,
            attempts: 3,
            source: TransportError::Rejected("nope".into()),
        };
        assert!(describe_failure(&chunk).contains("chunk 4"));

        let combine = UploadError::Combine {
            upload_id: "u-9".into(),
            source: TransportError::Rejected("nope".into()),
        };
        let msg = describe_failure(&combine);
        assert!(msg.contains("u-9"));
        assert!(msg.contains("reassembly"));
    }
}
