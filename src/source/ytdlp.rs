//! yt-dlp caption source
//!
//! Runs `yt-dlp` to download subtitles only, in the `json3` format, into a
//! per-request temporary directory and parses the result.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::timedtext::watch_url;
use super::CaptionSource;
use crate::config::CaptionConfig;
use crate::error::CaptionError;
use crate::window::CaptionEntry;

/// json3 subtitle document
#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Caption source that shells out to yt-dlp
pub struct YtDlpSource {
    program: String,
    languages: Vec<String>,
    cookies_file: Option<PathBuf>,
    base_url: String,
    timeout: Duration,
}

impl YtDlpSource {
    pub fn new(config: &CaptionConfig) -> Self {
        Self {
            program: config.ytdlp_path.clone(),
            languages: config.languages.clone(),
            cookies_file: config.cookies_file.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }

    fn command(&self, video_url: &str, out_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(self.languages.join(","))
            .arg("--sub-format")
            .arg("json3")
            .arg("--no-playlist")
            .arg("--no-warnings");

        if let Some(cookies) = &self.cookies_file {
            command.arg("--cookies").arg(cookies);
        }

        command
            .arg("--output")
            .arg(out_dir.join("%(id)s"))
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl CaptionSource for YtDlpSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
        let out_dir = tempfile::tempdir()
            .map_err(|e| CaptionError::Upstream(format!("cannot create temp dir: {}", e)))?;

        let video_url = watch_url(&self.base_url, video_id)?;
        tracing::debug!("Running {} for {}", self.program, video_url);
        let mut command = self.command(video_url.as_str(), out_dir.path());
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                CaptionError::Upstream(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| CaptionError::Upstream(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(video_id, &stderr));
        }

        let file = find_subtitle_file(out_dir.path(), &self.languages)
            .await
            .map_err(|e| CaptionError::Upstream(format!("cannot read yt-dlp output: {}", e)))?
            .ok_or_else(|| {
                CaptionError::unavailable(video_id, "Subtitles are disabled for this video")
            })?;
        tracing::debug!("Parsing subtitles from {}", file.display());

        let content = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| CaptionError::Upstream(format!("cannot read {}: {}", file.display(), e)))?;
        parse_json3(&content)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Map a failed yt-dlp run to an error kind using its stderr
pub fn classify_failure(video_id: &str, stderr: &str) -> CaptionError {
    let message = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("yt-dlp failed")
        .trim()
        .trim_start_matches("ERROR: ")
        .to_string();

    let lower = stderr.to_lowercase();
    if lower.contains("no subtitles") || lower.contains("video unavailable") {
        CaptionError::unavailable(video_id, message)
    } else {
        CaptionError::Upstream(message)
    }
}

/// Locate the downloaded `.json3` file, honouring language preference.
///
/// yt-dlp names files `<id>.<lang>.json3`.
pub async fn find_subtitle_file(
    dir: &Path,
    languages: &[String],
) -> std::io::Result<Option<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json3") {
            files.push(path);
        }
    }
    files.sort();

    let lang_of = |p: &Path| {
        p.file_stem()
            .and_then(|s| Path::new(s).extension())
            .map(|l| l.to_string_lossy().to_string())
    };

    let preferred = languages.iter().find_map(|lang| {
        files
            .iter()
            .find(|p| lang_of(p.as_path()).as_deref() == Some(lang.as_str()))
    });

    Ok(preferred.or_else(|| files.first()).cloned())
}

/// Parse a json3 subtitle document.
///
/// Events without segments or with whitespace-only text carry no caption
/// and are dropped.
pub fn parse_json3(content: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
    let doc: Json3 = serde_json::from_str(content)
        .map_err(|e| CaptionError::Upstream(format!("malformed json3 subtitles: {}", e)))?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|s| s.utf8).collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(CaptionEntry::new(
                event.t_start_ms / 1000.0,
                event.d_duration_ms / 1000.0,
                text,
            ))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON3: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 100000, "id": 1, "wpWinPosId": 1},
            {"tStartMs": 160, "dDurationMs": 2400, "wWinId": 1, "segs": [{"utf8": "hey "}, {"utf8": "there", "tOffsetMs": 400}]},
            {"tStartMs": 2560, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 2570, "segs": [{"utf8": "general kenobi"}]}
        ]
    }"#;

    #[test]
    fn test_parse_json3() {
        let entries = parse_json3(JSON3).unwrap();
        assert_eq!(
            entries,
            vec![
                CaptionEntry::new(0.16, 2.4, "hey there"),
                CaptionEntry::new(2.57, 0.0, "general kenobi"),
            ]
        );
    }

    #[test]
    fn test_parse_json3_malformed() {
        assert!(matches!(
            parse_json3("not json"),
            Err(CaptionError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_find_subtitle_file_prefers_language() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["abc.de.json3", "abc.en.json3", "abc.info.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let langs = vec!["fr".to_string(), "en".to_string()];
        let found = find_subtitle_file(dir.path(), &langs).await.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.en.json3");

        let langs = vec!["es".to_string()];
        let found = find_subtitle_file(dir.path(), &langs).await.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.de.json3");
    }

    #[tokio::test]
    async fn test_find_subtitle_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_subtitle_file(dir.path(), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_subtitle_file_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(find_subtitle_file(&missing, &[]).await.is_err());
    }

    #[test]
    fn test_classify_failure() {
        let err = classify_failure(
            "abc",
            "[youtube] abc: Downloading webpage\nERROR: [youtube] abc: Video unavailable\n",
        );
        assert!(matches!(err, CaptionError::Unavailable { .. }));
        assert!(err.to_string().ends_with("[youtube] abc: Video unavailable"));

        let err = classify_failure("abc", "ERROR: unable to download webpage: HTTP Error 403\n");
        assert_eq!(
            err.to_string(),
            "Failed to retrieve captions: unable to download webpage: HTTP Error 403"
        );
    }

    #[test]
    fn test_command_arguments() {
        let config = CaptionConfig {
            cookies_file: Some(PathBuf::from("/tmp/cookies.txt")),
            languages: vec!["en".to_string(), "de".to_string()],
            ..Default::default()
        };
        let source = YtDlpSource::new(&config);
        let command = source.command("https://www.youtube.com/watch?v=abc", Path::new("/tmp/out"));
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert!(args.windows(2).any(|w| w == ["--sub-langs", "en,de"]));
        assert!(args.windows(2).any(|w| w == ["--cookies", "/tmp/cookies.txt"]));
        assert!(args.windows(2).any(|w| w == ["--output", "/tmp/out/%(id)s"]));
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_upstream_error() {
        let config = CaptionConfig {
            ytdlp_path: "/nonexistent/yt-dlp".to_string(),
            ..Default::default()
        };
        let source = YtDlpSource::new(&config);
        let err = source.fetch("abc").await.unwrap_err();
        assert!(matches!(err, CaptionError::Upstream(_)));
    }
}
