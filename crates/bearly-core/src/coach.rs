use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use bearly_store::LogRecord;

use crate::summary::summary_text;

/// Errors from the coaching-tip service
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Failed to start coach process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Coach timed out after {0:?}")]
    Timeout(Duration),

    #[error("Coach exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("Coach returned an empty tip")]
    EmptyResponse,
}

/// What the coach gets to look at.
#[derive(Debug, Clone, PartialEq)]
pub struct TipRequest {
    /// Hours slept in the most recent night.
    pub duration: f64,
    pub restlessness: u8,
    /// Text report over the whole log, if one could be produced.
    pub summary: Option<String>,
}

impl TipRequest {
    /// Request for the most recent record of `records`. `None` if the log is empty.
    pub fn from_log(records: &[LogRecord]) -> Option<Self> {
        let latest = records.last()?;
        Some(Self {
            duration: latest.duration,
            restlessness: latest.restlessness_or_default(),
            summary: summary_text(records).ok(),
        })
    }

    /// Prompt text handed to external coaches.
    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "You are a gentle sleep coach. Last night I slept {:.1} hours with a restlessness of {} out of 5.",
            self.duration, self.restlessness
        );
        if let Some(ref summary) = self.summary {
            prompt.push_str("\n\nHere is a summary of my sleep log:\n");
            prompt.push_str(summary);
        }
        prompt.push_str("\n\nGive me one short, practical tip for tonight.");
        prompt
    }
}

/// A source of coaching tips. Calls may be slow and may fail.
#[async_trait]
pub trait Coach: Send + Sync {
    /// Human-readable name of the coach
    fn name(&self) -> &str;

    async fn suggest(&self, request: &TipRequest) -> Result<String, CoachError>;
}

/// Built-in tips keyed on duration and restlessness.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCoach;

impl RuleCoach {
    pub const SHORT_NIGHT: &'static str =
        "Your duration was a bit low. Try to get to bed 30 minutes earlier tonight.";
    pub const LONG_NIGHT: &'static str =
        "Great job! A longer sleep duration can do wonders for your health.";
    pub const RESTLESS: &'static str =
        "Feeling restless? Try a 10-minute meditation before bed to calm your mind.";
    pub const CALM: &'static str =
        "A calm night! Consistency is key for deep, restorative sleep.";

    pub fn tip_for(duration: f64, restlessness: u8) -> String {
        let duration_tip = if duration < 7.0 {
            Self::SHORT_NIGHT
        } else {
            Self::LONG_NIGHT
        };
        let restlessness_tip = if restlessness > 3 {
            Self::RESTLESS
        } else {
            Self::CALM
        };
        format!("{} {}", duration_tip, restlessness_tip)
    }
}

#[async_trait]
impl Coach for RuleCoach {
    fn name(&self) -> &str {
        "rules"
    }

    async fn suggest(&self, request: &TipRequest) -> Result<String, CoachError> {
        Ok(Self::tip_for(request.duration, request.restlessness))
    }
}

/// Asks an external program for a tip: the prompt goes to stdin and the
/// trimmed stdout comes back as the tip.
pub struct CommandCoach {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCoach {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String, CoachError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // The program may exit without reading; its exit status tells the story
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                debug!(error = %e, "Coach did not accept the prompt");
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(CoachError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let tip = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if tip.is_empty() {
            return Err(CoachError::EmptyResponse);
        }
        Ok(tip)
    }
}

#[async_trait]
impl Coach for CommandCoach {
    fn name(&self) -> &str {
        self.program.to_str().unwrap_or("command")
    }

    async fn suggest(&self, request: &TipRequest) -> Result<String, CoachError> {
        debug!(
            program = %self.program.display(),
            timeout_secs = self.timeout.as_secs_f64(),
            "Requesting coaching tip"
        );

        tokio::time::timeout(self.timeout, self.run(&request.prompt()))
            .await
            .map_err(|_| CoachError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(duration: f64, restlessness: u8) -> TipRequest {
        TipRequest {
            duration,
            restlessness,
            summary: None,
        }
    }

    #[test]
    fn test_rule_tips() {
        assert_eq!(
            RuleCoach::tip_for(6.5, 2),
            format!("{} {}", RuleCoach::SHORT_NIGHT, RuleCoach::CALM)
        );
        assert_eq!(
            RuleCoach::tip_for(7.0, 4),
            format!("{} {}", RuleCoach::LONG_NIGHT, RuleCoach::RESTLESS)
        );
        assert_eq!(
            RuleCoach::tip_for(9.0, 3),
            format!("{} {}", RuleCoach::LONG_NIGHT, RuleCoach::CALM)
        );
    }

    #[test]
    fn test_request_from_empty_log() {
        assert!(TipRequest::from_log(&[]).is_none());
    }

    #[test]
    fn test_request_uses_latest_record() {
        let record = |duration: f64, restlessness: Option<u8>| LogRecord {
            date: Utc::now(),
            duration,
            restlessness,
            phases: Vec::new(),
            noise: 0.0,
            temperature: Some(20.0),
            movement: 0.0,
            shock: false,
            sound: 0.0,
        };
        let records = vec![record(9.0, Some(5)), record(6.0, None)];

        let request = TipRequest::from_log(&records).unwrap();

        assert_eq!(request.duration, 6.0);
        assert_eq!(request.restlessness, 2);
        assert!(request.summary.unwrap().contains("2 records"));
    }

    #[test]
    fn test_prompt_includes_summary() {
        let mut req = request(7.5, 3);
        assert!(!req.prompt().contains("summary of my sleep log"));

        req.summary = Some("- Noise score: 0.10".to_string());
        let prompt = req.prompt();
        assert!(prompt.contains("7.5 hours"));
        assert!(prompt.contains("3 out of 5"));
        assert!(prompt.contains("- Noise score: 0.10"));
    }

    #[tokio::test]
    async fn test_rule_coach_never_fails() {
        let tip = RuleCoach.suggest(&request(5.0, 5)).await.unwrap();

        assert!(tip.starts_with(RuleCoach::SHORT_NIGHT));
        assert!(tip.ends_with(RuleCoach::RESTLESS));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_coach_returns_stdout() {
        let coach = CommandCoach::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "cat > /dev/null; echo '  Dim the lights early.  '".to_string()],
        );

        let tip = coach.suggest(&request(7.0, 2)).await.unwrap();

        assert_eq!(tip, "Dim the lights early.");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_coach_failure() {
        let coach = CommandCoach::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
        );

        let err = coach.suggest(&request(7.0, 2)).await.unwrap_err();

        match err {
            CoachError::Failed { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_coach_empty_output() {
        let coach = CommandCoach::new(PathBuf::from("true"), Vec::new());

        let err = coach.suggest(&request(7.0, 2)).await.unwrap_err();

        assert!(matches!(err, CoachError::EmptyResponse));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_coach_timeout() {
        let coach = CommandCoach::new(PathBuf::from("sleep"), vec!["5".to_string()])
            .with_timeout(Duration::from_millis(100));

        let err = coach.suggest(&request(7.0, 2)).await.unwrap_err();

        assert!(matches!(err, CoachError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_command_coach_missing_program() {
        let coach = CommandCoach::new(PathBuf::from("/nonexistent/bearly-coach"), Vec::new());

        let err = coach.suggest(&request(7.0, 2)).await.unwrap_err();

        assert!(matches!(err, CoachError::Spawn(_)));
    }
}
