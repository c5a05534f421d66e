use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use bearly_core::{
    pick_uplifting_message, summarize, Coach, EndOutcome, RecordScore, ScoreSummary,
    SessionController, SessionError, SleepSummary, StartOutcome, TipRequest, PHASE_BREAKDOWN,
};
use bearly_logging::{LogEvent, Logger};
use bearly_store::LogRecord;

/// Exit code for input the user has to correct.
const EXIT_INVALID_INPUT: i32 = 2;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a sleep session
    Start,

    /// End the running sleep session and log it
    End,

    /// Log a night by hand
    Log {
        /// Hours slept (e.g. 7.5)
        #[arg(short, long)]
        duration: f64,

        /// Restlessness from 1 (calm) to 5 (very restless)
        #[arg(short, long, default_value_t = 2)]
        restlessness: u8,
    },

    /// Show whether a session is running
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List logged nights with their scores
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show average scores and the sleep summary
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the coach for a tip about the most recent night
    Tip,

    /// Delete all logged nights and the current session
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Everything a command needs to run.
pub struct CommandContext<'a> {
    pub controller: &'a SessionController<'a>,
    pub coach: &'a dyn Coach,
    pub logger: &'a Logger,
    pub seed: Option<u64>,
}

/// Run `command` and return the process exit code.
pub async fn handle_command(command: Command, ctx: &CommandContext<'_>) -> Result<i32> {
    let controller = ctx.controller;

    match command {
        Command::Start => match controller.start()? {
            StartOutcome::Started { at } => ctx.logger.log(&LogEvent::SessionStarted { at }),
            StartOutcome::AlreadySleeping { since } => {
                ctx.logger.log(&LogEvent::AlreadySleeping { since })
            }
        },
        Command::End => match controller.end()? {
            EndOutcome::Ended(record) => {
                let score = RecordScore::of(&record);
                ctx.logger.log(&LogEvent::SessionEnded {
                    duration_hours: record.duration,
                    quality: score.quality,
                    energy: score.energy,
                });
                after_logging(ctx).await;
            }
            EndOutcome::NotSleeping => ctx.logger.log(&LogEvent::NotSleeping),
        },
        Command::Log {
            duration,
            restlessness,
        } => match controller.log_manual(duration, restlessness) {
            Ok(record) => {
                let score = RecordScore::of(&record);
                ctx.logger.log(&LogEvent::SleepLogged {
                    duration_hours: record.duration,
                    restlessness: record.restlessness_or_default(),
                    quality: score.quality,
                    energy: score.energy,
                });
                after_logging(ctx).await;
            }
            Err(SessionError::Validation(e)) => {
                eprintln!("{} {}", "✗".bright_red(), e);
                eprintln!(
                    "  {}",
                    "Please enter a valid sleep duration and restlessness score.".dimmed()
                );
                return Ok(EXIT_INVALID_INPUT);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Status { json } => {
            let state = controller.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else if let Some(since) = state.sleeping_since() {
                let hours = (Utc::now() - since).num_minutes() as f64 / 60.0;
                println!(
                    "{} since {} ({:.1}h so far)",
                    "SLEEPING".bright_cyan().bold(),
                    since.format("%Y-%m-%d %H:%M UTC"),
                    hours
                );
            } else {
                println!("{}", "IDLE".dimmed());
            }
        }
        Command::History { json } => {
            let records = controller.history();
            if json {
                let rows: Vec<HistoryRow> = records.iter().map(HistoryRow::from).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if records.is_empty() {
                println!(
                    "{}",
                    "No sleep logs yet. Log your first night with `bearly log` or `bearly start`."
                        .dimmed()
                );
            } else {
                print_history_table(&records);
            }
        }
        Command::Stats { json } => {
            let records = controller.history();
            let report = StatsReport {
                scores: ScoreSummary::from_records(&records),
                summary: summarize(&records).ok(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_stats(&report);
            }
        }
        Command::Tip => {
            if !request_tip(ctx).await {
                println!("{}", "No sleep logs yet, nothing to coach on.".dimmed());
            }
        }
        Command::Reset { yes } => {
            let confirmed = yes
                || dialoguer::Confirm::new()
                    .with_prompt("Delete all sleep logs and the current session?")
                    .default(false)
                    .interact()?;

            if confirmed {
                controller.reset()?;
                ctx.logger.log(&LogEvent::StoresReset);
            } else {
                println!("{}", "Nothing deleted.".dimmed());
            }
        }
    }

    Ok(0)
}

/// Tip and encouragement shown after a night is logged.
async fn after_logging(ctx: &CommandContext<'_>) {
    request_tip(ctx).await;

    let mut rng = match ctx.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    println!("{} {}", "♥".bright_magenta(), pick_uplifting_message(&mut rng));
}

/// Ask the coach about the latest night. Failures are reported, never fatal.
/// Returns false when there is nothing to ask about.
async fn request_tip(ctx: &CommandContext<'_>) -> bool {
    let records = ctx.controller.history();
    let Some(request) = TipRequest::from_log(&records) else {
        return false;
    };

    let coach = ctx.coach.name().to_string();
    match ctx.coach.suggest(&request).await {
        Ok(tip) => ctx.logger.log(&LogEvent::TipReady { coach, tip }),
        Err(e) => ctx.logger.log(&LogEvent::TipFailed {
            coach,
            error: e.to_string(),
        }),
    }
    true
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    #[serde(flatten)]
    record: &'a LogRecord,
    quality: f64,
    energy: f64,
}

impl<'a> From<&'a LogRecord> for HistoryRow<'a> {
    fn from(record: &'a LogRecord) -> Self {
        let score = RecordScore::of(record);
        Self {
            record,
            quality: score.quality,
            energy: score.energy,
        }
    }
}

#[derive(Serialize)]
struct StatsReport {
    scores: ScoreSummary,
    summary: Option<SleepSummary>,
}

fn print_history_table(records: &[LogRecord]) {
    println!(
        "{:<18} {:<10} {:<10} {:<8} {}",
        "DATE".dimmed(),
        "DURATION".dimmed(),
        "RESTLESS".dimmed(),
        "QUALITY".dimmed(),
        "ENERGY".dimmed(),
    );

    for record in records {
        let score = RecordScore::of(record);
        let restlessness = record
            .restlessness
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<18} {:<10} {:<10} {:<8} {}",
            record.date.format("%Y-%m-%d %H:%M"),
            format!("{:.1}h", record.duration),
            restlessness,
            color_score(score.quality),
            color_score(score.energy),
        );
    }
}

fn print_stats(report: &StatsReport) {
    println!("{}", "=== Sleep Statistics ===".bright_blue().bold());
    println!("{}  {}", "Nights Logged:".dimmed(), report.scores.count);
    println!(
        "{}  {:.1}h",
        "Avg Duration:".dimmed(),
        report.scores.avg_duration
    );
    println!(
        "{}  {}",
        "Avg Quality:".dimmed(),
        color_score(report.scores.avg_quality)
    );
    println!(
        "{}  {}",
        "Avg Energy:".dimmed(),
        color_score(report.scores.avg_energy)
    );

    let Some(ref summary) = report.summary else {
        return;
    };

    println!();
    println!("{}", summary);

    println!();
    println!("{}", "Phase split (fixed estimate):".dimmed());
    for (phase, pct) in PHASE_BREAKDOWN {
        println!(
            "  {:<6} {} {}%",
            phase,
            "█".repeat(usize::from(pct) / 2).bright_blue(),
            pct
        );
    }
}

fn color_score(score: f64) -> String {
    let text = format!("{:.1}", score);
    if score >= 80.0 {
        text.bright_green().to_string()
    } else if score >= 50.0 {
        text.bright_yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bearly_core::{CoachError, PlaceholderSensors};
    use bearly_logging::LogFormat;
    use bearly_store::{LogStore, MemoryLogStore, MemorySessionStore, SessionState, SessionStore};
    use tempfile::TempDir;

    /// A coach whose service is always down.
    struct UnavailableCoach;

    #[async_trait]
    impl Coach for UnavailableCoach {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn suggest(&self, _request: &TipRequest) -> Result<String, CoachError> {
            Err(CoachError::Failed {
                code: 1,
                stderr: "service unavailable".to_string(),
            })
        }
    }

    fn context<'a>(
        controller: &'a SessionController<'a>,
        logger: &'a Logger,
    ) -> CommandContext<'a> {
        CommandContext {
            controller,
            coach: &UnavailableCoach,
            logger,
            seed: Some(7),
        }
    }

    #[tokio::test]
    async fn test_log_succeeds_when_coach_fails() {
        let sessions = MemorySessionStore::new();
        let logs = MemoryLogStore::new();
        let controller = SessionController::new(&sessions, &logs, &PlaceholderSensors);
        let dir = TempDir::new().unwrap();
        let activity = dir.path().join("activity.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &activity).unwrap();

        let code = handle_command(
            Command::Log {
                duration: 7.5,
                restlessness: 2,
            },
            &context(&controller, &logger),
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
        let records = logs.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration, 7.5);

        // The failure is reported, after the night was logged
        let events: Vec<serde_json::Value> = std::fs::read_to_string(&activity)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| e["event"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["sleep_logged", "tip_failed"]);
        assert_eq!(events[1]["coach"], "unavailable");
        assert!(events[1]["error"]
            .as_str()
            .unwrap()
            .contains("service unavailable"));
    }

    #[tokio::test]
    async fn test_start_end_succeeds_when_coach_fails() {
        let sessions = MemorySessionStore::new();
        let logs = MemoryLogStore::new();
        let controller = SessionController::new(&sessions, &logs, &PlaceholderSensors);
        let logger = Logger::new(LogFormat::Compact);
        let ctx = context(&controller, &logger);

        assert_eq!(handle_command(Command::Start, &ctx).await.unwrap(), 0);
        assert!(sessions.load().unwrap().is_sleeping);

        assert_eq!(handle_command(Command::End, &ctx).await.unwrap(), 0);

        assert_eq!(logs.load().unwrap().len(), 1);
        assert_eq!(sessions.load().unwrap(), SessionState::idle());
    }

    #[tokio::test]
    async fn test_invalid_log_exits_with_input_error() {
        let sessions = MemorySessionStore::new();
        let logs = MemoryLogStore::new();
        let controller = SessionController::new(&sessions, &logs, &PlaceholderSensors);
        let logger = Logger::new(LogFormat::Compact);

        let code = handle_command(
            Command::Log {
                duration: -1.0,
                restlessness: 2,
            },
            &context(&controller, &logger),
        )
        .await
        .unwrap();

        assert_eq!(code, EXIT_INVALID_INPUT);
        assert!(logs.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tip_on_empty_log() {
        let sessions = MemorySessionStore::new();
        let logs = MemoryLogStore::new();
        let controller = SessionController::new(&sessions, &logs, &PlaceholderSensors);
        let logger = Logger::new(LogFormat::Compact);

        let code = handle_command(Command::Tip, &context(&controller, &logger))
            .await
            .unwrap();

        assert_eq!(code, 0);
    }
}
