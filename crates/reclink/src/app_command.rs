use crate::{AppError, AppResult};

use std::{str::FromStr, time::Duration};

/// Commands typed on the console.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Open the recorder connection.
    Connect,
    /// Close the recorder connection.
    Disconnect,
    /// Ask the recorder to start capturing.
    StartRecording {
        /// Event the capture belongs to.
        event_id: String,
    },
    /// Ask the recorder to stop a capture, optionally after a delay.
    StopRecording {
        /// Recording to stop.
        recording_id: String,
        /// Wait before the stop is sent.
        delay: Duration,
    },
    /// Announce an event type to the recorder.
    RegisterEvent {
        /// Event identifier.
        event_id: String,
        /// Human-readable event name.
        event_name: String,
    },
    /// Request fresh settings.
    RequestSettings,
    /// Print the current client snapshot.
    Status,
    /// Request application shutdown.
    Shutdown,
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> AppResult<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(AppError::invalid_command("empty line"));
        };

        let command = match verb {
            "connect" => AppCommand::Connect,
            "disconnect" => AppCommand::Disconnect,
            "start" => AppCommand::StartRecording {
                event_id: required(words.next(), "start <event_id>")?,
            },
            "stop" => {
                let recording_id = required(words.next(), "stop <recording_id> [delay]")?;
                let delay = match words.next() {
                    Some(seconds) => parse_delay(seconds)?,
                    None => Duration::ZERO,
                };
                AppCommand::StopRecording {
                    recording_id,
                    delay,
                }
            }
            "register" => {
                let event_id = required(words.next(), "register <event_id> <event_name>")?;
                let event_name = words.collect::<Vec<_>>().join(" ");
                if event_name.is_empty() {
                    return Err(AppError::invalid_command(
                        "usage: register <event_id> <event_name>",
                    ));
                }
                return Ok(AppCommand::RegisterEvent {
                    event_id,
                    event_name,
                });
            }
            "settings" => AppCommand::RequestSettings,
            "status" => AppCommand::Status,
            "quit" | "exit" => AppCommand::Shutdown,
            other => {
                return Err(AppError::invalid_command(format!(
                    "unknown command '{other}'"
                )));
            }
        };

        if let Some(extra) = words.next() {
            return Err(AppError::invalid_command(format!(
                "unexpected argument '{extra}'"
            )));
        }

        Ok(command)
    }
}

#[track_caller]
fn required(word: Option<&str>, usage: &str) -> AppResult<String> {
    word.map(str::to_string)
        .ok_or_else(|| AppError::invalid_command(format!("usage: {usage}")))
}

#[track_caller]
fn parse_delay(seconds: &str) -> AppResult<Duration> {
    seconds
        .parse::<f64>()
        .ok()
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .ok_or_else(|| AppError::invalid_command(format!("invalid delay '{seconds}'")))
}
