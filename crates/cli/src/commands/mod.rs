pub mod config;
pub mod doctor;
pub mod price;
pub mod revenue;

use serde::Serialize;
use shopkit_core::errors::InterfaceError;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Successful run whose output is the serialized result itself.
    pub fn json(command: &str, value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 9),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_interface(command: &str, error: InterfaceError) -> Self {
        let (error_class, exit_code) = match &error {
            InterfaceError::BadRequest { .. } => ("bad_request", 6),
            InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 7),
            InterfaceError::Internal { .. } => ("internal", 8),
        };
        let message = match &error {
            InterfaceError::BadRequest { message, correlation_id }
            | InterfaceError::ServiceUnavailable { message, correlation_id }
            | InterfaceError::Internal { message, correlation_id } => {
                tracing::warn!(
                    event_name = "cli.command.failed",
                    command,
                    error_class,
                    correlation_id = %correlation_id,
                    "{message}"
                );
                message.clone()
            }
        };
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
