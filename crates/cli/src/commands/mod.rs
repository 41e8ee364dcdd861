pub mod ask;
pub mod config;
pub mod detail;
pub mod search;
pub mod sign;

use clap::Args;
use homesearch_core::config::{AppConfig, LoadOptions};
use homesearch_core::{CallerIdentity, CallerRole};
use serde::Serialize;

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

    /// Success whose message is `value` rendered as pretty JSON.
    pub fn success_json(command: &str, value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(message) => Self::success(command, message),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
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
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Who the upstream request is made for. Without `--user-id` requests are
/// anonymous and carry no caller headers.
#[derive(Debug, Clone, Default, Args)]
pub struct CallerArgs {
    #[arg(long, help = "Signed-in user id sent with the request")]
    pub user_id: Option<String>,
    #[arg(long, default_value = "public", help = "Caller role: public or member")]
    pub role: String,
    #[arg(long, help = "Association member number")]
    pub member_number: Option<String>,
}

impl CallerArgs {
    pub fn identity(&self) -> Result<Option<CallerIdentity>, String> {
        let role = CallerRole::parse(&self.role)
            .ok_or_else(|| format!("unknown caller role `{}` (expected public|member)", self.role))?;
        let Some(user_id) = self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
        else {
            return Ok(None);
        };

        let mut identity = CallerIdentity::new(user_id, role);
        if let Some(member_number) = &self.member_number {
            identity = identity.with_member_number(member_number.trim());
        }
        Ok(Some(identity))
    }
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn caller(
    command: &str,
    args: &CallerArgs,
) -> Result<Option<CallerIdentity>, CommandResult> {
    args.identity().map_err(|message| CommandResult::failure(command, "invalid_input", message, 2))
}

pub(crate) fn async_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

#[cfg(test)]
mod tests {
    use homesearch_core::CallerRole;

    use super::CallerArgs;

    #[test]
    fn caller_without_user_id_is_anonymous() {
        let args = CallerArgs { role: "member".to_owned(), ..CallerArgs::default() };
        assert_eq!(args.identity(), Ok(None));
    }

    #[test]
    fn caller_with_member_number() {
        let args = CallerArgs {
            user_id: Some("u-1".to_owned()),
            role: "member".to_owned(),
            member_number: Some(" 778 ".to_owned()),
        };
        let identity = args.identity().expect("identity").expect("caller");
        assert_eq!(identity.role, CallerRole::Member);
        assert_eq!(identity.member_number.as_deref(), Some("778"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let args = CallerArgs { role: "admin".to_owned(), ..CallerArgs::default() };
        assert!(args.identity().is_err());
    }
}
