use crate::models::Credentials;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Flags the portal instructions spell with a single dash.
const LEGACY_FLAGS: [&str; 3] = ["-caseId", "-queueId", "-token"];

/// Reserve the first free appointment slot in an inpol queue.
///
/// caseId comes from the address bar (`/home/cases/{caseId}`), queueId and the
/// bearer token from the `reservations/queue/{queueId}/dates` request in the
/// browser's network tab.
#[derive(Parser, Debug, Clone)]
#[command(name = "InpolReserve", version)]
pub struct Cli {
    /// Case identifier, e.g. c4e64338-37c7-11ec-8d3d-0242ac130003
    #[arg(long = "caseId", value_name = "UUID")]
    pub case_id: String,

    /// Queue identifier, e.g. b8ce0ab6-cd6f-4bc7-ab6b-c125b8f31b86
    #[arg(long = "queueId", value_name = "UUID")]
    pub queue_id: String,

    /// Bearer token captured from a browser session
    #[arg(long = "token", value_name = "TOKEN")]
    pub token: String,

    /// Optional TOML file overriding URLs, delay range and headers
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List slots without reserving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Cli::try_parse_from(normalize_args(args))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            case_id: self.case_id.clone(),
            queue_id: self.queue_id.clone(),
            token: self.token.clone(),
        }
    }
}

/// Rewrite `-caseId`-style flags (and `-caseId=value`) to their `--` form.
/// Values are never touched, only arguments in flag position.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut expect_value = false;
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if expect_value {
                expect_value = false;
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let flag = text.split('=').next().unwrap_or(text);
            if LEGACY_FLAGS.contains(&flag) {
                expect_value = !text.contains('=');
                return OsString::from(format!("-{}", text));
            }
            arg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_flags_in_any_order() {
        let cli = Cli::try_parse_args([
            "InpolReserve",
            "-token",
            "T",
            "-queueId",
            "Q",
            "-caseId",
            "C",
        ])
        .unwrap();
        assert_eq!(
            cli.credentials(),
            Credentials {
                case_id: "C".into(),
                queue_id: "Q".into(),
                token: "T".into()
            }
        );
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_values_are_not_rewritten() {
        let args = normalize_args(["InpolReserve", "-caseId", "-queueId", "-queueId", "Q"]);
        assert_eq!(args, ["InpolReserve", "--caseId", "-queueId", "--queueId", "Q"]);
    }

    #[test]
    fn test_equals_form() {
        let cli = Cli::try_parse_args(["InpolReserve", "-caseId=C", "-queueId=Q", "--token=T", "-vv"])
            .unwrap();
        assert_eq!(cli.case_id, "C");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_missing_token_is_reported() {
        let err = Cli::try_parse_args(["InpolReserve", "-caseId", "C", "-queueId", "Q"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("--token"));
    }
}
