mod commands;
mod helpers;

use clap::Parser;
use mudirac_core::{AtomError, ConfigError};

const IO_EXIT_CODE: i32 = 3;
const USAGE_EXIT_CODE: i32 = 2;

pub fn run_from_env() -> i32 {
    match parse_and_dispatch(std::env::args()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

fn parse_and_dispatch<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => commands::run_input(cli.run),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "mudirac",
    version,
    about = "Relativistic bound states and X-ray lines of muonic atoms"
)]
struct Cli {
    #[command(flatten)]
    run: commands::RunArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Compute(#[from] AtomError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn label(&self) -> &'static str {
        match self {
            Self::Usage(_) => "Usage",
            Self::Config(ConfigError::Read { .. }) | Self::Internal(_) => "Io",
            Self::Config(ConfigError::Parse { .. }) => "Configuration",
            Self::Config(ConfigError::Invalid(error)) | Self::Compute(error) => {
                error.category().as_str()
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Config(ConfigError::Parse { .. }) => USAGE_EXIT_CODE,
            Self::Config(ConfigError::Read { .. }) | Self::Internal(_) => IO_EXIT_CODE,
            Self::Config(ConfigError::Invalid(error)) | Self::Compute(error) => {
                error.category().exit_code()
            }
        }
    }

    pub fn diagnostic_line(&self) -> String {
        match self {
            Self::Internal(error) => format!("ERROR: [{}] {error:#}", self.label()),
            other => format!("ERROR: [{}] {}", other.label(), other.to_string().trim_end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, parse_and_dispatch};
    use mudirac_core::{AtomError, ConfigError};
    use std::path::PathBuf;

    #[test]
    fn missing_input_is_a_usage_error() {
        let error = parse_and_dispatch(["mudirac"]).unwrap_err();
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(parse_and_dispatch(["mudirac", "--help"]).unwrap(), 0);
    }

    #[test]
    fn exit_codes_follow_the_error_kind() {
        let read = CliError::from(ConfigError::Read {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(read.exit_code(), 3);
        assert!(read.diagnostic_line().starts_with("ERROR: [Io]"));

        let unbound = CliError::from(AtomError::UnboundState {
            energy: 1.0,
            k: -1,
        });
        assert_eq!(unbound.exit_code(), 4);
        assert!(
            unbound
                .diagnostic_line()
                .starts_with("ERROR: [PhysicalInfeasibility]")
        );

        let invalid = CliError::from(ConfigError::Invalid(AtomError::configuration(
            "mass",
            "must be > 0",
        )));
        assert_eq!(invalid.exit_code(), 2);
    }
}
