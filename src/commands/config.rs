use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

const ENABLE_UNSUPPORTED_COMMANDS: &str = "enable-unsupported-commands";

/// Parameters fixed by the command line when the server starts.
const STARTUP_PARAMETERS: [&str; 5] = ["bind", "port", "requirepass", "workers", "max-frame-size"];

/// Reads and changes the runtime settings. The only parameter is
/// `enable-unsupported-commands`.
///
/// Ref: <https://redis.io/docs/latest/commands/config-get/>
/// Ref: <https://redis.io/docs/latest/commands/config-set/>
#[derive(Debug, PartialEq)]
pub enum Config {
    Get { pattern: String },
    Set { parameter: String, value: String },
}

impl Executable for Config {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        match self {
            Config::Get { pattern } => {
                let mut res = vec![];
                if glob_match(&pattern, ENABLE_UNSUPPORTED_COMMANDS) {
                    let value = match ctx.settings().allow_unsupported() {
                        true => "yes",
                        false => "no",
                    };
                    res.push(Frame::Bulk(Bytes::from(ENABLE_UNSUPPORTED_COMMANDS)));
                    res.push(Frame::Bulk(Bytes::from(value)));
                }
                Ok(Frame::Array(res).into())
            }
            Config::Set { parameter, value } => {
                if STARTUP_PARAMETERS.contains(&parameter.as_str()) {
                    return Err(Error::InvalidState(format!(
                        "CONFIG SET failed (possibly related to argument '{}') - can't set immutable config",
                        parameter
                    )));
                }
                if parameter != ENABLE_UNSUPPORTED_COMMANDS {
                    return Err(Error::InvalidArgument(format!(
                        "Unknown option or number of arguments for CONFIG SET - '{}'",
                        parameter
                    )));
                }
                let allow = match value.to_lowercase().as_str() {
                    "yes" | "true" => true,
                    "no" | "false" => false,
                    _ => {
                        return Err(Error::InvalidArgument(format!(
                            "Invalid argument '{}' for CONFIG SET '{}'",
                            value, parameter
                        )))
                    }
                };
                ctx.settings().set_allow_unsupported(allow);
                Ok(Frame::ok().into())
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Config {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_uppercase();

        let config = match subcommand.as_str() {
            "GET" => Config::Get {
                pattern: parser.next_string()?.to_lowercase(),
            },
            "SET" => Config::Set {
                parameter: parser.next_string()?.to_lowercase(),
                value: parser.next_string()?,
            },
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unknown subcommand '{}'",
                    subcommand.to_lowercase()
                )))
            }
        };
        parser.finish()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};

    #[test]
    fn parse_get() {
        let config: Config = parse(&["CONFIG", "get", "Enable-*"]).unwrap();

        assert_eq!(
            config,
            Config::Get {
                pattern: "enable-*".to_string()
            }
        );
    }

    #[tokio::test]
    async fn get_and_set_unsupported_commands() {
        let harness = Harness::new();

        let result = harness
            .frame(&["CONFIG", "GET", "enable-unsupported-commands"])
            .unwrap();
        assert_eq!(
            result,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("enable-unsupported-commands")),
                Frame::Bulk(Bytes::from("no")),
            ])
        );

        let result = harness
            .frame(&["CONFIG", "SET", "enable-unsupported-commands", "yes"])
            .unwrap();
        assert_eq!(result, Frame::ok());
        assert!(harness.services.settings.allow_unsupported());
    }

    #[tokio::test]
    async fn get_without_match() {
        let harness = Harness::new();

        let result = harness.frame(&["CONFIG", "GET", "maxmemory"]).unwrap();

        assert_eq!(result, Frame::Array(vec![]));
    }

    #[tokio::test]
    async fn set_unknown_parameter() {
        let harness = Harness::new();

        let err = harness
            .frame(&["CONFIG", "SET", "maxmemory", "10"])
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn set_startup_parameter() {
        let harness = Harness::new();

        let err = harness.frame(&["CONFIG", "SET", "port", "7000"]).unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(
            err.to_string(),
            "CONFIG SET failed (possibly related to argument 'port') - can't set immutable config"
        );
    }

    #[test]
    fn unknown_subcommand() {
        let err = parse::<Config>(&["CONFIG", "REWRITE"]).unwrap_err();

        assert_eq!(err.to_string(), "unknown subcommand 'rewrite'");
    }
}
