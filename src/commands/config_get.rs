use bytes::Bytes;
use globset::Glob;

use crate::{
    commands::{CommandError, command_utils::uppercase},
    resp::RespValue,
    server::ServerConfig,
};

pub struct ConfigGetArguments {
    pub patterns: Vec<String>,
}

impl ConfigGetArguments {
    /// Parses `GET pattern [pattern ...]`; GET is the only subcommand.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut arguments = arguments.into_iter();
        let subcommand = arguments.next().map(|name| uppercase(&name)).unwrap_or_default();

        if subcommand != "GET" {
            return Err(CommandError::UnknownSubcommand(subcommand));
        }

        let patterns: Vec<String> = arguments
            .map(|pattern| String::from_utf8_lossy(&pattern).to_lowercase())
            .collect();

        if patterns.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("config|get".to_string()));
        }

        Ok(Self { patterns })
    }
}

/// Handles `CONFIG GET`, replying with a flat `[name, value, ...]` array of
/// every parameter matched by one of the patterns.
pub fn config_get(config: &ServerConfig, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let parameters = [
        ("bind", config.bind_address.clone()),
        ("port", config.port.to_string()),
    ];

    let mut matchers = Vec::with_capacity(config_get_arguments.patterns.len());
    for pattern in &config_get_arguments.patterns {
        let matcher = Glob::new(pattern)
            .map_err(|_| CommandError::InvalidGlobPattern(pattern.clone()))?
            .compile_matcher();
        matchers.push(matcher);
    }

    let mut response = Vec::new();
    for (name, value) in parameters {
        if matchers.iter().any(|matcher| matcher.is_match(name)) {
            response.push(RespValue::bulk_string(name));
            response.push(RespValue::bulk_string(value));
        }
    }

    Ok(RespValue::Array(response))
}
