use std::{env, str::FromStr};

/// Reads and parses the environment variable `name`. Returns `None` if the variable is unset or cannot be parsed.
pub fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}
