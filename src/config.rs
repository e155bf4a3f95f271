use std::env;
use std::fmt::Debug;
use std::str::FromStr;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the parsed value of the named environment variable, or `None`
/// if it is unset or empty. Panics if it is set but does not parse.
pub fn get_optional<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Debug,
{
    let value = env::var(name).ok().filter(|v| !v.trim().is_empty())?;

    Some(
        value
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("could not parse {} ({:?}): {:?}", name, value, e)),
    )
}
