//! This module contains the [Rule] type as well as the [chain_rules!] macro for applying
//! rules on top of one another.

/// A [Rule] takes a value, checks it and either hands it back or rejects it.
pub type Rule<T> = Box<dyn Fn(T) -> anyhow::Result<T>>;

/// Applies a sequence of rules to a state, short-circuiting on the first rejection.
#[macro_export]
macro_rules! chain_rules {
    ($state:expr, $($rule:expr),+) => {{
        let mut result = Ok($state);

        $(
            result = match result {
                Ok(val) => $rule(val),
                err @ Err(_) => err,
            };
        )+

        result
    }};
}
