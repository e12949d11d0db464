pub mod types;
pub mod sanitize;
pub mod classify;
pub mod extractors;
pub mod normalize;

pub use types::*;
pub use sanitize::*;
pub use classify::*;
pub use extractors::*;
pub use normalize::*;

use thiserror::Error;

/// Failures inside the response parser.
///
/// None of these cross the public boundary as `Err`: strategies swallow
/// `MalformedFragment`, and the dispatcher turns `EmptyInput` and
/// `NoEventsFound` into a `ParseResult` warning using their display text.
/// An event accepted with missing optional fields is not an error at all;
/// the absent `Option`s are the only trace of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("malformed fragment: {0}")]
    MalformedFragment(String),

    #[error("could not parse")]
    NoEventsFound,
}
