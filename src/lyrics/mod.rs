//! Lyric quality checks.
//!
//! [`classify`] is the single quality gate every lyric file passes through
//! before it is trusted. The [`validate`] module holds the checks that run on
//! a freshly fetched file, strictly in the order strip, reject, rename.

mod classify;
pub mod validate;

pub use classify::{
    METADATA_TAGS, MIN_LYRIC_LINES, MIN_TIMESTAMP_LINES, classify, classify_file, has_timestamp,
    is_metadata_line,
};
pub use validate::{Validation, Validators};
