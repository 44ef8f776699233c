//! Label helpers for mapping functions

/// First candidate that is present and not blank.
///
/// Mapping functions use this to pick the best available label among
/// several optional source fields, in priority order.
pub fn first_non_empty_string<I, S>(candidates: I) -> Option<S>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.as_ref().trim().is_empty())
}
