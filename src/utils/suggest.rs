//! "Did you mean" suggestions for unknown names

use strsim::levenshtein;

/// Maximum allowed Levenshtein distance as a percentage of the target length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Returns the candidate closest to `target`, if it is similar enough.
///
/// Ties keep the first candidate in iteration order.
pub fn closest_match<'a, I>(target: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);

    candidates
        .into_iter()
        .map(|candidate| (levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}
