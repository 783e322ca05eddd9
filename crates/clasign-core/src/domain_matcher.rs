//! Decides whether a newly claimed email domain belongs to a corporation.

/// Returns `true` when `candidate` shares at least `min_matching_parts`
/// trailing labels with `primary`.
///
/// Identical domains are never a *new* domain and are rejected.
/// Comparison is case-insensitive.
pub fn is_valid_new_domain(primary: &str, candidate: &str, min_matching_parts: usize) -> bool {
    if primary.eq_ignore_ascii_case(candidate) {
        return false;
    }

    let matched = primary
        .rsplit('.')
        .zip(candidate.rsplit('.'))
        .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
        .count();

    matched >= min_matching_parts
}
