//! Choosing a game or issue type from a server listing.

use crate::envelope::NamedEntity;

/// Pick an id from `candidates`.
///
/// Preferred names are tried in order; the first name that matches any
/// candidate (trimmed, case-insensitive) wins. Without a match the first
/// candidate is used. An empty listing yields `None`.
pub fn pick_preferred<S: AsRef<str>>(
    candidates: &[NamedEntity],
    preferred_names: &[S],
) -> Option<String> {
    preferred_names
        .iter()
        .find_map(|wanted| {
            let wanted = wanted.as_ref().trim();
            candidates.iter().find(|c| {
                c.name
                    .as_deref()
                    .is_some_and(|name| name.trim().eq_ignore_ascii_case(wanted))
            })
        })
        .or_else(|| candidates.first())
        .map(|c| c.id.clone())
}
