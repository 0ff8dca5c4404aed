//! "Did you mean?" suggestions via Levenshtein distance.

use strsim::levenshtein;

use crate::command::clean_command;

/// Default upper bound (exclusive) on the edit distance of a suggestion.
pub const DEFAULT_MAX_DISTANCE: usize = 5;

/// Suggest registered command paths close to `command`.
///
/// Returns nothing when a path matches exactly: the failure was elsewhere
/// (usually in the arguments). Otherwise returns every path with distance
/// below `max_distance`, closest first; ties keep registration order.
pub fn suggest<'a>(
    command: &str,
    paths: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Vec<String> {
    let command = clean_command(command);
    let scored: Vec<(&str, usize)> = paths
        .into_iter()
        .map(|path| (path, levenshtein(&command, path)))
        .collect();

    if scored.iter().any(|(_, distance)| *distance == 0) {
        return Vec::new();
    }

    let mut suggestions: Vec<(&str, usize)> = scored
        .into_iter()
        .filter(|(_, distance)| *distance < max_distance)
        .collect();
    suggestions.sort_by_key(|(_, distance)| *distance);
    suggestions.into_iter().map(|(p, _)| p.to_string()).collect()
}
