use jobscout_common::{ScoutError, SearchUnit};

/// Cross product of titles and locations, titles outer, locations inner.
///
/// Duplicate entries produce duplicate units. Either list empty yields no
/// units; use [`require_search_space`] where that must be fatal.
pub fn build_search_space(titles: &[String], locations: &[String]) -> Vec<SearchUnit> {
    titles
        .iter()
        .flat_map(|title| {
            locations
                .iter()
                .map(move |location| SearchUnit::new(title.as_str(), location.as_str()))
        })
        .collect()
}

/// Like [`build_search_space`], but an empty result is an error.
pub fn require_search_space(
    titles: &[String],
    locations: &[String],
) -> Result<Vec<SearchUnit>, ScoutError> {
    let units = build_search_space(titles, locations);
    if units.is_empty() {
        return Err(ScoutError::EmptySearchSpace {
            titles: titles.len(),
            locations: locations.len(),
        });
    }
    Ok(units)
}
