use std::rc::Rc;

use formats::StoryCollection;

use crate::years::YearToken;

/// Derives the collection to display for `year`.
///
/// `All` hands back the full dataset itself (the same `Rc`), so the map
/// source receives exactly what was loaded. Any other year builds a fresh
/// collection of the features whose trimmed `year` equals it; nothing is
/// cached between calls.
pub fn apply_year_filter(full: &Rc<StoryCollection>, year: &YearToken) -> Rc<StoryCollection> {
    if year.is_all() {
        return Rc::clone(full);
    }

    let features: Vec<_> = full
        .features
        .iter()
        .filter(|f| year.matches(&f.properties))
        .cloned()
        .collect();

    tracing::debug!(
        year = %year,
        shown = features.len(),
        total = full.len(),
        "applied year filter"
    );
    Rc::new(StoryCollection::new(features))
}
