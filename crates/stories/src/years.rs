use std::cmp::Ordering;
use std::collections::HashSet;

use feruca::Collator;
use formats::{StoryCollection, StoryProperties};

/// A year filter key, or the "no filter" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum YearToken {
    #[default]
    All,
    Year(String),
}

impl YearToken {
    pub const ALL: &'static str = "all";

    /// The token of a feature's raw `year` property: trimmed, `None` when
    /// absent or blank. A literal `"all"` collides with the sentinel and is
    /// treated as no year.
    pub fn from_feature_year(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() || trimmed == Self::ALL {
            return None;
        }
        Some(YearToken::Year(trimmed.to_string()))
    }

    /// Reads a selection coming from a picker. Blank input selects all.
    pub fn parse(selection: &str) -> Self {
        let trimmed = selection.trim();
        if trimmed.is_empty() || trimmed == Self::ALL {
            YearToken::All
        } else {
            YearToken::Year(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            YearToken::All => Self::ALL,
            YearToken::Year(y) => y,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, YearToken::All)
    }

    /// Display text: the year itself, or `all_label` for the sentinel.
    pub fn label<'a>(&'a self, all_label: &'a str) -> &'a str {
        match self {
            YearToken::All => all_label,
            YearToken::Year(y) => y,
        }
    }

    /// Whether a feature with these properties belongs to this filter.
    pub fn matches(&self, properties: &StoryProperties) -> bool {
        match self {
            YearToken::All => true,
            YearToken::Year(y) => properties.year_label() == y.as_str(),
        }
    }
}

impl std::fmt::Display for YearToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selectable years: `All` first, then distinct dataset years sorted
/// descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearIndex {
    tokens: Vec<YearToken>,
}

impl Default for YearIndex {
    fn default() -> Self {
        Self {
            tokens: vec![YearToken::All],
        }
    }
}

impl YearIndex {
    pub fn tokens(&self) -> &[YearToken] {
        &self.tokens
    }

    /// Dataset years without the leading `All`.
    pub fn years(&self) -> &[YearToken] {
        &self.tokens[1..]
    }

    pub fn contains(&self, token: &YearToken) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true: the index always holds `All`.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_strings(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.as_str().to_string()).collect()
    }
}

/// Builds the year index from the full dataset.
pub fn build_year_index(collection: &StoryCollection) -> YearIndex {
    let mut seen: HashSet<String> = HashSet::new();
    let mut years: Vec<String> = Vec::new();
    for feature in &collection.features {
        let token = YearToken::from_feature_year(feature.properties.year.as_deref());
        if let Some(YearToken::Year(year)) = token {
            if seen.insert(year.clone()) {
                years.push(year);
            }
        }
    }

    let mut collator = Collator::default();
    insertion_sort_by(&mut years, |a, b| compare_with(&mut collator, a, b));

    let mut tokens = Vec::with_capacity(years.len() + 1);
    tokens.push(YearToken::All);
    tokens.extend(years.into_iter().map(YearToken::Year));
    YearIndex { tokens }
}

/// Descending order for year labels: numeric when both labels parse as
/// finite numbers, Unicode collation (CLDR root) otherwise, so `"Banana"`
/// sorts next to `"apple"` and `"Été"` next to `"Ete"`.
///
/// Mixing the two rules is not transitive (`"10"`, `"9"`, `"1a"` form a
/// cycle), so the resulting order for mixed-format labels depends on input
/// order.
pub fn compare_years_desc(a: &str, b: &str) -> Ordering {
    compare_with(&mut Collator::default(), a, b)
}

fn compare_with(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    match (parse_year_number(a), parse_year_number(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        _ => collator.collate(b, a),
    }
}

fn parse_year_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// `slice::sort_by` may panic when the comparator is not a total order, and
// `compare_years_desc` is not one for mixed labels.
fn insertion_sort_by<T, F>(items: &mut [T], mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{YearIndex, YearToken, build_year_index, compare_years_desc};
    use foundation::LonLat;
    use formats::{StoryCollection, StoryFeature, StoryProperties};
    use pretty_assertions::assert_eq;
    use std::cmp::Ordering;

    fn collection(years: &[Option<&str>]) -> StoryCollection {
        StoryCollection::new(
            years
                .iter()
                .map(|y| {
                    StoryFeature::new(
                        LonLat::new(0.0, 0.0),
                        StoryProperties {
                            year: y.map(str::to_string),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn index_starts_with_all_and_sorts_numerically() {
        let index = build_year_index(&collection(&[
            Some("2019"),
            Some("2021"),
            Some(" 2020 "),
            Some("2021"),
            None,
            Some("   "),
        ]));
        assert_eq!(index.as_strings(), vec!["all", "2021", "2020", "2019"]);
    }

    #[test]
    fn numeric_order_is_not_lexicographic() {
        let index = build_year_index(&collection(&[Some("999"), Some("1000")]));
        assert_eq!(index.as_strings(), vec!["all", "1000", "999"]);
    }

    #[test]
    fn non_numeric_labels_sort_as_strings_descending() {
        let index = build_year_index(&collection(&[Some("2020"), Some("Unknown"), Some("2018")]));
        assert_eq!(index.as_strings(), vec!["all", "Unknown", "2020", "2018"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        let index = build_year_index(&collection(&[Some("n/a"), Some("N/A"), Some("n/a")]));
        // Lowercase collates first, so it comes last when descending.
        assert_eq!(index.as_strings(), vec!["all", "N/A", "n/a"]);
    }

    #[test]
    fn mixed_case_labels_collate_by_letter_not_byte() {
        let index = build_year_index(&collection(&[Some("apple"), Some("Banana")]));
        assert_eq!(index.as_strings(), vec!["all", "Banana", "apple"]);
    }

    #[test]
    fn accented_labels_sort_with_their_base_letter() {
        let index = build_year_index(&collection(&[Some("Zulu"), Some("Été"), Some("Fall")]));
        assert_eq!(index.as_strings(), vec!["all", "Zulu", "Fall", "Été"]);
    }

    #[test]
    fn inconsistent_comparisons_do_not_panic() {
        let index = build_year_index(&collection(&[Some("10"), Some("9"), Some("1a"), Some("x")]));
        assert_eq!(index.len(), 5);
        assert_eq!(index.tokens()[0], YearToken::All);
    }

    #[test]
    fn literal_all_year_is_not_listed() {
        let index = build_year_index(&collection(&[Some("all"), Some("2001")]));
        assert_eq!(index.as_strings(), vec!["all", "2001"]);
    }

    #[test]
    fn empty_dataset_gives_only_all() {
        let index = build_year_index(&StoryCollection::default());
        assert_eq!(index, YearIndex::default());
        assert!(index.years().is_empty());
    }

    #[test]
    fn compare_rules() {
        assert_eq!(compare_years_desc("2021", "2019"), Ordering::Less);
        assert_eq!(compare_years_desc("2019", "2021"), Ordering::Greater);
        assert_eq!(compare_years_desc("2020", "2020.0"), Ordering::Equal);
        assert_eq!(compare_years_desc("b", "a"), Ordering::Less);
        assert_eq!(compare_years_desc("apple", "Banana"), Ordering::Greater);
        assert_eq!(compare_years_desc("É", "F"), Ordering::Greater);
    }

    #[test]
    fn token_parsing_and_labels() {
        assert_eq!(YearToken::parse(" all "), YearToken::All);
        assert_eq!(YearToken::parse(""), YearToken::All);
        assert_eq!(YearToken::parse(" 2020"), YearToken::Year("2020".to_string()));
        assert_eq!(YearToken::from_feature_year(Some("  ")), None);
        assert_eq!(YearToken::All.label("All years"), "All years");
        assert_eq!(YearToken::Year("1999".into()).label("All years"), "1999");
        assert_eq!(YearToken::All.to_string(), "all");
    }

    #[test]
    fn token_matches_trimmed_year() {
        let props = StoryProperties {
            year: Some(" 2019 ".to_string()),
            ..Default::default()
        };
        assert!(YearToken::Year("2019".into()).matches(&props));
        assert!(!YearToken::Year("2018".into()).matches(&props));
        assert!(YearToken::All.matches(&StoryProperties::default()));
    }
}
