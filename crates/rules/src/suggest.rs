//! "Did you mean" hints for misspelled step kinds, parameter names and
//! operator names, plus the kebab-case check for rule ids.
//!
//! Public so the transform layer can attach the same hints to its
//! parameter errors that rule validation attaches to YAML paths.

/// The candidate closest to `input`, ignoring case.
///
/// Nothing is suggested when even the best candidate needs more edits than
/// half the longer of the two names. Ties go to the earlier candidate.
pub fn closest<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (candidate, edit_distance(input, candidate)))
        .min_by_key(|&(_, distance)| distance)
        .filter(|&(candidate, distance)| {
            distance <= input.chars().count().max(candidate.chars().count()) / 2
        })
        .map(|(candidate, _)| candidate)
}

/// `"; did you mean 'x'?"` when a close candidate exists, otherwise empty.
/// Meant to be appended to an error message.
pub fn did_you_mean<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> String {
    closest(input, candidates)
        .map(|hit| format!("; did you mean '{}'?", hit))
        .unwrap_or_default()
}

/// Case-insensitive Levenshtein distance, one row at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().flat_map(char::to_lowercase).enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Lowercase alphanumeric words joined by single hyphens, e.g. `cv-cleanup`.
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|word| {
            !word.is_empty()
                && word
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_core::StepKind;

    #[test]
    fn suggests_nearest_step_kind() {
        let kinds = StepKind::KNOWN.iter().copied();
        assert_eq!(closest("normalise", kinds.clone()), Some("normalize"));
        assert_eq!(closest("derivitive", kinds.clone()), Some("derivative"));
        assert_eq!(closest("Smooth", kinds.clone()), Some("smooth"));
        assert_eq!(closest("zzzz", kinds), None);
    }

    #[test]
    fn suggests_parameter_names_per_kind() {
        let names = StepKind::Filter.parameter_names().iter().copied();
        assert_eq!(closest("lowcutof", names.clone()), Some("lowCutoff"));
        assert_eq!(closest("filter_type", names), Some("filterType"));
        assert_eq!(
            did_you_mean("windw", StepKind::Smooth.parameter_names().iter().copied()),
            "; did you mean 'window'?"
        );
        assert_eq!(did_you_mean("windw", StepKind::Normalize.parameter_names().iter().copied()), "");
    }

    #[test]
    fn distance_counts_edits() {
        assert_eq!(edit_distance("", "log10"), 5);
        assert_eq!(edit_distance("sqrt", "sqrt"), 0);
        assert_eq!(edit_distance("sqtr", "sqrt"), 2);
        assert_eq!(edit_distance("EXP", "exp"), 0);
        assert_eq!(edit_distance("baseline", "baselines"), 1);
    }

    #[test]
    fn kebab_case_ids() {
        assert!(is_kebab_case("cv-cleanup"));
        assert!(is_kebab_case("eis2"));
        assert!(!is_kebab_case("-lead"));
        assert!(!is_kebab_case("trail-"));
        assert!(!is_kebab_case("double--hyphen"));
        assert!(!is_kebab_case("Upper"));
        assert!(!is_kebab_case(""));
    }
}
