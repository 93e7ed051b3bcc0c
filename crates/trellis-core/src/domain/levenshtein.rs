//! Typo suggestions for add-on and framework ids.

/// Edit distance between two strings, counted in chars.
pub fn distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Largest distance still worth suggesting for an input of `len` chars.
fn threshold(len: usize) -> usize {
    (len / 2).max(2)
}

/// The candidate closest to `input`, compared case-insensitively.
///
/// Returns the candidate in its canonical spelling, or `None` when even the
/// best candidate is further than `max(len / 2, 2)` edits away. Ties go to
/// the earliest candidate.
pub fn closest_match<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = input.to_lowercase();
    let mut best: Option<(&'a str, usize)> = None;

    for candidate in candidates {
        let d = distance(&needle, &candidate.to_lowercase());
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((candidate, d));
        }
    }

    best.filter(|(_, d)| *d <= threshold(input.chars().count()))
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_distances() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("same", "same"), 0);
    }

    #[test]
    fn suggests_tailwind_for_tailwnd() {
        let ids = ["shadcn", "tailwind", "tanstack-query"];
        assert_eq!(closest_match("tailwnd", ids), Some("tailwind"));
    }

    #[test]
    fn comparison_ignores_case_but_returns_canonical() {
        assert_eq!(closest_match("CLERK", ["clerk", "convex"]), Some("clerk"));
    }

    #[test]
    fn distant_inputs_get_no_suggestion() {
        assert_eq!(closest_match("zzzzzzzz", ["tailwind", "shadcn"]), None);
    }

    #[test]
    fn short_inputs_allow_two_edits() {
        // len 3 → threshold max(1, 2) = 2
        assert_eq!(closest_match("orm", ["form"]), Some("form"));
        assert_eq!(closest_match("ab", ["xyz"]), None);
    }

    #[test]
    fn empty_candidate_list() {
        assert_eq!(closest_match("anything", std::iter::empty()), None);
    }
}
