//! Query expansion.

/// Expands base terms and their synonyms into every search string.
///
/// Term `i` contributes the candidate set `[base_terms[i]] + synonyms[i]`
/// (trimmed, blanks dropped, first occurrence kept). The result is the
/// Cartesian product of those sets, each combination space-joined in term
/// order. Terms beyond the end of `synonyms` contribute only themselves.
///
/// An empty `base_terms` yields an empty list.
#[must_use]
pub fn expand(base_terms: &[String], synonyms: &[Vec<String>]) -> Vec<String> {
    let candidate_sets: Vec<Vec<&str>> = base_terms
        .iter()
        .enumerate()
        .map(|(i, base)| {
            let extra = synonyms.get(i).map_or(&[][..], Vec::as_slice);
            candidates(base, extra)
        })
        .filter(|set| !set.is_empty())
        .collect();

    if candidate_sets.is_empty() {
        return Vec::new();
    }

    let mut combinations: Vec<Vec<&str>> = vec![Vec::new()];
    for set in &candidate_sets {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                set.iter().map(move |candidate| {
                    let mut next = prefix.clone();
                    next.push(*candidate);
                    next
                })
            })
            .collect();
    }

    combinations.into_iter().map(|words| words.join(" ")).collect()
}

fn candidates<'a>(base: &'a str, synonyms: &'a [String]) -> Vec<&'a str> {
    let mut set: Vec<&str> = Vec::with_capacity(1 + synonyms.len());
    for candidate in std::iter::once(base).chain(synonyms.iter().map(String::as_str)) {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !set.contains(&candidate) {
            set.push(candidate);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_terms_expand_to_nothing() {
        assert!(expand(&[], &[]).is_empty());
    }

    #[test]
    fn terms_without_synonyms_form_one_query() {
        assert_eq!(
            expand(&strings(&["cancer", "support"]), &[]),
            vec!["cancer support"]
        );
    }

    #[test]
    fn product_preserves_term_order() {
        let queries = expand(
            &strings(&["cancer", "support"]),
            &[strings(&["tumor"]), strings(&["help"])],
        );
        assert_eq!(
            queries,
            vec!["cancer support", "cancer help", "tumor support", "tumor help"]
        );
    }

    #[test]
    fn size_is_product_of_candidate_set_sizes() {
        let queries = expand(
            &strings(&["a", "b", "c"]),
            &[strings(&["a1", "a2"]), Vec::new(), strings(&["c1"])],
        );
        assert_eq!(queries.len(), 6);
    }

    #[test]
    fn synonym_repeating_the_base_term_is_not_doubled() {
        let queries = expand(
            &strings(&["cancer", "support"]),
            &[strings(&["cancer", "tumor"]), strings(&["support", "help"])],
        );
        assert_eq!(
            queries,
            vec!["cancer support", "cancer help", "tumor support", "tumor help"]
        );
    }

    #[test]
    fn blank_synonyms_are_ignored() {
        let queries = expand(&strings(&["grief"]), &[strings(&["  ", "loss "])]);
        assert_eq!(queries, vec!["grief", "loss"]);
    }
}
