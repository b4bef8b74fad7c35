//! Fuzzy matching of normalized name keys.
//!
//! Edit-distance similarity normalized to 0.0–1.0 decides whether a noisy
//! OCR name refers to an already-seen member. "No confident match" is a
//! normal outcome meaning "treat as a new identity", not an error.

/// An existing member key offered to the matcher.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate<'a> {
    /// Normalized key, first-seen order preserved by the caller
    pub key: &'a str,
    /// How many provenance rows corroborate this identity
    pub corroboration: usize,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    /// Index into the candidate slice
    pub index: usize,
    pub score: f64,
}

/// Similarity between two keys: `1 - levenshtein / max_len`, on characters.
/// Symmetric; two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(a, b) as f64 / max_len as f64
}

/// Finds the best-scoring candidate at or above the threshold.
///
/// Ties break deterministically: more corroboration first (a better
/// attested identity), then smaller raw edit distance, then first-seen
/// order. Pure with respect to its inputs; the caller decides whether to
/// merge into the winner or create a new identity on `None`.
pub fn best_match(
    query: &str,
    candidates: &[MatchCandidate<'_>],
    threshold: f64,
) -> Option<BestMatch> {
    let query_len = query.chars().count();
    let mut best: Option<(usize, f64, usize, usize)> = None; // index, score, corroboration, distance

    for (index, candidate) in candidates.iter().enumerate() {
        // Fast path: a length gap alone can push similarity under the
        // threshold, no edit distance needed.
        let key_len = candidate.key.chars().count();
        let max_len = query_len.max(key_len);
        if max_len > 0 {
            let len_gap = query_len.abs_diff(key_len);
            let length_ceiling = 1.0 - len_gap as f64 / max_len as f64;
            if length_ceiling < threshold {
                continue;
            }
        }

        let distance = strsim::levenshtein(query, candidate.key);
        let score = if max_len == 0 {
            1.0
        } else {
            1.0 - distance as f64 / max_len as f64
        };
        if score < threshold {
            continue;
        }

        let better = match best {
            None => true,
            Some((_, best_score, best_corr, best_dist)) => {
                score > best_score
                    || (score == best_score
                        && (candidate.corroboration > best_corr
                            || (candidate.corroboration == best_corr && distance < best_dist)))
            }
        };
        if better {
            best = Some((index, score, candidate.corroboration, distance));
        }
    }

    best.map(|(index, score, _, _)| BestMatch { index, score })
}
