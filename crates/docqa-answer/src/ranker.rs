use docqa_core::types::{CandidateAnswer, Chunk, RankedAnswer};
use docqa_reader::SpanExtractor;

use crate::source::dedup_sources;

/// Runs the extractor over every retrieved chunk and merges the survivors.
///
/// Candidates are ordered by score, highest first, with retrieval order
/// breaking ties. The answer text joins all of them with `", "`. A chunk
/// whose extraction fails is skipped.
pub fn rank(question: &str, chunks: &[Chunk], extractor: &SpanExtractor) -> RankedAnswer {
    let mut candidates: Vec<CandidateAnswer> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match extractor.extract(question, chunk) {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(source = %chunk.source_id, index = chunk.index, error = %e, "dropping chunk after extraction failure");
            }
        }
    }
    aggregate(candidates)
}

pub fn aggregate(mut candidates: Vec<CandidateAnswer>) -> RankedAnswer {
    if candidates.is_empty() {
        return RankedAnswer::no_answer();
    }
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let text = candidates.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(", ");
    let sources = dedup_sources(candidates.iter().map(|c| c.source_id.as_str()));
    tracing::debug!(candidates = candidates.len(), sources = sources.len(), "ranked answer");
    RankedAnswer { text, sources }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(text: &str, score: f32, source: &str) -> CandidateAnswer {
        CandidateAnswer { text: text.into(), score, source_id: source.into() }
    }

    #[test]
    fn equal_scores_keep_retrieval_order() {
        let ranked = aggregate(vec![cand("b", 3.0, "x/one.txt"), cand("a", 5.0, "x/two.txt"), cand("c", 3.0, "x/one.txt")]);
        assert_eq!(ranked.text, "a, b, c");
        assert_eq!(ranked.sources, vec!["two", "one"]);
    }

    #[test]
    fn no_candidates_is_sentinel() {
        let ranked = aggregate(Vec::new());
        assert!(ranked.is_no_answer());
        assert_eq!(ranked.sources_line(), "");
    }
}
