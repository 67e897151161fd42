use std::sync::Arc;

use docqa_core::config::{LanguageFilter, PipelineConfig};
use docqa_core::{Chunk, Error};
use docqa_reader::{FakeSpanModel, LanguageCheck, SpanExtractor};

const QUESTION: &str = "What is the capital of France?";
const GERMAN: &str = "Der schnelle braune Fuchs springt über den faulen Hund und läuft weiter über das Feld.";

fn chunk(text: &str) -> Chunk {
    Chunk { text: text.to_string(), source_id: "docs/france.txt".to_string(), index: 0 }
}

fn extractor(model: FakeSpanModel, min_score: f32) -> SpanExtractor {
    SpanExtractor::new(Arc::new(model), min_score, LanguageCheck::Off)
}

#[test]
fn extracts_highest_scoring_word() {
    let ex = extractor(FakeSpanModel::new(64).answer("Paris", 5.0).answer("France", 3.0), 2.9);
    let found = ex.extract(QUESTION, &chunk("Paris is the capital of France.")).unwrap().expect("candidate");
    assert_eq!(found.text, "Paris");
    assert_eq!(found.score, 5.0);
    assert_eq!(found.source_id, "docs/france.txt");
}

#[test]
fn multi_word_span_is_decoded_in_order() {
    let ex = extractor(FakeSpanModel::new(64).span("Paris", "capital", 4.0), 2.9);
    let found = ex.extract(QUESTION, &chunk("Paris is the capital of France.")).unwrap().unwrap();
    assert_eq!(found.text, "Paris is the capital");
}

#[test]
fn score_at_or_below_threshold_is_discarded() {
    let ex = extractor(FakeSpanModel::new(64).answer("Berlin", 2.9), 2.9);
    assert!(ex.extract(QUESTION, &chunk("Berlin is the capital of Germany.")).unwrap().is_none());
}

#[test]
fn unknown_context_decodes_to_marker_and_is_discarded() {
    let ex = extractor(FakeSpanModel::new(64), -10.0);
    assert!(ex.extract(QUESTION, &chunk("Bananas are yellow.")).unwrap().is_none());
}

#[test]
fn inverted_span_is_empty() {
    let ex = extractor(FakeSpanModel::new(64).span("France", "Paris", 6.0), 0.0);
    assert!(ex.extract(QUESTION, &chunk("Paris is the capital of France.")).unwrap().is_none());
}

#[test]
fn question_text_is_removed_from_span() {
    let ex = extractor(FakeSpanModel::new(64).span("What", "Paris", 4.0), 2.9);
    let found = ex.extract(QUESTION, &chunk("What is the capital of France? Paris")).unwrap().unwrap();
    assert_eq!(found.text, "Paris");
}

#[test]
fn context_is_truncated_never_the_question() {
    // 6 question words + 3 markers leaves 3 context words.
    let model = || FakeSpanModel::new(12).answer("Paris", 5.0);
    let ex = extractor(model(), 2.9);
    assert!(ex.extract(QUESTION, &chunk("one two three four Paris")).unwrap().is_none());
    assert_eq!(ex.extract(QUESTION, &chunk("one Paris three four five")).unwrap().unwrap().text, "Paris");

    let tight = extractor(FakeSpanModel::new(8).answer("Paris", 5.0), 2.9);
    let err = tight.extract(QUESTION, &chunk("Paris")).unwrap_err();
    assert!(matches!(err, Error::ModelInference(_)));
    assert!(err.is_recoverable());
}

#[test]
fn fixed_language_rejects_other_languages() {
    let model = || Arc::new(FakeSpanModel::new(64).span("Der", "Feld", 5.0));
    let fixed = SpanExtractor::new(model(), 2.9, LanguageCheck::from_filter(&LanguageFilter::Fixed("eng".into())).unwrap());
    assert!(fixed.extract(QUESTION, &chunk(GERMAN)).unwrap().is_none());

    let off = SpanExtractor::new(model(), 2.9, LanguageCheck::Off);
    assert_eq!(off.extract(QUESTION, &chunk(GERMAN)).unwrap().unwrap().text, GERMAN);
}

#[test]
fn from_config_reads_threshold_and_filter() {
    let config = PipelineConfig { min_score: 1.5, language_filter: LanguageFilter::Off, ..PipelineConfig::default() };
    let ex = SpanExtractor::from_config(Arc::new(FakeSpanModel::new(64)), &config).unwrap();
    assert_eq!(ex.min_score(), 1.5);

    let bad = PipelineConfig { language_filter: LanguageFilter::Fixed("klingon".into()), ..PipelineConfig::default() };
    assert!(matches!(SpanExtractor::from_config(Arc::new(FakeSpanModel::new(64)), &bad), Err(Error::InvalidConfig(_))));
}

const ENGLISH_QUESTION: &str = "Which city is the capital of Germany and where does the government sit?";

#[test]
fn span_in_other_language_than_question_is_dropped() {
    let model = FakeSpanModel::new(64).span("Berlin", "Deutschland", 5.0);
    let ex = SpanExtractor::new(Arc::new(model), 2.9, LanguageCheck::MatchQuestion);
    assert!(ex.extract(ENGLISH_QUESTION, &chunk("Berlin ist die Hauptstadt von Deutschland")).unwrap().is_none());
}

#[test]
fn span_in_question_language_is_kept() {
    let model = FakeSpanModel::new(64).span("Berlin", "government", 5.0);
    let ex = SpanExtractor::new(Arc::new(model), 2.9, LanguageCheck::MatchQuestion);
    let found = ex
        .extract(ENGLISH_QUESTION, &chunk("Berlin is the capital of Germany and the seat of the federal government"))
        .unwrap()
        .expect("candidate");
    assert_eq!(found.text, "Berlin is the capital of Germany and the seat of the federal government");
}
