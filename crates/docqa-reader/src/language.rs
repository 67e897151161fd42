use whatlang::Lang;

use docqa_core::config::LanguageFilter;
use docqa_core::error::{Error, Result};

/// ISO 639-3 code of the most likely language of `text`.
///
/// The best guess is taken without a reliability threshold; `None` only when
/// nothing can be guessed.
pub fn detect(text: &str) -> Option<&'static str> {
    whatlang::detect(text).map(|info| info.lang().code())
}

/// Resolved form of [`LanguageFilter`]; fixed codes are validated up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCheck {
    Off,
    MatchQuestion,
    Fixed(Lang),
}

impl LanguageCheck {
    pub fn from_filter(filter: &LanguageFilter) -> Result<Self> {
        Ok(match filter {
            LanguageFilter::Off => Self::Off,
            LanguageFilter::MatchQuestion => Self::MatchQuestion,
            LanguageFilter::Fixed(code) => Self::Fixed(
                Lang::from_code(code)
                    .ok_or_else(|| Error::InvalidConfig(format!("unknown language code '{code}'")))?,
            ),
        })
    }

    /// Target language for `question`, if any check applies.
    pub fn target(&self, question: &str) -> Option<&'static str> {
        match self {
            Self::Off => None,
            Self::MatchQuestion => detect(question),
            Self::Fixed(lang) => Some(lang.code()),
        }
    }

    /// Whether `span` passes. Passes when either language cannot be guessed.
    pub fn accepts(&self, target: Option<&str>, span: &str) -> bool {
        match (target, detect(span)) {
            (Some(want), Some(got)) => want == got,
            _ => true,
        }
    }
}
