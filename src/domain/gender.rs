use crate::domain::models::Gender;

/// Guesses a gender from a display name when registration leaves it blank.
pub trait GenderClassifier: Send + Sync {
    fn classify(&self, name: &str) -> Gender;
}

/// Matches lowercase name tokens against a finite table of given-name patterns.
/// The first token that matches either table decides; female patterns are
/// checked first within a token. Anything unmatched is `Other`.
///
/// Patterns up to `WHOLE_TOKEN_MAX` characters must equal the token; longer
/// ones match as prefixes, so "andi" does not claim "Andini".
#[derive(Debug, Clone)]
pub struct PatternGenderClassifier {
    female: Vec<String>,
    male: Vec<String>,
}

const WHOLE_TOKEN_MAX: usize = 4;

/// Common Indonesian given names and name prefixes.
const DEFAULT_FEMALE: &[&str] = &[
    "siti", "sri", "dewi", "putri", "ayu", "nur", "rina", "ratna", "wati", "lestari", "indah",
    "fitri", "maria", "anisa", "nisa", "dian", "yuni", "eka", "nurul", "andini",
];

const DEFAULT_MALE: &[&str] = &[
    "muhammad", "muh", "moh", "ahmad", "budi", "agus", "andi", "bambang", "joko", "eko", "hadi",
    "rudi", "dedi", "bayu", "rizki", "fajar", "arif", "yusuf", "putra",
];

impl PatternGenderClassifier {
    pub fn new<I, J, S>(female: I, male: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            female: female.into_iter().map(|p| p.into().to_lowercase()).collect(),
            male: male.into_iter().map(|p| p.into().to_lowercase()).collect(),
        }
    }

    fn token_matches(patterns: &[String], token: &str) -> bool {
        patterns.iter().any(|p| {
            if p.chars().count() <= WHOLE_TOKEN_MAX {
                token == p.as_str()
            } else {
                token.starts_with(p.as_str())
            }
        })
    }
}

impl Default for PatternGenderClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FEMALE.iter().copied(), DEFAULT_MALE.iter().copied())
    }
}

impl GenderClassifier for PatternGenderClassifier {
    fn classify(&self, name: &str) -> Gender {
        let lower = name.to_lowercase();
        lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .find_map(|token| {
                if Self::token_matches(&self.female, token) {
                    Some(Gender::Female)
                } else if Self::token_matches(&self.male, token) {
                    Some(Gender::Male)
                } else {
                    None
                }
            })
            .unwrap_or(Gender::Other)
    }
}
