//! Face embedding comparison.
//!
//! Every failure mode (undecodable template, mismatched dimensions, zero norm,
//! non-finite components) scores `0.0`, which never clears
//! [`SIMILARITY_THRESHOLD`].

/// Minimum cosine similarity for a live capture to match the enrolled template.
pub const SIMILARITY_THRESHOLD: f64 = 0.55;

/// Cosine similarity of two vectors in `[-1, 1]`, or `0.0` when undefined.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Decodes an embedding stored as JSON text (`"[0.1, 0.2, ...]"`).
pub fn parse_embedding(raw: &str) -> Option<Vec<f64>> {
    serde_json::from_str::<Vec<f64>>(raw.trim()).ok()
}

/// Encodes an embedding for storage.
pub fn encode_embedding(values: &[f64]) -> Result<String, serde_json::Error> {
    serde_json::to_string(values)
}

/// Scores a live capture against a stored template.
pub fn match_score(stored: &str, live: &[f64]) -> f64 {
    match parse_embedding(stored) {
        Some(template) => cosine_similarity(&template, live),
        None => 0.0,
    }
}

pub fn is_match(score: f64) -> bool {
    score >= SIMILARITY_THRESHOLD
}
