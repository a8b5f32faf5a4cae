//! Text measurements shared by condition and preview handlers.

/// Number of whitespace-separated words.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Quality score in `[0, 100]` from word count alone, saturating at `target_words`.
pub(crate) fn heuristic_quality_score(text: &str, target_words: usize) -> f64 {
    if target_words == 0 {
        return 0.0;
    }
    let words = u32::try_from(word_count(text)).unwrap_or(u32::MAX);
    let target = u32::try_from(target_words).unwrap_or(u32::MAX);
    (f64::from(words) / f64::from(target) * 100.0).min(100.0)
}

/// Whole minutes needed to read `text` at 200 words per minute, at least one.
pub(crate) fn reading_time_minutes(text: &str) -> usize {
    word_count(text).div_ceil(200).max(1)
}
