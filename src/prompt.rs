//! Prompt builder.
//!
//! Maps a user's free-text request plus a [`GenerationConfig`] to the
//! enriched natural-language prompt that providers receive. The mapping is
//! pure: identical inputs always produce an identical string.
//!
//! Clauses are appended in a fixed order:
//! base text, duration, style, mood, tempo, key, instruments, binaural,
//! and a closing quality qualifier.

use crate::types::GenerationConfig;

/// Base text used when the user supplies nothing.
pub const FALLBACK_PROMPT: &str = "Peaceful ambient meditation music";

/// Closing qualifier appended to every prompt.
pub const QUALITY_QUALIFIER: &str = "High quality professional music production";

/// Builds the provider prompt for a request.
///
/// # Example
///
/// ```ignore
/// use meditation_music::prompt::build_prompt;
/// use meditation_music::types::GenerationConfig;
///
/// let config = GenerationConfig::new(60).with_tempo("slow").with_key("C minor");
/// let prompt = build_prompt("Create calming music for deep sleep", &config);
/// assert!(prompt.contains("70 BPM"));
/// ```
pub fn build_prompt(user_text: &str, config: &GenerationConfig) -> String {
    let base = user_text.trim().trim_end_matches('.').trim_end();
    let base = if base.is_empty() { FALLBACK_PROMPT } else { base };

    let mut clauses: Vec<String> = Vec::with_capacity(9);
    clauses.push(base.to_string());
    // Requested length; a provider that clamps renders less than this and
    // the shortfall shows up in `GeneratedAudio::was_clamped`.
    clauses.push(format!("Duration: {} seconds", config.duration_sec));

    if let Some(style) = non_empty(&config.style) {
        clauses.push(format!("Style: {}", style));
    }

    if let Some(mood) = non_empty(&config.mood) {
        clauses.push(format!("Mood: {}", mood));
    }

    if let Some(tempo) = &config.tempo {
        clauses.push(format!("Tempo: {} BPM", tempo.bpm()));
    }

    if let Some(key) = non_empty(&config.key) {
        clauses.push(format!("Key: {}", key));
    }

    let instruments: Vec<&str> = config
        .instruments
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if !instruments.is_empty() {
        clauses.push(format!("Instruments: {}", instruments.join(", ")));
    }

    // Binaural stays a background qualifier, never the lead clause.
    if let Some(freq) = config.binaural_hz() {
        clauses.push(format!(
            "With subtle background binaural beats at {} Hz",
            freq
        ));
    }

    clauses.push(QUALITY_QUALIFIER.to_string());

    let mut prompt = clauses.join(". ");
    prompt.push('.');
    prompt
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tempo;

    #[test]
    fn builds_full_prompt_in_order() {
        let config = GenerationConfig::new(60)
            .with_style("ambient")
            .with_mood("peaceful")
            .with_tempo("slow")
            .with_key("C minor")
            .with_instrument("piano")
            .with_instrument("strings")
            .with_binaural(6.0);

        let prompt = build_prompt("Create calming music for deep sleep", &config);
        assert_eq!(
            prompt,
            "Create calming music for deep sleep. Duration: 60 seconds. Style: ambient. \
             Mood: peaceful. Tempo: 70 BPM. Key: C minor. Instruments: piano, strings. \
             With subtle background binaural beats at 6 Hz. \
             High quality professional music production."
        );
    }

    #[test]
    fn deterministic() {
        let config = GenerationConfig::new(45)
            .with_mood("calm")
            .with_instrument("flute")
            .with_instrument("bowls")
            .with_instrument("harp");
        let a = build_prompt("ocean waves", &config);
        let b = build_prompt("ocean waves", &config.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn instrument_insertion_order_is_irrelevant() {
        let a = GenerationConfig::new(30)
            .with_instrument("harp")
            .with_instrument("flute");
        let b = GenerationConfig::new(30)
            .with_instrument("flute")
            .with_instrument("harp");
        assert_eq!(build_prompt("x", &a), build_prompt("x", &b));
    }

    #[test]
    fn tempo_lookup_table() {
        for (name, bpm) in [("slow", 70), ("medium", 90), ("fast", 110), ("brisk", 80)] {
            let config = GenerationConfig::new(30).with_tempo(name);
            let prompt = build_prompt("x", &config);
            assert!(
                prompt.contains(&format!("Tempo: {} BPM", bpm)),
                "{} -> {}",
                name,
                prompt
            );
        }

        let config = GenerationConfig::new(30).with_tempo(Tempo::Bpm(64));
        assert!(build_prompt("x", &config).contains("Tempo: 64 BPM"));
    }

    #[test]
    fn empty_input_uses_fallback() {
        let prompt = build_prompt("   ", &GenerationConfig::default());
        assert_eq!(
            prompt,
            "Peaceful ambient meditation music. Duration: 30 seconds. \
             High quality professional music production."
        );
    }

    #[test]
    fn binaural_omitted_without_frequency() {
        let mut config = GenerationConfig::new(30);
        config.binaural = true;
        assert!(!build_prompt("x", &config).contains("binaural"));
    }

    #[test]
    fn binaural_never_leads() {
        let config = GenerationConfig::new(30).with_binaural(10.0);
        let prompt = build_prompt("", &config);
        assert!(prompt.starts_with(FALLBACK_PROMPT));
        assert!(prompt.contains("binaural beats at 10 Hz"));
        assert!(prompt.ends_with("High quality professional music production."));
    }

    #[test]
    fn blank_optional_fields_are_skipped() {
        let config = GenerationConfig::new(30)
            .with_style("  ")
            .with_key("")
            .with_instrument(" ");
        let prompt = build_prompt("rain", &config);
        assert_eq!(
            prompt,
            "rain. Duration: 30 seconds. High quality professional music production."
        );
    }

    #[test]
    fn trailing_period_not_doubled() {
        let prompt = build_prompt("Gentle rain.", &GenerationConfig::new(30));
        assert!(prompt.starts_with("Gentle rain. Duration"));
    }
}
