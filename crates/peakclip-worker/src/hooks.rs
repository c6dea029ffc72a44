//! Hook caption generation.
//!
//! A deterministic text heuristic: question first, emphatic keyword
//! second, fixed template last. Pure and total over any input string.

use std::sync::LazyLock;

use regex::Regex;

/// First run of at least 5 non-`?` chars ending in `?`.
static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^?]{5,}\?)").unwrap());

/// Fallback templates; the first entry is the default hook.
const TEMPLATES: [&str; 5] = [
    "He didn’t expect THIS…",
    "This took a wild turn👇",
    "No way this just happened…",
    "Wait for it…",
    "I can’t believe he said that",
];

/// Hook used when the transcript carries an emphatic keyword.
const EMPHATIC_HOOK: &str = "No way—watch this!";

/// Keywords that mark a transcript as emphatic.
const EMPHATIC_KEYWORDS: [&str; 7] = [
    "no way",
    "what the",
    "bro",
    "omg",
    "dude",
    "insane",
    "unbelievable",
];

/// Maximum length (chars) for a question used verbatim as the hook.
const MAX_QUESTION_CHARS: usize = 80;

/// How far into the transcript (chars) to look for a question.
const QUESTION_SCAN_CHARS: usize = 200;

/// Derive a promotional hook from a transcript.
pub fn make_hook(transcript: &str) -> String {
    let t = transcript.trim();

    // Use the first question as the hook if present
    let head: String = t.chars().take(QUESTION_SCAN_CHARS).collect();
    if let Some(m) = QUESTION_RE.find(&head) {
        let q = m.as_str().trim();
        if q.chars().count() <= MAX_QUESTION_CHARS {
            return q.to_string();
        }
    }

    // Emphatic transcripts get a fixed exclamatory hook
    let lower = t.to_lowercase();
    if EMPHATIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return EMPHATIC_HOOK.to_string();
    }

    TEMPLATES[0].to_string()
}
