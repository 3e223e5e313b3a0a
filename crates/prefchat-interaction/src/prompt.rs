//! Prompt construction and reply parsing for command-proposing chats.

use std::collections::HashMap;

use prefchat_core::error::{PrefchatError, Result};
use prefchat_core::preference::{Platform, PreferenceSnapshot};
use rust_stemmers::{Algorithm, Stemmer};
use serde::Deserialize;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "be", "can", "could", "disable", "do", "enable", "for", "i", "in",
    "is", "it", "make", "me", "my", "of", "on", "please", "set", "so", "the", "to", "turn", "up",
    "want", "with", "would", "you",
];

/// Builds the system prompt that opens every session.
pub fn system_prompt(platform: Option<Platform>, reference_json: &str) -> String {
    let environment = platform.map(|p| p.as_str()).unwrap_or("unknown");
    format!(
        r#"You're an assistant that only replies in JSON format with keys "message" and "command".
It is very important that you stick to the following JSON format.

Your main job is to act as a computer accessibility coach that replies to queries with a JSON
object that has the following keys:
- "message": Something you want to say to the user
- "command": An accessibility command to run, or "" when no change is needed

Below is a reference JSON that shows the accessibility commands available
for the current environment ({environment}):

{reference_json}

Every prompt begins with the snippet of the reference JSON that most likely
matches what the user is referring to. Append the new value to the end of the
command found in "commands", using "current", "lower_bound" and "upper_bound"
to decide on it. Always reply with just the final JSON object, like:

{{
  "message": "...",
  "command": "..."
}}
"#
    )
}

/// Finds the setting name most similar to `prompt`.
///
/// Only settings with a command for `platform` are candidates. Returns
/// `None` when no candidate shares a word with the prompt.
pub fn find_best_match(
    prompt: &str,
    snapshot: &PreferenceSnapshot,
    platform: Option<Platform>,
) -> Option<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let prompt_tokens = term_counts(&stemmer, prompt);
    let mut best: Option<(String, f64)> = None;

    for (name, setting) in snapshot.iter() {
        let runnable = match platform {
            Some(platform) => setting.commands.command_for(platform).is_some(),
            None => [Platform::Windows, Platform::Macos, Platform::Gnome]
                .iter()
                .any(|p| setting.commands.command_for(*p).is_some()),
        };
        if !runnable {
            continue;
        }
        let score = cosine_similarity(&prompt_tokens, &term_counts(&stemmer, name));
        if score > best.as_ref().map_or(0.0, |(_, s)| *s) {
            best = Some((name.clone(), score));
        }
    }

    best.map(|(name, _)| name)
}

/// Lowercased, stop-word filtered, stemmed token counts, so "cursors"
/// and "cursor" land on the same term.
fn term_counts(stemmer: &Stemmer, text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(&t.as_str()))
    {
        let stem = stemmer.stem(&token).into_owned();
        *counts.entry(stem).or_insert(0.0) += 1.0;
    }
    counts
}

fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// The JSON object the model is instructed to answer with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelReply {
    pub message: String,
    #[serde(default)]
    pub command: String,
}

/// Parses the model's answer.
///
/// Accepts the bare object, or an object surrounded by prose or a fenced
/// code block.
pub fn parse_model_reply(content: &str) -> Result<ModelReply> {
    let trimmed = content.trim();
    if let Ok(reply) = serde_json::from_str::<ModelReply>(trimmed) {
        return Ok(reply);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<ModelReply>(&trimmed[start..=end]).map_err(|err| {
                PrefchatError::Serialization {
                    format: "JSON".to_string(),
                    message: format!("Failed to parse model response: {err}"),
                }
            })
        }
        _ => Err(PrefchatError::Serialization {
            format: "JSON".to_string(),
            message: "Model response contains no JSON object".to_string(),
        }),
    }
}
