//! Shallow text heuristics shared by the stage agents.
//!
//! None of this is NLP: sentences are split on terminal punctuation, passive
//! voice and entities are regex matches. The checks only need to be stable
//! and cheap.

use regex_lite::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

static PASSIVE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(be|been|being|is|are|was|were)\s+\w+ed\b").ok());
static CITATION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"https?://").ok());
static FRESH_YEAR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b20[23][0-9]\b").ok());
static ENTITY: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[A-Z][a-z]+").ok());
static PREVIEW: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(we'll|this guide|you'll)").ok());
static QUESTION_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(how|what|why|when|where|who|should)").ok());

fn is_match(re: &LazyLock<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split after `.`, `!` or `?` when followed by whitespace. Empty pieces are
/// dropped and each sentence is trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if !chars.peek().is_some_and(|&(_, next)| next.is_whitespace()) {
            continue;
        }

        sentences.push(&text[start..i + c.len_utf8()]);
        while chars.peek().is_some_and(|&(_, w)| w.is_whitespace()) {
            chars.next();
        }
        start = chars.peek().map_or(text.len(), |&(j, _)| j);
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn looks_passive(sentence: &str) -> bool {
    is_match(&PASSIVE, &sentence.to_lowercase())
}

pub fn has_citation(text: &str) -> bool {
    is_match(&CITATION, text)
}

/// A year between 2020 and 2039, word-bounded.
pub fn has_fresh_year(text: &str) -> bool {
    is_match(&FRESH_YEAR, text)
}

pub fn needs_authority_upgrade(text: &str) -> bool {
    !(has_citation(text) && has_fresh_year(text))
}

/// Capitalized words, a stand-in for named entities.
pub fn entity_mentions(text: &str) -> usize {
    ENTITY.as_ref().map_or(0, |re| re.find_iter(text).count())
}

/// Fewer than three sentences or fewer than two entity mentions.
pub fn needs_density_upgrade(text: &str) -> bool {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return false;
    }
    sentences.len() < 3 || entity_mentions(text) < 2
}

/// Answer-Evidence-Context needs at least three period-delimited sentences.
pub fn passes_aec(text: &str) -> bool {
    text.split('.').filter(|s| !s.trim().is_empty()).count() >= 3
}

pub fn is_answer_first_intro(text: &str, words: RangeInclusive<usize>) -> bool {
    words.contains(&word_count(text)) && is_match(&PREVIEW, text)
}

/// Turn a heading into a question: keep leading question words, otherwise
/// prefix "How does".
pub fn questionize(text: &str) -> String {
    let cleaned = text.trim().trim_end_matches('?');
    let mut question = if is_match(&QUESTION_WORD, cleaned) {
        cleaned.to_string()
    } else {
        format!("How does {cleaned}").trim().to_string()
    };
    question.push('?');
    question
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut `text` to at most `max` characters, backing off to the last word
/// boundary when the cut would split a word.
pub fn truncate_at_word(text: &str, max: usize) -> &str {
    if char_count(text) <= max {
        return text;
    }
    let head = truncate_chars(text, max);
    let splits_word = text[head.len()..]
        .chars()
        .next()
        .is_some_and(|c| !c.is_whitespace());
    let cut = if splits_word {
        head.rfind(char::is_whitespace).map_or(head, |idx| &head[..idx])
    } else {
        head
    };
    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'))
}
