//! Word splitting and case conversion
//!
//! Shared by the string filters (`snake`, `camel`, `kebab`, `slug`, `ucwords`)
//! and by the input naming strategies of type descriptors.

/// Split an identifier or phrase into words.
///
/// Non-alphanumeric characters separate words, and a lowercase letter or digit
/// followed by an uppercase letter starts a new word (`fullName` → `full`, `Name`).
pub fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for ch in input.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }

        if ch.is_uppercase() {
            if let Some(p) = prev {
                if (p.is_lowercase() || p.is_numeric()) && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
        }

        current.push(ch);
        prev = Some(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Uppercase the first character, leave the rest untouched
pub fn upper_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character, leave the rest untouched
pub fn lower_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `full_name`
pub fn snake(input: &str) -> String {
    join_lower(input, "_")
}

/// `full-name`
pub fn kebab(input: &str) -> String {
    join_lower(input, "-")
}

/// `fullName`
pub fn camel(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in words(input).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            out.push_str(&upper_first(&lower));
        }
    }
    out
}

/// Uppercase the first letter of every whitespace-separated word
pub fn title_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// URL-friendly lowercase ASCII slug
pub fn slug(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn join_lower(input: &str, sep: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}
