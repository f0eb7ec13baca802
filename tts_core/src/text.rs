//! Text segmentation for the synthesis engine.
//!
//! The engine only handles short inputs reliably, so long text is cut into
//! chunks of at most `max_chars` characters. Cuts are tried at sentence-like
//! punctuation first, then at commas, and only then between arbitrary words.
//! Words are never split. The resulting units are greedily packed back
//! together so the engine is called as few times as possible.

/// Punctuation that ends a sentence-like piece when followed by whitespace.
const SENTENCE_MARKS: &[char] = &['.', '!', '?', ';', ':'];
/// Punctuation that ends a clause when followed by whitespace.
const CLAUSE_MARKS: &[char] = &[','];

/// Collapse every run of whitespace to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length in characters, which is what the chunk budget is measured in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into engine-sized chunks of at most `max_chars` characters.
///
/// Returns an empty vector when the text is empty after normalization.
/// A single word longer than `max_chars` is emitted as its own oversized chunk.
/// Joining the chunks with single spaces gives back the normalized text.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let cleaned = normalize_whitespace(text);
    if cleaned.is_empty() {
        return Vec::new();
    }
    if char_len(&cleaned) <= max_chars {
        return vec![cleaned];
    }

    let mut units: Vec<String> = Vec::new();
    for sentence in split_after(&cleaned, SENTENCE_MARKS) {
        if char_len(sentence) <= max_chars {
            units.push(sentence.to_string());
            continue;
        }

        for clause in split_after(sentence, CLAUSE_MARKS) {
            if char_len(clause) <= max_chars {
                units.push(clause.to_string());
            } else {
                units.extend(pack(clause.split_whitespace(), max_chars));
            }
        }
    }

    if units.is_empty() {
        return vec![cleaned];
    }

    pack(units.iter().map(String::as_str), max_chars)
}

/// Break `text` after any of `marks` that is directly followed by whitespace.
/// The mark stays with the preceding piece; the whitespace is dropped.
fn split_after<'a>(text: &'a str, marks: &[char]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && prev.is_some_and(|p| marks.contains(&p)) {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        prev = Some(c);
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Greedily join `items` with single spaces into the longest lines that fit
/// `max_chars`. An item that alone exceeds the budget becomes its own line.
fn pack<'a, I>(items: I, max_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for item in items {
        let item_len = char_len(item);
        if current.is_empty() {
            current.push_str(item);
            current_len = item_len;
        } else if current_len + 1 + item_len <= max_chars {
            current.push(' ');
            current.push_str(item);
            current_len += 1 + item_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(item);
            current_len = item_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
