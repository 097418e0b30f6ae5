use unicode_segmentation::UnicodeSegmentation;

/// Lowercases, trims and collapses inner whitespace.
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Citation markers longer than this are treated as ordinary brackets.
const MAX_CITATION_LEN: usize = 32;

/// Words whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "e.g", "i.e", "cf", "fig",
    "approx", "ca", "gen", "col", "lt", "sgt", "capt",
];

/// Splits text into trimmed, non-empty sentences using Unicode sentence
/// boundaries. Line breaks always end a sentence.
///
/// Citation markers such as `[1][2]` stay on the sentence they follow and a
/// period after a known abbreviation (`Mr.`, `e.g.`) does not end one.
/// Sentences are slices of `text`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (offset, _) in text.split_sentence_bound_indices().skip(1) {
        if offset <= start {
            continue;
        }
        let mut end = offset;
        if text[..end].ends_with('[') {
            end = skip_citations(text, end - 1).max(end);
        }
        if ends_with_abbreviation(&text[start..end]) {
            continue;
        }
        push_sentence(&mut sentences, &text[start..end]);
        start = end;
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece);
    }
}

/// Returns the offset just past a run of `[..]` markers starting at `pos`.
fn skip_citations(text: &str, mut pos: usize) -> usize {
    while text[pos..].starts_with('[') {
        let rest = &text[pos + 1..];
        match rest.find(|c: char| c == ']' || c == '[' || c == '\n') {
            Some(i) if i <= MAX_CITATION_LEN && rest[i..].starts_with(']') => pos += i + 2,
            _ => break,
        }
    }
    pos
}

fn ends_with_abbreviation(piece: &str) -> bool {
    let trimmed = piece.trim_end();
    if piece[trimmed.len()..].contains('\n') {
        return false;
    }
    let word = match trimmed.strip_suffix('.') {
        Some(rest) => rest.rsplit(char::is_whitespace).next().unwrap_or(rest),
        None => return false,
    };
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

/// Cuts `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
