//! Rule-based baseline annotator.
//!
//! Tokenizes with a regex, splits sentences at terminal punctuation (minus a
//! short abbreviation list) and at blank lines, and assigns Penn-style tags
//! from a closed-class word table plus suffix heuristics. Lemmas are
//! lower-cased forms with regular inflection stripped. Entities are only
//! recognised after honorifics (`PERSON`) and for numbers (`NUMBER`);
//! everything else is tagged [`NO_ENTITY`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::nlp::{Annotation, Annotator, NO_ENTITY, NlpResult, Sentence, Token};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{M}]+(?:['’][\p{L}\p{M}]+)*|\p{N}+(?:[.,:]\p{N}+)*|\S").unwrap()
});

static CLOSED_CLASS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    let groups: &[(&str, &[&str])] = &[
        ("DT", &["the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no", "all"]),
        ("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself", "himself", "herself", "itself"]),
        ("PRP$", &["my", "your", "his", "her", "its", "our", "their"]),
        ("IN", &[
            "of", "in", "on", "at", "by", "for", "with", "from", "into", "upon", "about", "over",
            "under", "after", "before", "through", "between", "against", "without", "within",
            "during", "among", "as", "if", "than", "because", "while", "though", "although",
        ]),
        ("CC", &["and", "or", "but", "nor", "yet"]),
        ("TO", &["to"]),
        ("MD", &["can", "could", "may", "might", "must", "shall", "should", "will", "would"]),
        ("VBZ", &["is", "has", "does"]),
        ("VBP", &["are", "am", "have", "do"]),
        ("VBD", &["was", "were", "had", "did", "said"]),
        ("VB", &["be"]),
        ("VBN", &["been"]),
        ("VBG", &["being"]),
        ("WP", &["who", "whom", "what"]),
        ("WDT", &["which", "whose"]),
        ("WRB", &["when", "where", "why", "how"]),
        ("RB", &["not", "very", "so", "too", "never", "always", "then", "now", "here"]),
        ("EX", &["there"]),
    ];
    for (pos, words) in groups {
        for word in *words {
            table.insert(*word, *pos);
        }
    }
    table
});

static IRREGULAR_LEMMAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("is", "be"),
        ("are", "be"),
        ("am", "be"),
        ("was", "be"),
        ("were", "be"),
        ("been", "be"),
        ("being", "be"),
        ("has", "have"),
        ("had", "have"),
        ("does", "do"),
        ("did", "do"),
        ("said", "say"),
        ("me", "i"),
        ("him", "he"),
        ("us", "we"),
        ("them", "they"),
        ("an", "a"),
    ])
});

/// Words whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "prof", "rev", "capt", "col", "gen", "lt", "messrs", "mme",
    "mlle", "vol", "ch", "no", "viz", "etc", "vs",
];

/// Words after which a capitalised word is taken to name a person.
const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "dr", "sir", "lady", "lord", "madame", "monsieur", "captain",
    "colonel", "prof",
];

/// Baseline annotator; stateless and freely shareable across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleAnnotator;

impl RuleAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for RuleAnnotator {
    fn annotate(&self, text: &str) -> NlpResult<Annotation> {
        let mut sentences = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut sentence_done = false;
        let mut previous_word: Option<String> = None;

        let mut byte_pos = 0usize;
        let mut char_pos = 0usize;

        for m in TOKEN.find_iter(text) {
            let gap = &text[byte_pos..m.start()];
            char_pos += gap.chars().count();
            let start = char_pos;
            char_pos += m.as_str().chars().count();
            let end = char_pos;
            byte_pos = m.end();

            let word = m.as_str();
            let paragraph_break = gap.replace('\r', "").contains("\n\n");

            if !current.is_empty() && (paragraph_break || (sentence_done && !is_closing(word))) {
                sentences.push(Sentence::new(std::mem::take(&mut current)));
                sentence_done = false;
            }

            let initial = current
                .last()
                .is_none_or(|t: &Token| t.pos == "``" || t.pos == "-LRB-");
            let (lemma, pos) = tag(word, initial);
            let entity = entity(pos, previous_word.as_deref());

            if is_terminal(word) {
                let abbreviated = previous_word
                    .as_deref()
                    .is_some_and(|w| ABBREVIATIONS.contains(&w))
                    && current.last().is_some_and(|t| t.end == start);
                if !abbreviated {
                    sentence_done = true;
                }
            }
            if !is_punctuation(word) {
                previous_word = Some(word.to_lowercase());
            }

            current.push(Token {
                start,
                end,
                lemma,
                pos: pos.to_string(),
                entity: entity.to_string(),
            });
        }

        if !current.is_empty() {
            sentences.push(Sentence::new(current));
        }
        Ok(Annotation::new(sentences))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

fn is_punctuation(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_alphanumeric())
}

fn is_terminal(word: &str) -> bool {
    matches!(word, "." | "!" | "?")
}

fn is_closing(word: &str) -> bool {
    matches!(word, "\"" | "”" | "’" | "'" | ")" | "]")
}

/// Lemma and part-of-speech tag for one token.
fn tag(word: &str, sentence_initial: bool) -> (String, &'static str) {
    if is_punctuation(word) {
        let pos = match word {
            "." | "!" | "?" => ".",
            "," => ",",
            ";" | ":" | "-" | "—" | "–" | "…" => ":",
            "(" | "[" => "-LRB-",
            ")" | "]" => "-RRB-",
            "“" | "‘" => "``",
            "\"" | "”" | "’" | "'" => "''",
            _ => "SYM",
        };
        return (word.to_string(), pos);
    }

    if word.chars().next().is_some_and(char::is_numeric) {
        return (word.to_string(), "CD");
    }

    let lower = word.to_lowercase();
    if let Some(&pos) = CLOSED_CLASS.get(lower.as_str()) {
        let lemma = IRREGULAR_LEMMAS
            .get(lower.as_str())
            .map_or(lower.clone(), |l| l.to_string());
        return (lemma, pos);
    }

    let capitalised = word.chars().next().is_some_and(char::is_uppercase);
    if capitalised && !sentence_initial {
        return (word.to_string(), "NNP");
    }

    let chars = lower.chars().count();
    if chars > 4 && lower.ends_with("ly") {
        (lower, "RB")
    } else if chars > 5 && lower.ends_with("ing") {
        (strip(&lower, "ing", true), "VBG")
    } else if chars > 4 && lower.ends_with("ed") {
        (strip(&lower, "ed", true), "VBD")
    } else if chars > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
        (strip(&lower, "s", false), "NNS")
    } else {
        (lower, "NN")
    }
}

/// Remove an inflectional suffix, optionally undoubling a final consonant
/// (`running` → `run`, but `falling` → `fall`).
fn strip(word: &str, suffix: &str, undouble: bool) -> String {
    let mut stem: Vec<char> = word.strip_suffix(suffix).unwrap_or(word).chars().collect();
    let doubled = matches!(stem.as_slice(), [.., a, b] if a == b && !"aeioulsz".contains(*a));
    if undouble && doubled {
        stem.pop();
    }
    stem.into_iter().collect()
}

fn entity(pos: &str, previous_word: Option<&str>) -> &'static str {
    if pos == "CD" {
        "NUMBER"
    } else if pos == "NNP" && previous_word.is_some_and(|w| HONORIFICS.contains(&w)) {
        "PERSON"
    } else {
        NO_ENTITY
    }
}
