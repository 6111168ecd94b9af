//! Transcript normalizers.
//!
//! Every function here is pure and total: no input makes them panic, and the
//! worst case is a trimmed or lower-cased copy of the input. Each normalizer
//! is idempotent on its own output, so a value typed into the edit box after
//! a voice capture can be passed through the same normalizer again.

use voxsign_types::{Country, StepId};

/// Minimum number of single-character tokens treated as a spelled-out word.
const MIN_SPELLED_TOKENS: usize = 3;

/// Minimum query length before a country name may be matched by substring.
///
/// Shorter fragments ("in", "an") would match half the table.
const MIN_PARTIAL_COUNTRY_CHARS: usize = 3;

/// Filler phrases that precede a spoken name. Longer phrases come first.
const NAME_FILLERS: &[&str] = &[
    "my full name is",
    "my name is",
    "my name's",
    "the name is",
    "name is",
    "you can call me",
    "call me",
    "this is",
    "i am",
    "i'm",
    "im",
    "it is",
    "it's",
    "its",
    "أنا اسمي",
    "انا اسمي",
    "اسمي هو",
    "إسمي",
    "اسمي",
    "أنا",
    "انا",
];

const USERNAME_FILLERS: &[&str] = &[
    "my username should be",
    "my username will be",
    "my username is",
    "my user name is",
    "the username is",
    "username should be",
    "username is",
    "username",
    "user name",
    "i'd like",
    "i want",
    "make it",
    "it is",
    "it's",
    "اسم المستخدم هو",
    "اسم المستخدم",
    "يوزري",
    "اليوزر",
];

/// Filler phrases that precede a spoken country or city.
const PLACE_FILLERS: &[&str] = &[
    "i live in",
    "i'm living in",
    "i'm from",
    "i am from",
    "my country is",
    "my city is",
    "the city is",
    "it is",
    "it's",
    "in",
    "أنا من",
    "انا من",
    "أسكن في",
    "اسكن في",
    "أعيش في",
    "اعيش في",
    "مدينتي هي",
    "مدينتي",
    "بلدي",
    "من",
    "في",
];

const AT_WORDS: &[&str] = &["at", "آت", "أت", "ات"];
const DOT_WORDS: &[&str] = &["dot", "دوت", "نقطة", "نقطه"];

fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '،' | '؟' | '؛' | '…' | '“' | '”' | '‘' | '’')
}

fn is_arabic(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

fn trim_trailing_punct(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_whitespace() || is_punct(c))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips `prefix` (ASCII case-insensitive) when it is followed by a word boundary.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || is_punct(c) => Some(rest),
        Some(_) => None,
    }
}

/// Repeatedly removes leading filler phrases ("my name is", "i'm", …).
fn strip_fillers<'a>(mut text: &'a str, fillers: &[&str]) -> &'a str {
    loop {
        let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || is_punct(c));
        match fillers
            .iter()
            .find_map(|filler| strip_prefix_ci(trimmed, filler))
        {
            Some(rest) => text = rest,
            None => return trimmed,
        }
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace() || c == '-';
    }
    out
}

/// Shared pipeline for names and places: fillers, punctuation, spelling, casing.
fn clean_words(raw: &str, fillers: &[&str]) -> String {
    let text = raw.replace('’', "'");
    let stripped = trim_trailing_punct(strip_fillers(&text, fillers));
    let joined = collapse_whitespace(&join_spelled_letters(stripped));
    if joined.chars().any(is_arabic) {
        joined
    } else {
        title_case(&joined)
    }
}

/// Rejoins a word that was spelled out letter by letter.
///
/// Input made of at least three single-character tokens (a letter in any
/// script, or a digit) separated by spaces, dashes or dots is concatenated
/// and lower-cased. Anything else is returned unchanged.
///
/// ```
/// use voxsign_form::join_spelled_letters;
///
/// assert_eq!(join_spelled_letters("A-B-D-U-L-L-A-H"), "abdullah");
/// assert_eq!(join_spelled_letters("john smith"), "john smith");
/// ```
pub fn join_spelled_letters(raw: &str) -> String {
    let tokens: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '.'))
        .filter(|token| !token.is_empty())
        .collect();

    let spelled = tokens.len() >= MIN_SPELLED_TOKENS
        && tokens.iter().all(|token| {
            let mut chars = token.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphanumeric())
        });

    if spelled {
        tokens.concat().to_lowercase()
    } else {
        raw.to_string()
    }
}

/// Extracts a display name from a transcript.
///
/// Latin-script results are capitalized per word; Arabic-script results keep
/// their original form.
pub fn extract_name(raw: &str) -> String {
    clean_words(raw, NAME_FILLERS)
}

/// Extracts a username: lower-case `[a-z0-9_]`, whitespace becomes `_`.
pub fn extract_username(raw: &str) -> String {
    let text = raw.replace('’', "'");
    let stripped = trim_trailing_punct(strip_fillers(&text, USERNAME_FILLERS));
    let joined = join_spelled_letters(stripped).to_lowercase();
    joined
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Splits "local at domain" or "local@domain" into its halves.
fn split_spoken_address(text: &str) -> Option<(String, String)> {
    if let Some((local, domain)) = text.split_once('@') {
        return Some((local.to_string(), domain.to_string()));
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let at = words.iter().position(|word| AT_WORDS.contains(word))?;
    Some((words[..at].join(" "), words[at + 1..].join(" ")))
}

/// Turns a spoken or typed email address into its written form.
///
/// ```
/// use voxsign_form::clean_email;
///
/// assert_eq!(clean_email("v x r 10 at hotmail dot com"), "vxr10@hotmail.com");
/// ```
pub fn clean_email(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let rejoined = match split_spoken_address(&lowered) {
        Some((local, domain)) => {
            let local = local.trim();
            // Only a spoken local part arrives as separate letters; dots and
            // dashes in a written one are part of the address.
            let local = if local.contains(char::is_whitespace) {
                join_spelled_letters(local)
            } else {
                local.to_string()
            };
            format!("{}@{}", local, domain.trim())
        }
        None => lowered,
    };

    let mut email: String = rejoined
        .split_whitespace()
        .map(|word| {
            if AT_WORDS.contains(&word) {
                "@"
            } else if DOT_WORDS.contains(&word) {
                "."
            } else {
                word
            }
        })
        .collect();

    while email.contains("@@") {
        email = email.replace("@@", "@");
    }
    while email.contains("..") {
        email = email.replace("..", ".");
    }
    email.trim_matches('.').to_string()
}

/// Extracts a place name (country or city) from a transcript.
pub fn extract_place(raw: &str) -> String {
    clean_words(raw, PLACE_FILLERS)
}

/// Trims free-form text and drops trailing punctuation.
pub fn extract_free_text(raw: &str) -> String {
    collapse_whitespace(trim_trailing_punct(raw.trim()))
}

/// Finds the country a transcript refers to.
///
/// Exact matches on either localized name or the ISO code win. Otherwise the
/// longest country name contained in the query (or, for queries of at least
/// three characters, containing it) is returned.
pub fn match_country<'a>(spoken: &str, table: &'a [Country]) -> Option<&'a Country> {
    let query = trim_trailing_punct(spoken.trim()).to_lowercase();
    if query.is_empty() {
        return None;
    }

    let exact = table.iter().find(|country| {
        country.code.eq_ignore_ascii_case(&query)
            || country.name.en.to_lowercase() == query
            || country.name.ar == query
    });
    if exact.is_some() {
        return exact;
    }

    let allow_partial = query.chars().count() >= MIN_PARTIAL_COUNTRY_CHARS;
    table
        .iter()
        .filter(|country| {
            let en = country.name.en.to_lowercase();
            let ar = country.name.ar;
            query.contains(en.as_str())
                || query.contains(ar)
                || (allow_partial && (en.contains(query.as_str()) || ar.contains(query.as_str())))
        })
        .max_by_key(|country| country.name.en.len())
}

/// Applies the normalizer that belongs to `step`.
///
/// Password fields are passed through untouched.
pub fn normalize_for_step(step: StepId, raw: &str) -> String {
    match step {
        StepId::Name => extract_name(raw),
        StepId::Username => extract_username(raw),
        StepId::Email => clean_email(raw),
        StepId::Country | StepId::City => extract_place(raw),
        StepId::Password | StepId::ConfirmPassword => raw.to_string(),
        _ => extract_free_text(raw),
    }
}
