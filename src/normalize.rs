//! Text normalisation — the first half of the spectrogram model's `parse` step.
//!
//! LLM answers arrive as light Markdown with digits in them.  The character
//! vocabulary of the spectrogram model has neither, so before tokenisation we
//! turn the answer into plain speakable prose:
//!
//! 1. `[label](url)` → `label`, bare URLs dropped.
//! 2. Heading hashes and list bullets / numbers at line start dropped.
//! 3. Emphasis and code markers (`*`, `_`, `` ` ``, `~`) dropped.
//! 4. Digit-group commas removed, `%` → "percent", numbers → words.
//! 5. Whitespace collapsed.

use fancy_regex::{Captures, Regex as FancyRegex};
use once_cell::sync::Lazy;
use regex::Regex;

// ─────────────────────────────────────────────────────────────────────────────
// Number → words
// ─────────────────────────────────────────────────────────────────────────────

const SMALL: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const DECADES: [&str; 10] =
    ["", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety"];
const GROUPS: [&str; 7] =
    ["", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion"];

/// Words for 1..=999.
fn below_thousand(n: u64) -> String {
    let mut words = Vec::with_capacity(3);
    if n >= 100 {
        words.push(format!("{} hundred", SMALL[(n / 100) as usize]));
    }
    match n % 100 {
        0 => {}
        r @ 1..=19 => words.push(SMALL[r as usize].to_string()),
        r if r % 10 == 0 => words.push(DECADES[(r / 10) as usize].to_string()),
        r => words.push(format!("{}-{}", DECADES[(r / 10) as usize], SMALL[(r % 10) as usize])),
    }
    words.join(" ")
}

/// Spell out a non-negative integer, e.g. `2024` → "two thousand twenty-four".
pub fn integer_to_words(n: u64) -> String {
    if n == 0 {
        return SMALL[0].to_string();
    }
    let mut groups = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        let group = rest % 1000;
        if group > 0 {
            let words = below_thousand(group);
            groups.push(match GROUPS[scale] {
                "" => words,
                name => format!("{words} {name}"),
            });
        }
        rest /= 1000;
        scale += 1;
    }
    groups.reverse();
    groups.join(" ")
}

/// Spell out `123` or `5.25` ("five point two five").
///
/// Integers too long for `u64` are read digit by digit.
pub fn number_to_words(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut out = match int_part.parse::<u64>() {
        Ok(n) => integer_to_words(n),
        Err(_) if int_part.is_empty() => SMALL[0].to_string(),
        Err(_) => digit_by_digit(int_part),
    };
    if let Some(frac) = frac_part.filter(|f| !f.is_empty()) {
        out.push_str(" point ");
        out.push_str(&digit_by_digit(frac));
    }
    out
}

fn digit_by_digit(digits: &str) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| SMALL[d as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").unwrap());
static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+•]|\d{1,2}[.)])[ \t]+").unwrap());
static RE_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*`~]+").unwrap());
static RE_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());
// Runs of `_` joining two word characters (snake_case), spoken as a space.
static RE_JOINING_UNDERSCORES: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<=[^\W_])_+(?=[^\W_])").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_DIGIT_GROUP: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<=\d),(?=\d{3}(?!\d))").unwrap());
static RE_PERCENT: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<![\w.])(\d+(?:\.\d+)?)\s*%").unwrap());
static RE_NUMBER: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?<![\w.])\d+(?:\.\d+)?").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Passes
// ─────────────────────────────────────────────────────────────────────────────

pub fn strip_markdown(text: &str) -> String {
    let text = RE_LINK.replace_all(text, "$1");
    let text = RE_URL.replace_all(&text, "");
    let text = RE_HEADING.replace_all(&text, "");
    let text = RE_BULLET.replace_all(&text, "");
    let text = RE_MARKERS.replace_all(&text, "");
    let text = RE_JOINING_UNDERSCORES.replace_all(&text, " ");
    RE_UNDERSCORES.replace_all(&text, "").into_owned()
}

pub fn expand_numbers(text: &str) -> String {
    let text = RE_DIGIT_GROUP.replace_all(text, "");
    let text = RE_PERCENT.replace_all(&text, |caps: &Captures| {
        format!("{} percent", number_to_words(&caps[1]))
    });
    RE_NUMBER
        .replace_all(&text, |caps: &Captures| number_to_words(&caps[0]))
        .into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    RE_SPACES.replace_all(text.trim(), " ").into_owned()
}

/// Run every pass in order.  Whitespace-only input yields `""`.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(&expand_numbers(&strip_markdown(text)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
