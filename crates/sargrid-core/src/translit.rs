//! Ukrainian surname romanization for artifact filenames.
//!
//! Follows the official Ukrainian-to-Latin table (2010 cabinet resolution):
//! positional letters take their word-initial form at the start of a word,
//! the soft sign and apostrophe are dropped, and the combination "зг"
//! becomes "zgh" so it stays distinct from "ж" (zh). Anything outside the
//! Ukrainian alphabet passes through untouched.

use chrono::NaiveDate;

/// Transliterate Ukrainian Cyrillic text to Latin letters.
#[must_use]
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut word_initial = true;
    while let Some(c) = chars.next() {
        if matches!(c, 'з' | 'З') && matches!(chars.peek(), Some('г' | 'Г')) {
            chars.next();
            out.push_str(if c == 'З' { "Zgh" } else { "zgh" });
            word_initial = false;
            continue;
        }
        match romanize(c, word_initial) {
            Some(mapped) => out.push_str(mapped),
            None => out.push(c),
        }
        // The apostrophe separates letters inside a word, it does not start
        // a new one: м'я romanizes as "mia", not "mYa".
        word_initial = !(c.is_alphabetic() || is_apostrophe(c));
    }
    out
}

/// Build the canonical grid artifact filename: transliterated surname,
/// generation date, `.gpx` extension. The surname part keeps only ASCII
/// letters, digits, and hyphens; an empty result falls back to "unknown".
#[must_use]
pub fn grid_filename(surname: &str, date: NaiveDate) -> String {
    let safe: String = transliterate(surname.trim())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let stem = if safe.is_empty() {
        "unknown".to_string()
    } else {
        safe
    };
    format!("{stem}_{}.gpx", date.format("%Y-%m-%d"))
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{02BC}')
}

#[allow(clippy::too_many_lines)]
fn romanize(c: char, word_initial: bool) -> Option<&'static str> {
    let mapped = match c {
        'А' => "A",
        'а' => "a",
        'Б' => "B",
        'б' => "b",
        'В' => "V",
        'в' => "v",
        'Г' => "H",
        'г' => "h",
        'Ґ' => "G",
        'ґ' => "g",
        'Д' => "D",
        'д' => "d",
        'Е' => "E",
        'е' => "e",
        'Є' => {
            if word_initial {
                "Ye"
            } else {
                "ie"
            }
        }
        'є' => {
            if word_initial {
                "ye"
            } else {
                "ie"
            }
        }
        'Ж' => "Zh",
        'ж' => "zh",
        'З' => "Z",
        'з' => "z",
        'И' => "Y",
        'и' => "y",
        'І' => "I",
        'і' => "i",
        'Ї' => {
            if word_initial {
                "Yi"
            } else {
                "i"
            }
        }
        'ї' => {
            if word_initial {
                "yi"
            } else {
                "i"
            }
        }
        'Й' => {
            if word_initial {
                "Y"
            } else {
                "i"
            }
        }
        'й' => {
            if word_initial {
                "y"
            } else {
                "i"
            }
        }
        'К' => "K",
        'к' => "k",
        'Л' => "L",
        'л' => "l",
        'М' => "M",
        'м' => "m",
        'Н' => "N",
        'н' => "n",
        'О' => "O",
        'о' => "o",
        'П' => "P",
        'п' => "p",
        'Р' => "R",
        'р' => "r",
        'С' => "S",
        'с' => "s",
        'Т' => "T",
        'т' => "t",
        'У' => "U",
        'у' => "u",
        'Ф' => "F",
        'ф' => "f",
        'Х' => "Kh",
        'х' => "kh",
        'Ц' => "Ts",
        'ц' => "ts",
        'Ч' => "Ch",
        'ч' => "ch",
        'Ш' => "Sh",
        'ш' => "sh",
        'Щ' => "Shch",
        'щ' => "shch",
        'Ю' => {
            if word_initial {
                "Yu"
            } else {
                "iu"
            }
        }
        'ю' => {
            if word_initial {
                "yu"
            } else {
                "iu"
            }
        }
        'Я' => {
            if word_initial {
                "Ya"
            } else {
                "ia"
            }
        }
        'я' => {
            if word_initial {
                "ya"
            } else {
                "ia"
            }
        }
        'Ь' | 'ь' => "",
        c if is_apostrophe(c) => "",
        _ => return None,
    };
    Some(mapped)
}
