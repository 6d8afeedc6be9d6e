use once_cell::sync::Lazy;
use regex::Regex;

/// Latin spelling of a lowercase Cyrillic letter. `None` leaves the character alone.
fn latin(c: char) -> Option<&'static str> {
    let s = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Ukrainian and Belarusian letters
        'і' => "i",
        'ї' => "yi",
        'є' => "ye",
        'ґ' => "g",
        'ў' => "u",
        _ => return None,
    };
    Some(s)
}

/// Replace Cyrillic letters with Latin ones. Upper-case Cyrillic comes out lower-case.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let mut lower = c.to_lowercase();
        if let (Some(l), None) = (lower.next(), lower.next())
            && let Some(s) = latin(l)
        {
            out.push_str(s);
        } else {
            out.push(c);
        }
    }
    out
}

/// Url-safe slug: transliterate, lowercase, keep `[a-z0-9 ]`, collapse spaces into hyphens.
pub fn slugify(text: &str) -> String {
    static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

    let kept: String = transliterate(text)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    SPACES.replace_all(kept.trim(), "-").into_owned()
}

/// Shareable key of a record: `<year>-<slug of title>`.
pub fn human_key(year: &str, title: &str) -> String {
    format!("{year}-{}", slugify(title))
}
