//! util: общие строковые хелперы.
//!
//! Содержит:
//! - same_name(): сравнение имён без учёта регистра (и пробелов по краям).
//! - title_case(): нормализация введённого имени ("ana-marija o'neil" -> "Ana-Marija O'Neil").
//! - fold_for_search(): lower-case + снятие диакритики (č ć đ š ž) для поиска.

/// Case-insensitive comparison of two name parts, ignoring surrounding whitespace.
#[inline]
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Lower-case everything, then capitalize each word and each segment
/// separated by `-` or `'`. Runs of whitespace collapse to one space.
pub fn title_case(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    for (i, word) in lower.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut at_start = true;
        for c in word.chars() {
            if c == '-' || c == '\'' {
                out.push(c);
                at_start = true;
            } else if at_start {
                out.extend(c.to_uppercase());
                at_start = false;
            } else {
                out.push(c);
            }
        }
    }
    out
}

/// Lower-case and strip the diacritics of the local alphabet.
pub fn fold_for_search(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'č' | 'ć' => 'c',
            'š' => 's',
            'ž' => 'z',
            'đ' => 'd',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_handles_compound_names() {
        assert_eq!(title_case("  ana-marija   o'neil "), "Ana-Marija O'Neil");
        assert_eq!(title_case("ŠEMSA"), "Šemsa");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn same_name_ignores_case_and_padding() {
        assert!(same_name("Ćazim", " ćAZIM "));
        assert!(!same_name("Ana", "Ena"));
    }

    #[test]
    fn fold_for_search_strips_local_diacritics() {
        assert_eq!(fold_for_search("Čačak Đurđevac Šiško Žepče"), "cacak durdevac sisko zepce");
    }
}
