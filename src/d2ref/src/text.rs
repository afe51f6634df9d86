//! Text cleanup for localized strings
//!
//! Localization values carry a small HTML-like markup (`<b>`, `<font
//! color='#...'>`, `<br>`) plus doubled percent signs from the tooltip
//! formatter. [`clean_markup`] turns them into plain display text and is the
//! usual [`Transform`](crate::localisation::Transform) for the builder.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<br>`, `<br/>`, `<br />`, `</br>` in any case
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?br\s*/?>").expect("line break pattern"));

/// An opening, closing or self-closing tag whose name follows `<` directly,
/// so comparison text like "HP < 50 and armor > 10" is left alone
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(?:\s+[^<>]*)?\s*/?>").expect("tag pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Markup → plain display text
pub fn clean_markup(raw: &str) -> String {
    let text = LINE_BREAK.replace_all(raw, "\n");
    let text = TAG.replace_all(&text, "");
    let text = text.replace("\\n", "\n").replace("%%", "%");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&nbsp;", " "),
        ("&#39;", "'"),
        // Last so "&amp;lt;" decodes to "&lt;" and not "<"
        ("&amp;", "&"),
    ];

    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_breaks_lines() {
        assert_eq!(
            clean_markup("<b>Mana Cost</b> reduced<br>from 100 to 90"),
            "Mana Cost reduced\nfrom 100 to 90"
        );
        assert_eq!(
            clean_markup("<font color='#e03e2e'>Cooldown</font>: 12<BR/>Range"),
            "Cooldown: 12\nRange"
        );
    }

    #[test]
    fn test_percent_and_escaped_newlines() {
        assert_eq!(clean_markup("Increases damage by 25%%"), "Increases damage by 25%");
        assert_eq!(clean_markup("line one\\nline two  "), "line one\nline two");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(clean_markup("Below < 50% health"), "Below < 50% health");
        assert_eq!(clean_markup("More damage when > 3 units"), "More damage when > 3 units");
    }

    #[test]
    fn test_comparison_text_survives() {
        assert_eq!(
            clean_markup("Bonus applies when HP < 50%% and armor > 10"),
            "Bonus applies when HP < 50% and armor > 10"
        );
        assert_eq!(clean_markup("a < b and c > d"), "a < b and c > d");
        assert_eq!(clean_markup("<b>Bonus</b> when HP < 50%"), "Bonus when HP < 50%");
    }

    #[test]
    fn test_spaced_and_closing_breaks() {
        assert_eq!(clean_markup("one<br />two</br>three"), "one\ntwo\nthree");
        assert_eq!(clean_markup("<span class=\"x\"/>kept"), "kept");
    }

    #[test]
    fn test_entities() {
        assert_eq!(clean_markup("Salt &amp; Pepper &lt;3"), "Salt & Pepper <3");
        assert_eq!(clean_markup("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n b\t\tc "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }
}
