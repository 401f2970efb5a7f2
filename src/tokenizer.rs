//! Splits a command line into words.
//!
//! Words are separated by whitespace. A word that begins with `"` extends to
//! the next unescaped `"` and may contain whitespace; inside it, `\"` and `\\`
//! stand for `"` and `\`. The surrounding quotes are removed. Quotes that do
//! not start a word are ordinary characters.

use std::iter::Peekable;
use std::str::Chars;

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// Splits `line` into words. Never fails: an unterminated quote runs to the
/// end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut chars = line.chars().peekable();
    let mut words = Vec::new();

    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }

        match chars.peek() {
            None => break,
            Some(&QUOTE) => {
                chars.next();
                words.push(quoted_word(&mut chars));
            }
            Some(_) => words.push(bare_word(&mut chars)),
        }
    }

    words
}

fn quoted_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(c) = chars.next() {
        match c {
            QUOTE => break,
            ESCAPE => match chars.next() {
                Some(escaped) => word.push(escaped),
                None => break,
            },
            _ => word.push(c),
        }
    }
    word
}

fn bare_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t  ").is_empty());
    }

    #[test]
    fn test_whitespace_separated_words() {
        assert_eq!(tokenize("  x   y "), vec!["x", "y"]);
        assert_eq!(tokenize("echo\thello world"), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn test_quoted_word_is_one_token() {
        assert_eq!(tokenize(r#""a b" c"#), vec!["a b", "c"]);
        assert_eq!(
            tokenize(r#"echo "hello   world""#),
            vec!["echo", "hello   world"]
        );
    }

    #[test]
    fn test_escapes_inside_quotes() {
        assert_eq!(tokenize(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(tokenize(r#""back\\slash""#), vec![r"back\slash"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_word() {
        assert_eq!(tokenize(r#"printf """#), vec!["printf", ""]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#"echo "a b"#), vec!["echo", "a b"]);
    }

    #[test]
    fn test_word_ends_at_closing_quote() {
        assert_eq!(tokenize(r#""a"b"#), vec!["a", "b"]);
    }

    #[test]
    fn test_quote_inside_bare_word_is_literal() {
        assert_eq!(tokenize(r#"a"b c""#), vec![r#"a"b"#, r#"c""#]);
    }

    #[test]
    fn test_comment_marker_is_a_word() {
        assert_eq!(tokenize("# echo skipped"), vec!["#", "echo", "skipped"]);
    }
}
