//! Splits field text into terms

/// Trait for all tokenizers
///
/// Terms are handed to `sink` in the order they appear in the text
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str, sink: &mut dyn FnMut(&str));
}

/// Splits on whitespace and keeps tokens as they are
#[derive(Clone, Copy, Default, Debug)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str, sink: &mut dyn FnMut(&str)) {
        for word in text.split_whitespace() {
            sink(word)
        }
    }
}

/// Keeps maximal runs of ASCII letters, lower-cased
#[derive(Clone, Copy, Default, Debug)]
pub struct AlphabeticTokenizer;

impl Tokenizer for AlphabeticTokenizer {
    fn tokenize(&self, text: &str, sink: &mut dyn FnMut(&str)) {
        let mut word = String::new();
        for c in text.chars() {
            if c.is_ascii_alphabetic() {
                word.push(c.to_ascii_lowercase());
            } else if !word.is_empty() {
                sink(&word);
                word.clear();
            }
        }
        if !word.is_empty() {
            sink(&word);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(tokenizer: &dyn Tokenizer, text: &str) -> Vec<String> {
        let mut terms = Vec::new();
        tokenizer.tokenize(text, &mut |t| terms.push(t.to_string()));
        terms
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(
            collect(&WhitespaceTokenizer, "  The cat\tsat.\n"),
            vec!["The", "cat", "sat."]
        );
        assert!(collect(&WhitespaceTokenizer, "   ").is_empty());
    }

    #[test]
    fn test_alphabetic() {
        assert_eq!(
            collect(&AlphabeticTokenizer, "Don't stop-words, 42 X"),
            vec!["don", "t", "stop", "words", "x"]
        );
    }
}
