/// An ordered sequence of lines obtained by wrapping a block of text, each line being at most
/// as long (in characters) as the length the block was wrapped with, except for single words
/// longer than that, which are never split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedBlock {
    lines: Vec<String>,
}

impl WrappedBlock {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a WrappedBlock {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Greedily wraps the words of `text` into lines of at most `maximum_length` characters.
///
/// Words are accumulated into the current line, each followed by a single space, for as long as
/// the current line plus the next word still fits; otherwise the current line is flushed with its
/// trailing whitespace trimmed and the word starts a new one. The length is a character count and
/// not a measured width, which is fine for the form because every wrapped section uses a single
/// font and size.
pub fn wrap_text(text: &str, maximum_length: usize) -> WrappedBlock {
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_length = word.chars().count();
        if current_length + word_length <= maximum_length {
            current_line.push_str(word);
            current_line.push(' ');
            current_length += word_length + 1;
        } else {
            if !current_line.is_empty() {
                lines.push(current_line.trim_end().to_string());
            }
            current_line = format!("{word} ");
            current_length = word_length + 1;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.trim_end().to_string());
    }

    WrappedBlock { lines }
}
