/// Which script a query is written in, as far as routing cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    NonLatin,
}

/// One user query, created per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub original: String,
    pub script: Script,
    pub normalized: String,
}

impl Query {
    pub fn new(input: &str) -> Self {
        let original = input.trim().to_string();
        let script = detect_script(&original);
        let normalized = normalize(&original);
        Self {
            original,
            script,
            normalized,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// A bare 6-digit local exchange code, e.g. `005930`.
    pub fn local_code(&self) -> Option<&str> {
        let t = self.original.as_str();
        (t.len() == 6 && t.bytes().all(|b| b.is_ascii_digit())).then_some(t)
    }
}

/// Trim, punctuation to spaces, collapse whitespace, lowercase.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn detect_script(text: &str) -> Script {
    if text.chars().any(|c| c.is_alphabetic() && !is_latin(c)) {
        Script::NonLatin
    } else {
        Script::Latin
    }
}

fn is_latin(c: char) -> bool {
    matches!(c as u32,
        0x0000..=0x007F   // ASCII
        | 0x00C0..=0x024F // Latin-1 letters, Extended-A/B
        | 0x1E00..=0x1EFF // Latin Extended Additional
    )
}
