use serde::{Deserialize, Serialize};

use super::usx::{escape_attr, escape_text};

/// A run of text sharing one inline character style (`<char style="..">`).
/// Runs without a style are plain paragraph text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharData {
    pub text: String,
    pub style: Option<String>,
}

impl CharData {
    pub fn plain(text: impl Into<String>) -> Self {
        CharData {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: &str) -> Self {
        CharData {
            text: text.into(),
            style: Some(style.to_string()),
        }
    }

    /// Two runs can be merged into one without losing information.
    pub fn can_merge(&self, other: &CharData) -> bool {
        self.style == other.style
    }

    pub fn to_usx(&self) -> String {
        match &self.style {
            None => escape_text(&self.text),
            Some(style) => format!(
                "<char style=\"{}\">{}</char>",
                escape_attr(style),
                escape_text(&self.text)
            ),
        }
    }
}

/// Appends `run` to `runs`, merging it into the last run when the styles
/// match. Empty runs are dropped.
pub fn push_run(runs: &mut Vec<CharData>, run: CharData) {
    if run.text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.can_merge(&run) => last.text.push_str(&run.text),
        _ => runs.push(run),
    }
}

/// Concatenates two run sequences, merging the boundary runs if they share
/// a style.
pub fn concat(a: &[CharData], b: &[CharData]) -> Vec<CharData> {
    coalesce(a.iter().chain(b.iter()).cloned())
}

/// Collapses consecutive same-style runs.
pub fn coalesce(runs: impl IntoIterator<Item = CharData>) -> Vec<CharData> {
    let mut out = Vec::new();
    for run in runs {
        push_run(&mut out, run);
    }
    out
}

pub fn text_of(runs: &[CharData]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce_preserves_text() {
        let a = vec![CharData::plain("In the "), CharData::plain("beginning")];
        let b = vec![CharData::plain(" God "), CharData::styled("created", "wj")];

        let merged = concat(&a, &b);

        assert_eq!(text_of(&merged), format!("{}{}", text_of(&a), text_of(&b)));
        assert_eq!(
            merged,
            vec![
                CharData::plain("In the beginning God "),
                CharData::styled("created", "wj"),
            ]
        );
    }

    #[test]
    fn test_concat_is_associative() {
        let a = vec![CharData::styled("a", "nd")];
        let b = vec![CharData::styled("b", "nd"), CharData::plain("c")];
        let c = vec![CharData::plain("d"), CharData::styled("e", "wj")];

        let left = concat(&concat(&a, &b), &c);
        let right = concat(&a, &concat(&b, &c));

        assert_eq!(left, right);
    }

    #[test]
    fn test_empty_runs_are_dropped() {
        let runs = coalesce(vec![CharData::plain(""), CharData::styled("x", "bd")]);
        assert_eq!(runs, vec![CharData::styled("x", "bd")]);
    }

    #[test]
    fn test_to_usx_escapes_text() {
        assert_eq!(CharData::plain("a < b & c").to_usx(), "a &lt; b &amp; c");
        assert_eq!(
            CharData::styled("LORD", "nd").to_usx(),
            "<char style=\"nd\">LORD</char>"
        );
    }
}
