//! Dialogue scripts and speaker-tagged line parsing.

use serde::{Deserialize, Serialize};

/// One speaker-attributed utterance in a generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Speaker label as it appeared in the script
    pub speaker: String,
    /// Utterance text
    pub text: String,
}

/// A parsed dialogue script.
///
/// `lines` preserves the order of the completion reply. A script with no
/// speakable lines is still a valid deliverable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueScript {
    /// Ordered speakable lines
    pub lines: Vec<DialogueLine>,
    /// Raw completion reply the lines were parsed from
    pub raw_text: String,
    /// Trailing untagged line, when the reply ended with one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_remark: Option<String>,
}

impl DialogueScript {
    /// True when the script contains no speakable lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct speakers in first-appearance order.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for line in &self.lines {
            if !seen.contains(&line.speaker.as_str()) {
                seen.push(line.speaker.as_str());
            }
        }
        seen
    }
}

/// Parse a completion reply into an ordered dialogue script.
///
/// Each line matching `SPEAKER: text` (first colon splits, both halves
/// non-empty after trimming) becomes a [`DialogueLine`]. Non-matching lines
/// are dropped, except that a final untagged line following at least one
/// parsed line is kept as the script's closing remark.
pub fn parse_dialogue_response(response: &str) -> DialogueScript {
    let candidates: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut lines = Vec::new();
    let mut last_unmatched: Option<(usize, &str)> = None;

    for (idx, candidate) in candidates.iter().enumerate() {
        match parse_line(candidate) {
            Some(line) => lines.push(line),
            None => last_unmatched = Some((idx, candidate)),
        }
    }

    let closing_remark = match last_unmatched {
        Some((idx, text)) if !lines.is_empty() && idx == candidates.len() - 1 => {
            Some(text.to_string())
        }
        _ => None,
    };

    DialogueScript {
        lines,
        raw_text: response.to_string(),
        closing_remark,
    }
}

fn parse_line(line: &str) -> Option<DialogueLine> {
    let (speaker, text) = line.split_once(':')?;
    let speaker = speaker.trim();
    let text = text.trim();
    if speaker.is_empty() || text.is_empty() {
        return None;
    }
    Some(DialogueLine {
        speaker: speaker.to_string(),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_dialogue() {
        let script = parse_dialogue_response("Alice: Hi there\nBob: Hello!\n");
        assert_eq!(
            script.lines,
            vec![
                DialogueLine {
                    speaker: "Alice".into(),
                    text: "Hi there".into()
                },
                DialogueLine {
                    speaker: "Bob".into(),
                    text: "Hello!".into()
                },
            ]
        );
        assert!(script.closing_remark.is_none());
    }

    #[test]
    fn test_parse_preserves_order_and_repeats() {
        let script =
            parse_dialogue_response("Alice: one\nBob: two\nAlice: three\n");
        let speakers: Vec<_> = script.lines.iter().map(|l| l.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Alice", "Bob", "Alice"]);
        assert_eq!(script.speakers(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_parse_drops_untagged_lines() {
        let script = parse_dialogue_response(
            "Here is your script\nAlice: Hi\n\nJust some stage direction\nBob: Bye\n",
        );
        assert_eq!(script.lines.len(), 2);
        // The untagged line was not final, so no closing remark
        assert!(script.closing_remark.is_none());
    }

    #[test]
    fn test_parse_captures_closing_remark() {
        let script = parse_dialogue_response("Alice: Hi\nBob: Bye\nAnd they all laughed.\n");
        assert_eq!(script.lines.len(), 2);
        assert_eq!(
            script.closing_remark.as_deref(),
            Some("And they all laughed.")
        );
    }

    #[test]
    fn test_parse_empty_reply_is_valid() {
        let script = parse_dialogue_response("No dialogue could be written for this video.");
        assert!(script.is_empty());
        // No parsed line precedes it, so the text is not a closing remark
        assert!(script.closing_remark.is_none());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let script = parse_dialogue_response("  Alice :   spaced out   \n");
        assert_eq!(script.lines[0].speaker, "Alice");
        assert_eq!(script.lines[0].text, "spaced out");
    }

    #[test]
    fn test_parse_rejects_empty_halves() {
        let script = parse_dialogue_response(": no speaker\nAlice:\n");
        assert!(script.is_empty());
    }
}
