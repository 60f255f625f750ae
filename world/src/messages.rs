//! Bounded log of player-facing messages.

use std::collections::VecDeque;

/// Presentation hint attached to each line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageTone {
    /// Ordinary narration.
    #[default]
    Plain,
    /// Harm befalling the player.
    Danger,
    /// Lore revealed by description zones.
    Lore,
    /// Melee exchanges between other creatures.
    Combat,
}

/// A single wrapped line of the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Text of the line.
    pub text: String,
    /// Presentation hint.
    pub tone: MessageTone,
}

/// Insertion-ordered queue holding the most recent wrapped lines.
#[derive(Clone, Debug)]
pub struct MessageLog {
    capacity: usize,
    wrap_width: usize,
    lines: VecDeque<LogLine>,
}

impl MessageLog {
    /// Creates an empty log keeping `capacity` lines wrapped near `wrap_width` characters.
    #[must_use]
    pub fn new(capacity: usize, wrap_width: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            wrap_width: wrap_width.max(1),
            lines: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends plain narration.
    pub fn add(&mut self, text: impl AsRef<str>) {
        self.add_toned(text, MessageTone::Plain);
    }

    /// Appends a message, wrapping it and capitalizing the first letter of each line.
    ///
    /// A line is broken at the first space after it grows past the wrap width.
    pub fn add_toned(&mut self, text: impl AsRef<str>, tone: MessageTone) {
        let mut line = String::new();
        let mut count = 0;

        for ch in text.as_ref().chars() {
            if count == 0 {
                line.extend(ch.to_uppercase());
            } else {
                line.push(ch);
            }
            count += 1;

            if ch == ' ' && count > self.wrap_width {
                self.push(std::mem::take(&mut line), tone);
                count = 0;
            }
        }

        if !line.is_empty() {
            self.push(line, tone);
        }
    }

    fn push(&mut self, text: String, tone: MessageTone) {
        self.lines.push_back(LogLine { text, tone });
        while self.lines.len() > self.capacity {
            let _ = self.lines.pop_front();
        }
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// Most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&LogLine> {
        self.lines.back()
    }

    /// Number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Reports whether no line has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
