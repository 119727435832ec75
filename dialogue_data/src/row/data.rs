//! Row sub-entries and their display timing.

use serde::{Deserialize, Serialize};

/// How long a sub-entry stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDurationMode {
    /// Exactly `duration` seconds.
    #[default]
    Fixed,
    /// Sound length plus `duration` seconds.
    AddToSound,
    /// Sound length; `duration` when there is no sound.
    Sound,
    /// Reading time of the text, never shorter than `duration`.
    FromText,
}

/// Voice-over attached to a sub-entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSound {
    pub path: String,
    /// Length in seconds.
    pub duration: f32,
}

/// A single sub-entry of a [`DialogueRow`](super::DialogueRow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRowData {
    pub text: String,
    #[serde(default)]
    pub sound: Option<RowSound>,
    #[serde(default)]
    pub duration_mode: RowDurationMode,
    /// Seconds; interpreted according to `duration_mode`.
    #[serde(default)]
    pub duration: f32,
}

impl DialogueRowData {
    /// Create a sub-entry with fixed zero duration.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sound: None,
            duration_mode: RowDurationMode::Fixed,
            duration: 0.0,
        }
    }

    pub fn with_sound(mut self, path: impl Into<String>, duration: f32) -> Self {
        self.sound = Some(RowSound {
            path: path.into(),
            duration: duration.max(0.0),
        });
        self
    }

    pub fn with_duration(mut self, mode: RowDurationMode, duration: f32) -> Self {
        self.duration_mode = mode;
        self.duration = duration.max(0.0);
        self
    }

    /// Seconds this sub-entry should be displayed.
    ///
    /// `chars_per_second` is only used by [`RowDurationMode::FromText`].
    pub fn effective_duration(&self, chars_per_second: f32) -> f32 {
        let sound = self.sound.as_ref().map(|s| s.duration);
        match self.duration_mode {
            RowDurationMode::Fixed => self.duration,
            RowDurationMode::AddToSound => sound.unwrap_or(0.0) + self.duration,
            RowDurationMode::Sound => sound.unwrap_or(self.duration),
            RowDurationMode::FromText => {
                if chars_per_second <= 0.0 {
                    return self.duration;
                }
                let reading = self.text.chars().count() as f32 / chars_per_second;
                reading.max(self.duration)
            }
        }
    }
}
