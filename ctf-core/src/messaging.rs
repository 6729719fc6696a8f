//! Chat formatting over the host's broadcast channel.
//!
//! Text between each pair of `&` delimiters is drawn in the next colour
//! argument; everything else uses the default colour. The delimiters are not
//! shown.
//!
//! ```
//! # use ctf_core::colour::TeamColour;
//! # use ctf_core::messaging::format;
//! let msg = format("&alice& has picked up the &Blue Flag&.",
//!                  &[TeamColour::Red, TeamColour::Blue], TeamColour::Yellow);
//! assert_eq!(msg.plain(), "alice has picked up the Blue Flag.");
//! assert_eq!(msg.segments[0].colour, TeamColour::Red);
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::colour::TeamColour;
use crate::types::{PlayerId, TeamId};

/// Marks the start and end of a coloured run.
pub const DELIMITER: char = '&';

/// A run of text in one colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Colour of the run.
    pub colour: TeamColour,
    /// The text.
    pub text: String,
}

/// A formatted chat line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessage {
    /// Coloured runs, in order. Empty runs are dropped.
    pub segments: Vec<Segment>,
}

impl ChatMessage {
    /// The text without colours.
    #[must_use]
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(&segment.text)?;
        }
        Ok(())
    }
}

/// Split `raw` on [`DELIMITER`] and colour alternate runs.
///
/// Supplying fewer colours than delimiter pairs is a caller bug; the extra
/// runs fall back to `default` and a warning is logged.
#[must_use]
pub fn format(raw: &str, colours: &[TeamColour], default: TeamColour) -> ChatMessage {
    let mut segments = Vec::new();
    for (i, part) in raw.split(DELIMITER).enumerate() {
        let colour = if i % 2 == 0 {
            default
        } else if let Some(&colour) = colours.get(i / 2) {
            colour
        } else {
            warn!(message = raw, supplied = colours.len(), "Missing colour for delimited run");
            default
        };
        if !part.is_empty() {
            segments.push(Segment {
                colour,
                text: part.to_string(),
            });
        }
    }
    ChatMessage { segments }
}

/// Delivery of formatted messages, implemented by the host.
pub trait Broadcaster: Send + Sync {
    /// Send to one player.
    fn tell(&self, player: &PlayerId, message: &ChatMessage);
    /// Send to every member of a team.
    fn tell_team(&self, team: &TeamId, message: &ChatMessage);
    /// Send to everyone online.
    fn announce(&self, message: &ChatMessage);
}

/// Formats and forwards messages to a [`Broadcaster`].
#[derive(Clone)]
pub struct Messenger {
    sink: Arc<dyn Broadcaster>,
    default_colour: TeamColour,
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("default_colour", &self.default_colour)
            .finish_non_exhaustive()
    }
}

impl Messenger {
    /// Wrap a broadcaster; plain text is drawn in yellow.
    #[must_use]
    pub fn new(sink: Arc<dyn Broadcaster>) -> Self {
        Self {
            sink,
            default_colour: TeamColour::Yellow,
        }
    }

    /// Send a message to one player.
    pub fn tell(&self, player: &PlayerId, raw: &str, colours: &[TeamColour]) {
        self.sink.tell(player, &format(raw, colours, self.default_colour));
    }

    /// Send a message to a whole team.
    pub fn tell_team(&self, team: &TeamId, raw: &str, colours: &[TeamColour]) {
        self.sink.tell_team(team, &format(raw, colours, self.default_colour));
    }

    /// Send a message to everyone.
    pub fn announce(&self, raw: &str, colours: &[TeamColour]) {
        self.sink.announce(&format(raw, colours, self.default_colour));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_uses_default_colour() {
        let msg = format("Capture the Flag has begun.", &[], TeamColour::Yellow);
        assert_eq!(msg.segments.len(), 1);
        assert_eq!(msg.segments[0].colour, TeamColour::Yellow);
    }

    #[test]
    fn colours_consumed_positionally() {
        let msg = format(
            "The &Red Flag& has been returned to &[X:1, Y:2, Z:3]&.",
            &[TeamColour::Red, TeamColour::Cyan],
            TeamColour::Yellow,
        );
        let colours: Vec<_> = msg.segments.iter().map(|s| s.colour).collect();
        assert_eq!(
            colours,
            vec![
                TeamColour::Yellow,
                TeamColour::Red,
                TeamColour::Yellow,
                TeamColour::Cyan,
                TeamColour::Yellow
            ]
        );
        assert_eq!(msg.plain(), "The Red Flag has been returned to [X:1, Y:2, Z:3].");
    }

    #[test]
    fn missing_colours_fall_back_to_default() {
        let msg = format("&a& and &b&", &[TeamColour::Red], TeamColour::Yellow);
        assert_eq!(msg.segments[0].colour, TeamColour::Red);
        assert_eq!(msg.segments[2].colour, TeamColour::Yellow);
        assert_eq!(msg.to_string(), "a and b");
    }
}
