//! Store key layout.
//!
//! Every persisted fact is a flat key of the form `ctf:<fact>(<args>)`.
//! Arguments are passed through as-is; the store lower-cases and
//! underscore-normalizes the whole key.

use crate::colour::TeamColour;
use crate::types::PlayerId;

/// Namespace prefix shared by all keys.
pub const NAMESPACE: &str = "ctf";

/// Whether flags have been deployed for the current event.
#[must_use]
pub fn flags_prepared() -> String {
    format!("{NAMESPACE}:flags_prepared")
}

/// Whether capturing is enabled.
#[must_use]
pub fn flags_active() -> String {
    format!("{NAMESPACE}:flags_active")
}

/// Where the flag was deployed this event (position).
#[must_use]
pub fn flag_home(colour: TeamColour) -> String {
    format!("{NAMESPACE}:flag_home({})", colour.internal_name())
}

/// Where the flag currently sits (position).
#[must_use]
pub fn flag_position(colour: TeamColour) -> String {
    format!("{NAMESPACE}:flag_position({})", colour.internal_name())
}

/// World holding the flag's current position.
#[must_use]
pub fn flag_dimension(colour: TeamColour) -> String {
    format!("{NAMESPACE}:flag_dimension({})", colour.internal_name())
}

/// Whether a physical marker currently represents the flag.
#[must_use]
pub fn flag_in_world(colour: TeamColour) -> String {
    format!("{NAMESPACE}:flag_in_world({})", colour.internal_name())
}

/// Whether the player is carrying a flag.
#[must_use]
pub fn has_flag(player: &PlayerId) -> String {
    format!("{NAMESPACE}:has_flag({player})")
}

/// Common prefix of every [`has_flag`] key.
#[must_use]
pub fn has_flag_prefix() -> String {
    format!("{NAMESPACE}:has_flag(")
}

/// Colour of the flag the player carries (enum).
#[must_use]
pub fn held_flag(player: &PlayerId) -> String {
    format!("{NAMESPACE}:held_flag({player})")
}

/// Times `capturing` has captured `captured`'s flag this event.
#[must_use]
pub fn num_captures(capturing: TeamColour, captured: TeamColour) -> String {
    format!(
        "{NAMESPACE}:num_captures({},{})",
        capturing.internal_name(),
        captured.internal_name()
    )
}
