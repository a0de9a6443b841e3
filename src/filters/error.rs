//! Filter errors.
//!
//! User-input errors display as the reply sent back to the chat.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Usage: /filter <keyword> <reply>, or reply to a message with /filter <keyword>.")]
    MissingKeyword,

    #[error("You didn't specify what to reply with!")]
    MissingContent,

    #[error("There is no note message - You can't JUST have buttons, you need a message to go with it!")]
    ButtonsWithoutText,

    #[error("conflicting legacy content flags: {}", .0.join(", "))]
    ConflictingLegacyFlags(Vec<&'static str>),

    #[error("Invalid callback data.")]
    MalformedCallback,

    #[error("Invalid action.")]
    UnknownCallbackAction,
}
