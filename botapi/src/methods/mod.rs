//! Endpoint wrappers.
//!
//! Each wrapper only builds the method's parameters and decodes its result; everything else goes
//! through [`Bot::raw`](crate::Bot::raw) or [`Bot::send_files`](crate::Bot::send_files).

mod messages;
mod stickers;

pub use messages::{MediaKind, SendOptions};
pub use stickers::NewSticker;
