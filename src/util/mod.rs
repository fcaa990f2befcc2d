//! Text helpers for data that crosses a trust boundary.
//!
//! Site titles and addresses come straight from the upstream API and end up
//! on a terminal, so they are cleaned on the way in ([`clean_field`]) and
//! fitted to the column width on the way out ([`truncate_to_width`]).

mod text;

pub use text::{clean_field, display_width, strip_control_chars, truncate_to_width};
