//! Low-level I/O helpers: bounded file reads and UTF-8-safe boundary
//! arithmetic, shared by the descriptor builder and the strategy family.

pub mod reader;
pub mod unicode;

pub use reader::FileReader;
pub use unicode::{find_char_boundary, find_char_boundary_forward, lines_with_offsets};
