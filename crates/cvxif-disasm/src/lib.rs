pub mod asm;
pub mod model;

pub use asm::{assemble, parse_line, Item};
pub use model::{load_raw_bin, read_u32, Image};
