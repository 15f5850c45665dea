//! Tagged-chunk container format.
//!
//! Every binary resource starts with the same header and chunk table.
//!
//! ## File Structure
//!
//! ```text
//! +------------------------+
//! | Magic                  |  4 bytes
//! +------------------------+
//! | Header size (table at) |  4 bytes (u32 BE)
//! +------------------------+
//! | ...                    |
//! +------------------------+
//! | Chunk count            |  2 bytes (u16 BE) at offset 16
//! +------------------------+
//! | Chunk table            |  count x 24 bytes:
//! |   tag                  |    8 bytes (u64 BE)
//! |   offset               |    4 bytes (u32 BE)
//! |   size                 |    4 bytes (u32 BE)
//! |   reserved             |    8 bytes
//! +------------------------+
//! | ... payloads ...       |
//! +------------------------+
//! ```

mod directory;
mod format;

pub use directory::*;
pub use format::*;
