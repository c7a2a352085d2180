/// Protocol version carried in the first header byte.
pub const PROTO_VERSION: u8 = 1;

/// `[ver u8][type u8][reserved u16][body_len u32]`
pub const HEADER_LEN: usize = 8;

/// Maximum allowed body size for a frame (to avoid OOM).
pub const MAX_BODY_LEN: usize = 1_048_576; // 1 MiB
