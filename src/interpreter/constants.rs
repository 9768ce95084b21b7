// Constants for the template engine

/// Mime type a context reports until a template calls `@setMimeType`
pub const DEFAULT_MIME_TYPE: &str = "text/html";

/// Default memory budget for a recorded execution trace (256 MiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;

/// Increment used by loops that give no step
pub const DEFAULT_LOOP_STEP: i32 = 1;
