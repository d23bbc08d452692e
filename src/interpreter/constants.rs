// Constants for the script interpreter

/// Maximum number of nested function calls before the run is aborted
pub const MAX_CALL_DEPTH: usize = 1024;

/// Instructions executed per tick when neither config nor `[ipt]` say otherwise
pub const DEFAULT_INSTRUCTIONS_PER_TICK: usize = 1;

/// Global variable holding the most recent key delivered by the host
pub const LAST_KEY_GLOBAL: &str = "lastkey";
