//! Literal markers of the artifact layout.

/// Optional first line of a versioned artifact, followed by the version.
pub const VERSION_PREFIX: &str = "Snapshot-Format: ";

/// Opens the tree section.
pub const TREE_HEADER: &str = "Directory Tree:\n";

/// Underline of the tree header.
pub const TREE_RULE: &str = "===============\n";

/// Opens the contents section.
pub const CONTENTS_HEADER: &str = "File Contents:\n";

/// Underline of the contents header.
pub const CONTENTS_RULE: &str = "==============\n";

/// Start of a block header line.
pub const BLOCK_OPEN: &str = "--- ";

/// End of a legacy block header line (and separator before a framed length).
pub const BLOCK_CLOSE: &str = " ---";

/// Payload written in place of a binary file.
pub const BINARY_SENTINEL: &str = "[Binary file, content not displayed]";

/// Prefix of the payload written when a text file cannot be read.
pub const READ_ERROR_PREFIX: &str = "Error reading file: ";
