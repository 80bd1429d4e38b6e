//! Artifact parsing.
//!
//! Legacy (version 1) artifacts carry no escaping: a content line of the
//! form `--- name ---` is indistinguishable from a block header and splits
//! the block in two. This is kept for compatibility with existing artifacts.
//! Framed (version 2) artifacts state each payload's byte length in its
//! header and are parsed positionally, so payloads may contain any text.

use indexmap::IndexMap;
use tracing::debug;

use codectx_core::{ArtifactFormat, FormatError};

use crate::markers::{
    BLOCK_CLOSE, BLOCK_OPEN, CONTENTS_HEADER, CONTENTS_RULE, TREE_HEADER, TREE_RULE, VERSION_PREFIX,
};

/// The file list and contents recovered from an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArtifact {
    /// Layout the artifact was written in.
    pub format: ArtifactFormat,
    /// Paths of the tree section, in order.
    pub files: Vec<String>,
    /// Block payloads by path, in block order.
    pub contents: IndexMap<String, String>,
}

impl ParsedArtifact {
    /// Payload of a path, if a block exists for it.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }
}

/// Parse an artifact, detecting its format version.
pub fn read_artifact(text: &str) -> Result<ParsedArtifact, FormatError> {
    let Some(versioned) = text.strip_prefix(VERSION_PREFIX) else {
        return read_legacy(text);
    };

    let (version, body) = versioned.split_once('\n').unwrap_or((versioned, ""));
    let format = version
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(ArtifactFormat::from_version)
        .ok_or_else(|| FormatError::UnsupportedVersion {
            version: version.trim().to_string(),
        })?;

    match format {
        ArtifactFormat::Legacy => read_legacy(body),
        ArtifactFormat::Framed => read_framed(text, body),
    }
}

/// Parse the marker-delimited version 1 layout.
pub fn read_legacy(text: &str) -> Result<ParsedArtifact, FormatError> {
    let (_, after_tree) = text
        .split_once(TREE_HEADER)
        .ok_or(FormatError::MissingMarker {
            marker: "Directory Tree:",
        })?;
    let boundary = contents_boundary();
    let (tree, section) = after_tree
        .split_once(boundary.as_str())
        .ok_or(FormatError::MissingMarker {
            marker: "File Contents:",
        })?;

    let files = parse_tree(tree);
    let mut contents = IndexMap::new();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for line in section.split('\n') {
        if let Some(name) = legacy_block_name(line) {
            if let Some((name, lines)) = current.take() {
                contents.insert(name.to_string(), finish_block(&lines));
            }
            current = Some((name, Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((name, lines)) = current {
        contents.insert(name.to_string(), finish_block(&lines));
    }

    debug!(files = files.len(), blocks = contents.len(), "parsed legacy artifact");
    Ok(ParsedArtifact {
        format: ArtifactFormat::Legacy,
        files,
        contents,
    })
}

/// Parse the length-framed version 2 layout. `text` is the whole artifact,
/// used for error offsets; `body` follows the version line.
fn read_framed(text: &str, body: &str) -> Result<ParsedArtifact, FormatError> {
    let after_tree = body.strip_prefix(TREE_HEADER).ok_or(FormatError::MissingMarker {
        marker: "Directory Tree:",
    })?;
    let boundary = contents_boundary();
    let (tree, section) = after_tree
        .split_once(boundary.as_str())
        .ok_or(FormatError::MissingMarker {
            marker: "File Contents:",
        })?;
    let files = parse_tree(tree);

    let mut rest = section.strip_prefix(CONTENTS_RULE).ok_or(FormatError::MissingMarker {
        marker: "==============",
    })?;
    let mut contents = IndexMap::new();

    while !rest.is_empty() {
        let offset = text.len() - rest.len();
        let malformed = |header: &str| FormatError::MalformedBlock {
            offset,
            header: header.to_string(),
        };

        let block = rest.strip_prefix('\n').ok_or_else(|| malformed(first_line(rest)))?;
        let (header, after_header) = block.split_once('\n').ok_or_else(|| malformed(block))?;
        let (name, len) = framed_header(header).ok_or_else(|| malformed(header))?;

        let truncated = || FormatError::Truncated {
            path: name.to_string(),
            expected: len,
        };
        let payload = after_header.get(..len).ok_or_else(truncated)?;
        rest = after_header[len..].strip_prefix('\n').ok_or_else(truncated)?;

        contents.insert(name.to_string(), payload.to_string());
    }

    debug!(files = files.len(), blocks = contents.len(), "parsed framed artifact");
    Ok(ParsedArtifact {
        format: ArtifactFormat::Framed,
        files,
        contents,
    })
}

/// Blank line plus contents header. Tree lines are never empty, so this only
/// occurs at the real section boundary, even when a path is itself named
/// `File Contents:`.
fn contents_boundary() -> String {
    format!("\n\n{CONTENTS_HEADER}")
}

/// Non-blank tree lines, minus the underline.
fn parse_tree(section: &str) -> Vec<String> {
    let rule = TREE_RULE.trim_end();
    section
        .lines()
        .filter(|line| !line.trim().is_empty() && *line != rule)
        .map(str::to_string)
        .collect()
}

fn legacy_block_name(line: &str) -> Option<&str> {
    line.strip_prefix(BLOCK_OPEN)?.strip_suffix(BLOCK_CLOSE)
}

/// `--- <name> --- <len>`; the name is everything before the last ` --- `.
fn framed_header(line: &str) -> Option<(&str, usize)> {
    let inner = line.strip_prefix(BLOCK_OPEN)?;
    let (name, len) = inner.rsplit_once(" --- ")?;
    if name.is_empty() {
        return None;
    }
    Some((name, len.parse().ok()?))
}

/// Join block lines and drop the single `\n` that terminates every block.
fn finish_block(lines: &[&str]) -> String {
    let mut joined = lines.join("\n");
    if joined.ends_with('\n') {
        joined.pop();
    }
    joined
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}
