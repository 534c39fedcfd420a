//! Line-delimited JSON export of conversation logs.
//!
//! One object per turn with `role`, `content`, and `timestamp` (RFC 3339,
//! full sub-second precision). Blank lines are ignored on load.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use lulu_core::error::{LuluError, Result};
use lulu_core::types::Turn;

use crate::context::ConversationLog;

/// Write every turn of `log` to `writer`, one JSON object per line.
pub fn export_jsonl<W: Write>(log: &ConversationLog, mut writer: W) -> Result<()> {
    for turn in log.turns() {
        serde_json::to_writer(&mut writer, turn)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a log previously written by [`export_jsonl`].
pub fn load_jsonl<R: Read>(reader: R) -> Result<ConversationLog> {
    let mut turns = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let turn: Turn = serde_json::from_str(&line)
            .map_err(|e| LuluError::Export(format!("line {}: {}", idx + 1, e)))?;
        turns.push(turn);
    }
    Ok(ConversationLog::from(turns))
}

/// Export to a file, creating parent directories as needed.
pub fn export_to_file(log: &ConversationLog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    export_jsonl(log, BufWriter::new(file))
}

/// Load a log from a file written by [`export_to_file`].
pub fn load_from_file(path: &Path) -> Result<ConversationLog> {
    let file = File::open(path)?;
    load_jsonl(file)
}
