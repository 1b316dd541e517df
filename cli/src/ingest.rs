//! A minimal line-oriented GEDCOM reader used only to drive the CLI's demo commands.
//!
//! This is deliberately not a real parser: no encoding detection, no schema validation, no
//! continuation-line (CONC/CONT) joining beyond treating them as ordinary child lines. It exists
//! to get record trees into [`gedcore::Database::ingest`] so the engine's own query/validate
//! machinery can be exercised end to end.

use std::path::Path;

use gedcore::{Database, ErrorLog, NodeId, RecordKey};
use miette::{Context, IntoDiagnostic};

struct RawLine {
    level: u32,
    key: Option<String>,
    tag: String,
    value: Option<String>,
    line_number: u32,
}

fn parse_line(text: &str, line_number: u32) -> Option<RawLine> {
    let text = text.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        return None;
    }
    let mut parts = text.splitn(2, ' ');
    let level: u32 = parts.next()?.trim().parse().ok()?;
    let rest = parts.next().unwrap_or_default();

    let (key, rest) = if rest.starts_with('@') {
        let mut fields = rest.splitn(2, ' ');
        let key = fields.next().unwrap_or_default().to_string();
        (Some(key), fields.next().unwrap_or_default())
    } else {
        (None, rest)
    };

    let mut fields = rest.splitn(2, ' ');
    let tag = fields.next().unwrap_or_default().to_string();
    let value = fields.next().map(str::to_string).filter(|v| !v.is_empty());

    Some(RawLine { level, key, tag, value, line_number })
}

/// Reads `path` as a sequence of GEDCOM-shaped lines, builds an arena tree keyed by indentation
/// level, and ingests every record root into `database`. Records with a duplicate key are logged
/// via [`Database::ingest_logged`] rather than aborting the read.
pub fn ingest_file(database: &mut Database, path: &Path, log: &mut ErrorLog) -> miette::Result<usize> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("reading {}", path.display()))?;

    let segment = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let mut stack: Vec<(u32, NodeId)> = Vec::new();
    let mut roots: Vec<(NodeId, u32)> = Vec::new();

    for (idx, raw_text) in text.lines().enumerate() {
        let line_number = idx as u32 + 1;
        let Some(raw) = parse_line(raw_text, line_number) else { continue };

        let key = raw.key.as_deref().map(RecordKey::new);
        let node = database.arena_mut().alloc(key, raw.tag.clone(), raw.value);

        while stack.last().is_some_and(|(level, _)| *level >= raw.level) {
            stack.pop();
        }

        match stack.last() {
            Some((_, parent)) => database.arena_mut().append_child(*parent, node),
            None => roots.push((node, line_number)),
        }
        stack.push((raw.level, node));
    }

    let mut count = 0;
    for (root, line_number) in roots {
        if database.arena().tag(root) == "HEAD" || database.arena().tag(root) == "TRLR" {
            continue;
        }
        if database.arena().key(root).is_some() {
            database.ingest_logged(root, segment.clone(), line_number, log);
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gedcore::DatabaseConfig;

    #[test]
    fn parses_level_key_tag_value() {
        let line = parse_line("1 NAME Tom /Wetmore/", 1).unwrap();
        assert_eq!(line.level, 1);
        assert_eq!(line.tag, "NAME");
        assert_eq!(line.value.as_deref(), Some("Tom /Wetmore/"));
        assert!(line.key.is_none());
    }

    #[test]
    fn parses_record_root_with_key() {
        let line = parse_line("0 @I1@ INDI", 1).unwrap();
        assert_eq!(line.level, 0);
        assert_eq!(line.key.as_deref(), Some("@I1@"));
        assert_eq!(line.tag, "INDI");
        assert!(line.value.is_none());
    }

    #[test]
    fn ingest_file_builds_nested_tree() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("gedcore-ingest-test-{}.ged", std::process::id()));
        std::fs::write(
            &path,
            "0 HEAD\n0 @I1@ INDI\n1 NAME Tom /Wetmore/\n1 SEX M\n0 TRLR\n",
        )
        .unwrap();

        let mut db = Database::new(DatabaseConfig::default());
        let mut log = ErrorLog::new();
        let count = ingest_file(&mut db, &path, &mut log).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(count, 1);
        assert!(log.is_empty());
        assert!(db.name_index().search("Tom /Wetmore/").contains(&RecordKey::new("@I1@")));
    }
}
