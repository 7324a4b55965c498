//! On-disk note format.
//!
//! Each note file is a YAML front matter block followed by the raw body:
//!
//! ```text
//! ---
//! title: Groceries
//! date: Today at 09:15 AM
//! id: 1718000000000
//! isStatic: false
//! isPinned: false
//! ---
//! milk, eggs
//! ```
//!
//! The body is stored byte-for-byte after the closing delimiter. Files are
//! meant to be editable by hand, so the header reader accepts missing fields
//! and loosely typed scalars.

use serde::Serialize;
use serde_yaml::Value;

use crate::{display_timestamp, NotesError, Note, Result, DEFAULT_TITLE};

const DELIMITER: &str = "---";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Header<'a> {
    title: &'a str,
    date: &'a str,
    id: i64,
    is_static: bool,
    is_pinned: bool,
}

/// Renders a note as front matter plus body.
pub fn render_note_file(note: &Note) -> Result<String> {
    let header = serde_yaml::to_string(&Header {
        title: &note.title,
        date: &note.date,
        id: note.id,
        is_static: note.is_static,
        is_pinned: note.is_pinned,
    })?;

    let mut out = String::with_capacity(header.len() + note.content.len() + 8);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&header);
    if !header.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&note.content);
    Ok(out)
}

/// Parses a note file; `id` comes from the file name.
///
/// A file with no front matter at all is read as a content-only note.
pub fn parse_note_file(id: i64, raw: &str) -> Result<Note> {
    let Some((header, body)) = split_front_matter(raw)? else {
        return Ok(Note {
            id,
            title: DEFAULT_TITLE.to_string(),
            content: raw.to_string(),
            date: display_timestamp(),
            is_static: false,
            is_pinned: false,
        });
    };

    let meta: Value = if header.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(header)?
    };
    if !matches!(meta, Value::Mapping(_) | Value::Null) {
        return Err(NotesError::InvalidFormat {
            message: format!("front matter of note {} is not a mapping", id),
        });
    }

    Ok(Note {
        id,
        title: meta
            .get("title")
            .and_then(scalar_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        content: body.to_string(),
        date: meta
            .get("date")
            .and_then(scalar_text)
            .unwrap_or_else(display_timestamp),
        is_static: meta.get("isStatic").is_some_and(truthy),
        is_pinned: meta.get("isPinned").is_some_and(truthy),
    })
}

/// Splits `raw` into (header, body). `Ok(None)` when there is no opening delimiter.
fn split_front_matter(raw: &str) -> Result<Option<(&str, &str)>> {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Ok(Some((&rest[..offset], &rest[offset + line.len()..])));
        }
        offset += line.len();
    }

    Err(NotesError::InvalidFormat {
        message: "front matter is missing its closing delimiter".to_string(),
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(content: &str) -> Note {
        Note {
            id: 100,
            title: "A".to_string(),
            content: content.to_string(),
            date: "d1".to_string(),
            is_static: false,
            is_pinned: true,
        }
    }

    #[test]
    fn test_render_layout() {
        let rendered = render_note_file(&sample("hello")).unwrap();
        assert!(rendered.starts_with("---\ntitle: A\n"));
        assert!(rendered.contains("isPinned: true\n"));
        assert!(rendered.ends_with("---\nhello"));
    }

    #[test]
    fn test_round_trip_awkward_content() {
        for content in [
            "",
            "---",
            "---\nfake: header\n---\n",
            "line one\n---\nline two\n",
            "ünïcødé ✓ 日本語",
            "\n\nleading and trailing blank lines\n\n",
            "crlf\r\n---\r\nbody",
        ] {
            let note = sample(content);
            let parsed = parse_note_file(note.id, &render_note_file(&note).unwrap()).unwrap();
            assert_eq!(parsed, note, "content {:?}", content);
        }
    }

    #[test]
    fn test_round_trip_awkward_titles() {
        for title in ["---", "true", "123", "a: b", "multi\nline\n---\ntitle", " padded ", ""] {
            let mut note = sample("x");
            note.title = title.to_string();
            let parsed = parse_note_file(note.id, &render_note_file(&note).unwrap()).unwrap();
            assert_eq!(parsed.title, title);
        }
    }

    #[test]
    fn test_hand_written_file_with_missing_fields() {
        let raw = "---\ntitle: About Me\nisStatic: true\n---\n# Hi\n";
        let note = parse_note_file(1, raw).unwrap();
        assert_eq!(note.title, "About Me");
        assert_eq!(note.content, "# Hi\n");
        assert!(note.is_static);
        assert!(!note.is_pinned);
        assert!(!note.date.is_empty());
    }

    #[test]
    fn test_loose_scalars() {
        let raw = "---\ntitle: 2024\ndate: 2024-01-01\nisPinned: \"true\"\n---\nbody";
        let note = parse_note_file(3, raw).unwrap();
        assert_eq!(note.title, "2024");
        assert_eq!(note.date, "2024-01-01");
        assert!(note.is_pinned);
    }

    #[test]
    fn test_header_id_is_ignored() {
        let raw = "---\nid: 999\ntitle: t\n---\n";
        assert_eq!(parse_note_file(5, raw).unwrap().id, 5);
    }

    #[test]
    fn test_no_front_matter_is_content_only() {
        let note = parse_note_file(8, "just text").unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.content, "just text");
    }

    #[test]
    fn test_empty_header() {
        let note = parse_note_file(8, "---\n---\nbody").unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.content, "body");
    }

    #[test]
    fn test_unterminated_header_is_an_error() {
        assert!(matches!(
            parse_note_file(1, "---\ntitle: t\nno closing"),
            Err(NotesError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(parse_note_file(1, "---\ntitle: [unclosed\n---\nbody").is_err());
    }

    #[test]
    fn test_non_mapping_header_is_an_error() {
        assert!(matches!(
            parse_note_file(1, "---\n- a\n- b\n---\nbody"),
            Err(NotesError::InvalidFormat { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_render_then_parse_preserves_note(
            id in 1i64..i64::MAX,
            title in "\\PC*",
            date in "\\PC*",
            content in any::<String>(),
            is_static in any::<bool>(),
            is_pinned in any::<bool>(),
        ) {
            let note = Note { id, title, content, date, is_static, is_pinned };
            let parsed = parse_note_file(id, &render_note_file(&note).unwrap()).unwrap();
            prop_assert_eq!(parsed, note);
        }
    }
}
