//! Turns operator-typed location strings into concrete [`Location`]s.
//!
//! Grammar: `[<file-ref>][:<line>][:<col>]`. Bare `12:4` means line 12,
//! column 4 (not file "12"); leading text with a path separator or a `.` is
//! a file reference resolved through the loaded-script registry; leading
//! text with no digits anywhere in the input is a symbolic reference, which
//! is not supported. With no leading text the current paused location fills
//! in the file.

use crate::error::{Error, Result};
use crate::location::Location;
use crate::session::DebugSession;

/// A parsed but not yet resolved location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSpec {
    /// The engine's current paused location, untouched.
    Current,
    /// A line (and optional column) in the current file.
    Line { line: u32, col: u32 },
    /// A line in a file reference still to be resolved.
    File { file: String, line: u32, col: u32 },
}

/// Parses the location grammar. Pure; resolution against the registry
/// happens in [`resolve`].
pub fn parse_location(src: &str) -> Result<LocationSpec> {
    let src = src.trim();
    if src.is_empty() {
        return Ok(LocationSpec::Current);
    }

    let parse_err = |reason: &str| Error::Parse {
        input: src.to_string(),
        reason: reason.to_string(),
    };

    // Split off at most two trailing all-digit groups; whatever is left
    // (rejoined on ':') is the leading text. Rejoining keeps Windows drive
    // letters like `C:\x\y.js` intact.
    let parts: Vec<&str> = src.split(':').collect();
    let is_numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let mut tail = Vec::new();
    let mut head_len = parts.len();
    while head_len > 0 && tail.len() < 2 && is_numeric(parts[head_len - 1]) {
        tail.push(parts[head_len - 1]);
        head_len -= 1;
    }
    tail.reverse();
    let head = parts[..head_len].join(":");
    let head = head.trim_end_matches(':').trim();

    let parse_num = |s: &str| -> Result<u32> {
        s.parse::<u32>()
            .map_err(|_| parse_err(&format!("'{s}' is not a valid line/column number")))
    };

    let file_like = head.contains('/') || head.contains('\\') || head.contains('.');

    match (head.is_empty(), tail.as_slice()) {
        // Pure numbers: `12` or `12:4`.
        (true, [line]) => Ok(LocationSpec::Line {
            line: parse_num(line)?,
            col: 0,
        }),
        (true, [line, col]) => Ok(LocationSpec::Line {
            line: parse_num(line)?,
            col: parse_num(col)?,
        }),
        (true, []) => Ok(LocationSpec::Current),
        (false, []) => {
            if file_like {
                // A file with no line breaks at its first line.
                Ok(LocationSpec::File {
                    file: head.to_string(),
                    line: 1,
                    col: 0,
                })
            } else if !src.bytes().any(|b| b.is_ascii_digit()) {
                // Symbolic reference (function/label).
                Err(Error::UnsupportedLocationKind(src.to_string()))
            } else {
                Err(parse_err("expected <file>:<line> or <line>[:<col>]"))
            }
        }
        (false, [n]) if !file_like => {
            // One trailing numeric group and a bare leading token: both are
            // numbers, so `12:4` is line 12 column 4, not file "12".
            Ok(LocationSpec::Line {
                line: parse_num(head)?,
                col: parse_num(n)?,
            })
        }
        (false, [line]) => Ok(LocationSpec::File {
            file: head.to_string(),
            line: parse_num(line)?,
            col: 0,
        }),
        (false, [line, col]) if file_like => Ok(LocationSpec::File {
            file: head.to_string(),
            line: parse_num(line)?,
            col: parse_num(col)?,
        }),
        (false, [_, _]) => Err(parse_err("expected <file>:<line>[:<col>]")),
        _ => Err(parse_err("expected [<file>][:<line>][:<col>]")),
    }
}

/// Resolves a parsed spec against the session: file references must match
/// exactly one loaded script (zero or several is `AmbiguousLocation` — we
/// refuse to guess); specs without a file use the current paused location.
pub fn resolve(spec: &LocationSpec, session: &mut DebugSession) -> Result<Location> {
    match spec {
        LocationSpec::Current => session
            .current_location()?
            .ok_or(Error::NoCurrentLocation),
        LocationSpec::Line { line, col } => {
            let current = session
                .current_location()?
                .ok_or(Error::NoCurrentLocation)?;
            Ok(Location::new(current.source_url, *line, Some(*col)))
        }
        LocationSpec::File { file, line, col } => {
            let candidates = session.find_loaded_file(file)?;
            if candidates.len() != 1 {
                return Err(Error::AmbiguousLocation {
                    query: file.clone(),
                    candidates,
                });
            }
            Ok(Location::new(candidates[0].clone(), *line, Some(*col)))
        }
    }
}

/// Parses and resolves in one step.
pub fn parse_and_resolve(src: &str, session: &mut DebugSession) -> Result<Location> {
    let spec = parse_location(src)?;
    resolve(&spec, session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_column_parse_as_given() {
        assert_eq!(
            parse_location("12:4").unwrap(),
            LocationSpec::Line { line: 12, col: 4 }
        );
        assert_eq!(
            parse_location("7").unwrap(),
            LocationSpec::Line { line: 7, col: 0 }
        );
    }

    #[test]
    fn file_references_carry_their_numbers() {
        assert_eq!(
            parse_location("foo.js:10").unwrap(),
            LocationSpec::File {
                file: "foo.js".into(),
                line: 10,
                col: 0
            }
        );
        assert_eq!(
            parse_location("src/foo.js:10:4").unwrap(),
            LocationSpec::File {
                file: "src/foo.js".into(),
                line: 10,
                col: 4
            }
        );
    }

    #[test]
    fn file_without_line_defaults_to_first_line() {
        assert_eq!(
            parse_location("lib/util.js").unwrap(),
            LocationSpec::File {
                file: "lib/util.js".into(),
                line: 1,
                col: 0
            }
        );
    }

    #[test]
    fn bare_colon_line_targets_current_file() {
        assert_eq!(
            parse_location(":10").unwrap(),
            LocationSpec::Line { line: 10, col: 0 }
        );
    }

    #[test]
    fn empty_input_means_current_location() {
        assert_eq!(parse_location("").unwrap(), LocationSpec::Current);
        assert_eq!(parse_location("   ").unwrap(), LocationSpec::Current);
    }

    #[test]
    fn symbolic_references_are_rejected() {
        assert!(matches!(
            parse_location("myFunction"),
            Err(Error::UnsupportedLocationKind(_))
        ));
    }

    #[test]
    fn windows_paths_survive_colon_splitting() {
        assert_eq!(
            parse_location(r"C:\proj\app.js:3").unwrap(),
            LocationSpec::File {
                file: r"C:\proj\app.js".into(),
                line: 3,
                col: 0
            }
        );
    }

    #[test]
    fn non_numeric_bare_prefix_with_number_is_a_parse_error() {
        // `foo:10` has no separator and no extension, so both sides must be
        // numbers; `foo` is not.
        assert!(matches!(
            parse_location("foo:10"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn huge_numbers_are_parse_errors_not_panics() {
        assert!(matches!(
            parse_location("99999999999999999999"),
            Err(Error::Parse { .. })
        ));
    }
}
