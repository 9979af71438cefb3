use bytes::Bytes;

use crate::config::IngestConfig;
use crate::error::{Result, RouteError};

/// Fields of one input line, as far as it was split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine {
    /// Field values in input order; `None` is NULL
    pub fields: Vec<Option<Bytes>>,
    /// Raw text after the last split field when splitting stopped early
    pub remainder: Option<Bytes>,
}

/// Splits delimited text lines into fields.
///
/// Escapes are resolved only in fields that contain one; other fields are
/// zero-copy slices of the input line. A field equal to the null marker,
/// compared before unescaping, is NULL.
#[derive(Debug, Clone)]
pub struct LineSplitter {
    delimiter: u8,
    escape: Option<u8>,
    null_marker: Bytes,
    fill_missing: bool,
}

impl LineSplitter {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            escape: Some(b'\\'),
            null_marker: Bytes::from_static(b"\\N"),
            fill_missing: false,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            delimiter: config.delimiter as u8,
            escape: config.escape.map(|c| c as u8),
            null_marker: Bytes::copy_from_slice(config.null_marker.as_bytes()),
            fill_missing: config.fill_missing,
        })
    }

    pub fn with_escape(mut self, escape: Option<u8>) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_null_marker(mut self, marker: &str) -> Self {
        self.null_marker = Bytes::copy_from_slice(marker.as_bytes());
        self
    }

    pub fn fill_missing(mut self, fill_missing: bool) -> Self {
        self.fill_missing = fill_missing;
        self
    }

    /// Split `line` into `ncolumns` fields.
    ///
    /// With `stop_after` set, splitting ends after that many fields and the
    /// unread tail is returned as the remainder; fields past the bound are
    /// not validated.
    pub fn split(&self, line: &Bytes, ncolumns: usize, stop_after: Option<usize>) -> Result<SplitLine> {
        let line = strip_line_end(line);
        let stop = stop_after.map_or(ncolumns, |n| n.min(ncolumns));

        if stop == 0 {
            if stop_after.is_some() && ncolumns > 0 {
                return Ok(SplitLine {
                    fields: Vec::new(),
                    remainder: Some(line),
                });
            }
            if !line.is_empty() {
                return Err(RouteError::BadRowFormat(
                    "extra data after last expected column".into(),
                ));
            }
            return Ok(SplitLine {
                fields: Vec::new(),
                remainder: None,
            });
        }

        let bytes = line.as_ref();
        let mut fields = Vec::with_capacity(stop);
        let mut start = 0;
        loop {
            let (end, escaped) = self.scan_field(bytes, start)?;
            let raw = &bytes[start..end];
            let field = if raw == self.null_marker.as_ref() {
                None
            } else if escaped {
                Some(self.unescape(raw))
            } else {
                Some(line.slice(start..end))
            };
            fields.push(field);

            if end == bytes.len() {
                if fields.len() < stop {
                    if !self.fill_missing || bytes.is_empty() {
                        return Err(RouteError::BadRowFormat(format!(
                            "missing data for column {}",
                            fields.len() + 1
                        )));
                    }
                    fields.resize(stop, None);
                }
                return Ok(SplitLine {
                    fields,
                    remainder: None,
                });
            }

            start = end + 1;
            if fields.len() == stop {
                if stop < ncolumns {
                    return Ok(SplitLine {
                        fields,
                        remainder: Some(line.slice(start..)),
                    });
                }
                return Err(RouteError::BadRowFormat(
                    "extra data after last expected column".into(),
                ));
            }
        }
    }

    /// End of the field starting at `start`, and whether it holds escapes.
    fn scan_field(&self, bytes: &[u8], start: usize) -> Result<(usize, bool)> {
        let mut pos = start;
        let mut escaped = false;
        while pos < bytes.len() {
            let b = bytes[pos];
            if Some(b) == self.escape {
                if pos + 1 >= bytes.len() {
                    return Err(RouteError::BadRowFormat("end-of-line escape".into()));
                }
                escaped = true;
                pos += 2;
                continue;
            }
            if b == self.delimiter {
                break;
            }
            pos += 1;
        }
        Ok((pos, escaped))
    }

    fn unescape(&self, raw: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(raw.len());
        let mut iter = raw.iter().copied();
        while let Some(b) = iter.next() {
            if Some(b) != self.escape {
                out.push(b);
                continue;
            }
            match iter.next() {
                Some(b'n') => out.push(b'\n'),
                Some(b't') => out.push(b'\t'),
                Some(b'r') => out.push(b'\r'),
                Some(b'b') => out.push(0x08),
                Some(b'f') => out.push(0x0c),
                Some(b'v') => out.push(0x0b),
                Some(other) => out.push(other),
                None => out.push(b),
            }
        }
        Bytes::from(out)
    }
}

fn strip_line_end(line: &Bytes) -> Bytes {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && line[end - 1] == b'\r' {
            end -= 1;
        }
    }
    line.slice(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(splitter: &LineSplitter, line: &str, ncolumns: usize, stop: Option<usize>) -> Result<SplitLine> {
        splitter.split(&Bytes::copy_from_slice(line.as_bytes()), ncolumns, stop)
    }

    fn field(s: &str) -> Option<Bytes> {
        Some(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn test_split_all_fields() {
        let splitter = LineSplitter::new(b'\t');
        let line = split(&splitter, "1\tabc\t\\N\n", 3, None).unwrap();
        assert_eq!(line.fields, vec![field("1"), field("abc"), None]);
        assert_eq!(line.remainder, None);
    }

    #[test]
    fn test_escapes() {
        let splitter = LineSplitter::new(b',');
        let line = split(&splitter, "a\\,b,c\\\\d\\te", 2, None).unwrap();
        assert_eq!(line.fields, vec![field("a,b"), field("c\\d\te")]);
    }

    #[test]
    fn test_stop_after_returns_remainder() {
        let splitter = LineSplitter::new(b'|');
        let line = split(&splitter, "k|v1|v2|garbage|\r\n", 10, Some(1)).unwrap();
        assert_eq!(line.fields, vec![field("k")]);
        assert_eq!(line.remainder, field("v1|v2|garbage|"));

        let none = split(&splitter, "anything|at|all", 3, Some(0)).unwrap();
        assert!(none.fields.is_empty());
        assert_eq!(none.remainder, field("anything|at|all"));
    }

    #[test]
    fn test_column_count_errors() {
        let splitter = LineSplitter::new(b',');
        assert!(matches!(
            split(&splitter, "1,2,3", 2, None),
            Err(RouteError::BadRowFormat(_))
        ));
        assert!(matches!(
            split(&splitter, "1", 2, None),
            Err(RouteError::BadRowFormat(_))
        ));
        assert!(matches!(
            split(&splitter, "1,2\\", 2, None),
            Err(RouteError::BadRowFormat(_))
        ));
    }

    #[test]
    fn test_fill_missing() {
        let splitter = LineSplitter::new(b',').fill_missing(true);
        let line = split(&splitter, "1", 3, None).unwrap();
        assert_eq!(line.fields, vec![field("1"), None, None]);
        assert!(split(&splitter, "", 3, None).is_err());
    }

    #[test]
    fn test_custom_null_marker_and_trailing_empty_field() {
        let splitter = LineSplitter::new(b',').with_null_marker("").with_escape(None);
        let line = split(&splitter, "a,", 2, None).unwrap();
        assert_eq!(line.fields, vec![field("a"), None]);
    }

    #[test]
    fn test_from_config() {
        let config = IngestConfig {
            delimiter: ';',
            null_marker: "NULL".into(),
            escape: None,
            fill_missing: false,
        };
        let splitter = LineSplitter::from_config(&config).unwrap();
        let line = split(&splitter, "NULL;x\\y", 2, None).unwrap();
        assert_eq!(line.fields, vec![None, field("x\\y")]);
    }
}
