use std::{fs, path::Path};

use super::{EegErr, Result};

/// A stimulus marker of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Absolute sample index, `first_samp` included.
    pub sample: usize,
    pub previous: u32,
    pub id: u32,
}

/// Reads an MNE text event file.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    parse_events(&fs::read_to_string(path)?)
}

/// Parses the rows of an MNE text event file.
///
/// Every row holds either `sample previous id` or `sample time previous id`, separated by
/// whitespace. Blank lines and anything after a `#` are ignored.
///
/// # Returns
/// The events in file order, or `EegErr::Format` naming the first bad line.
pub fn parse_events(text: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        let cols: Vec<_> = line.split_whitespace().collect();

        let (sample, previous, id) = match cols[..] {
            [] => continue,
            [sample, previous, id] => (sample, previous, id),
            [sample, time, previous, id] => {
                field::<f64>(time, i, "time")?;
                (sample, previous, id)
            }
            _ => {
                return Err(EegErr::Format(format!(
                    "events line {}: expected 3 or 4 columns, found {}",
                    i + 1,
                    cols.len()
                )));
            }
        };

        events.push(Event {
            sample: field(sample, i, "sample")?,
            previous: field(previous, i, "previous id")?,
            id: field(id, i, "event id")?,
        });
    }

    Ok(events)
}

fn field<T: std::str::FromStr>(raw: &str, line: usize, what: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        EegErr::Format(format!(
            "events line {}: invalid {what} {raw:?}",
            line + 1
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_layouts() {
        let text = "\
# sample time prev id
6994 46.5802 0 2

7086 47.1929 0 3  # trailing comment
7192 0 1
";
        let events = parse_events(text).unwrap();

        assert_eq!(
            events,
            [
                Event { sample: 6994, previous: 0, id: 2 },
                Event { sample: 7086, previous: 0, id: 3 },
                Event { sample: 7192, previous: 0, id: 1 },
            ]
        );
    }

    #[test]
    fn rejects_bad_rows() {
        assert!(matches!(parse_events("1 2"), Err(EegErr::Format(_))));
        assert!(matches!(parse_events("1 x 0 5"), Err(EegErr::Format(_))));
        assert!(matches!(parse_events("-4 0 5"), Err(EegErr::Format(_))));
    }

    #[test]
    fn empty_file_has_no_events() {
        assert!(parse_events("\n# nothing\n").unwrap().is_empty());
    }
}
