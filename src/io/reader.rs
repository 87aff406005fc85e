use crate::domain::{KMeansError, ObjectSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

const ID_DELIMITERS: &[char] = &[' ', ',', '\t', '\r', '\n'];
const COORD_DELIMITERS: &[char] = &[' ', ',', '\t', '\r', '\n'];

/// Reads a delimited-text object file.
///
/// The first space, tab or comma delimited token of every row is an
/// identifier and is dropped; the rest are coordinates. Rows without any
/// token are skipped. Every row must carry the same number of coordinates as
/// the first one.
pub fn read_objects(path: impl AsRef<Path>) -> Result<ObjectSet, KMeansError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| KMeansError::io(path, e))?;
    let objects = parse_objects(BufReader::new(file)).map_err(|e| match e {
        KMeansError::Io { source, .. } => KMeansError::io(path, source),
        other => other,
    })?;
    debug!(
        path = %path.display(),
        n_objs = objects.nrows(),
        n_coords = objects.ncols(),
        "loaded objects"
    );
    Ok(objects)
}

pub fn parse_objects<R: BufRead>(reader: R) -> Result<ObjectSet, KMeansError> {
    let mut n_coords: Option<usize> = None;
    let mut values = Vec::new();
    let mut n_objs = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| KMeansError::io("<input>", e))?;
        let line_no = index + 1;

        let Some((_id, rest)) = split_id(&line) else {
            continue;
        };

        let before = values.len();
        for token in rest.split(COORD_DELIMITERS).filter(|t| !t.is_empty()) {
            let value = token.parse::<f32>().map_err(|_| KMeansError::Parse {
                line: line_no,
                token: token.to_string(),
            })?;
            values.push(value);
        }
        let found = values.len() - before;

        match n_coords {
            None => n_coords = Some(found),
            Some(expected) if expected != found => {
                return Err(KMeansError::RaggedRow {
                    line: line_no,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }
        n_objs += 1;
    }

    let n_coords = match n_coords {
        None => return Err(KMeansError::EmptyInput("no rows found".to_string())),
        Some(0) => {
            return Err(KMeansError::EmptyInput(
                "rows carry an identifier but no coordinates".to_string(),
            ));
        }
        Some(n) => n,
    };

    Ok(ObjectSet::from_shape_vec((n_objs, n_coords), values)?)
}

/// Splits off the identifier token; `None` for blank lines.
fn split_id(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start_matches(ID_DELIMITERS);
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(ID_DELIMITERS) {
        Some(end) => Some((&trimmed[..end], &trimmed[end..])),
        None => Some((trimmed, "")),
    }
}
