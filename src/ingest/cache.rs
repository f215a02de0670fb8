/// Local cache of the last complete Overpass download.
///
/// The global query takes several minutes, so a successful response is
/// stored as JSON and can be reused with `--noload`. Small responses are not
/// cached: a busy Overpass instance sometimes returns a partial result, and
/// caching it would silently shrink every later run.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::ingest::overpass::OverpassResponse;
use crate::model::SiteError;

/// Whether a response is large enough to be trusted as complete.
pub fn should_cache(response: &OverpassResponse, min_elements: usize) -> bool {
    response.elements.len() > min_elements
}

pub fn save(path: &Path, response: &OverpassResponse) -> Result<(), SiteError> {
    let file = File::create(path).map_err(|e| write_error(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, response).map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))?;
    Ok(())
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> SiteError {
    SiteError::CacheError(format!("cannot write {}: {}", path.display(), e))
}

pub fn load(path: &Path) -> Result<OverpassResponse, SiteError> {
    let file = File::open(path).map_err(|e| {
        SiteError::CacheError(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SiteError::ParseError(format!("{}: {}", path.display(), e)))
}
