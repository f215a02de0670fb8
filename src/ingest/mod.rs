/// Loading of raw OSM data.
///
/// Submodules:
/// - `overpass`: Overpass API client and response types.
/// - `cache`: JSON cache of the last complete download.
/// - `extract`: charging stations from raw elements.

pub mod cache;
pub mod extract;
pub mod overpass;

use std::path::Path;

use crate::config::Config;
use crate::logging::{self, Stage};
use crate::model::SiteError;
use overpass::OsmElement;

/// Where the elements of a run come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Fresh download from Overpass.
    Overpass,
    /// Cache file of an earlier download.
    Cache,
}

/// Loads all elements, from Overpass or from the cache file.
///
/// A fresh download is written to the cache when it looks complete.
/// A failing cache write is logged and does not fail the run.
pub fn load_elements(config: &Config, source: Source) -> Result<Vec<OsmElement>, SiteError> {
    let cache_path = Path::new(&config.cache_file);

    match source {
        Source::Cache => {
            logging::info(Stage::Cache, None, &format!("Loading from {} ...", config.cache_file));
            let response = cache::load(cache_path)?;
            Ok(response.elements)
        }
        Source::Overpass => {
            logging::info(
                Stage::Overpass,
                None,
                &format!("Loading from {} ...", config.overpass_url),
            );
            let client = overpass::build_client(config.overpass_timeout_secs)?;
            let query = overpass::build_query(config.overpass_timeout_secs);

            let response = overpass::fetch_elements(&client, &config.overpass_url, &query)
                .inspect_err(|e| logging::log_overpass_failure("Charging station query", e))?;

            if cache::should_cache(&response, config.cache_min_elements) {
                match cache::save(cache_path, &response) {
                    Ok(()) => logging::debug(
                        Stage::Cache,
                        None,
                        &format!("saved {} elements to {}", response.elements.len(), config.cache_file),
                    ),
                    Err(e) => logging::warn(Stage::Cache, None, &e.to_string()),
                }
            } else {
                logging::warn(
                    Stage::Cache,
                    None,
                    &format!(
                        "only {} elements loaded, cache not updated",
                        response.elements.len()
                    ),
                );
            }

            Ok(response.elements)
        }
    }
}
