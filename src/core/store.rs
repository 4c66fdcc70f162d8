/// Saving and loading chains as RON files.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;
use std::path::Path;

use crate::core::chain::Chain;
use crate::core::error::MarkovError;

/// Save a chain to a RON file.
pub fn save_chain<T>(chain: &Chain<T>, path: &Path) -> Result<(), MarkovError>
where
    T: Serialize + Clone + Eq + Hash,
{
    let serialized = ron::ser::to_string_pretty(chain, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    log::info!("saved {} to '{}'", chain, path.display());
    Ok(())
}

/// Load a chain from a RON file.
///
/// The file goes through the same validation as `Chain::from_states`, so a
/// state of the wrong length or a negative weight is reported as an error.
pub fn load_chain<T>(path: &Path) -> Result<Chain<T>, MarkovError>
where
    T: DeserializeOwned + Clone + Eq + Hash,
{
    let contents = std::fs::read_to_string(path)?;
    let chain: Chain<T> = ron::from_str(&contents)?;
    log::info!("loaded {} from '{}'", chain, path.display());
    Ok(chain)
}
