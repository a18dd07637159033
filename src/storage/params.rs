//! Discovery list of published statistics documents (`params.json`).

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::{StatsStore, StorageConfig, StorageError};
use crate::models::{version_components, Category, League, Region, StatsParams};

/// Which published documents are listed.
#[derive(Debug, Clone, Default)]
pub struct ParamsFilter {
    /// Empty means every known region.
    pub regions: HashSet<Region>,
    /// Empty means every known league.
    pub leagues: HashSet<League>,
    pub excluded_versions: HashSet<String>,
}

impl ParamsFilter {
    fn accepts(&self, params: &StatsParams) -> bool {
        (self.regions.is_empty() || self.regions.contains(&params.region))
            && (self.leagues.is_empty() || self.leagues.contains(&params.league))
            && !self.excluded_versions.contains(&params.version)
    }
}

/// Enumerates and persists the (version, region, league, category) tuples
/// that have a published document.
#[derive(Debug, Clone)]
pub struct ParamsIndex {
    stats: StatsStore,
    path: PathBuf,
}

impl ParamsIndex {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            stats: StatsStore::new(config),
            path: config.params_path(),
        }
    }

    /// Walk the published documents, filter and sort them, then persist the
    /// list as `params.json`.
    pub fn rebuild(&self, filter: &ParamsFilter) -> Result<Vec<StatsParams>, StorageError> {
        let mut params: Vec<StatsParams> = self
            .stats
            .list_published()?
            .into_iter()
            .filter(|p| filter.accepts(p))
            .collect();
        params.sort_by(compare_params);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&params)?)?;

        info!("Indexed {} published documents in {:?}", params.len(), self.path);
        Ok(params)
    }

    /// The persisted list; empty when it has never been built.
    pub fn all(&self) -> Result<Vec<StatsParams>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Versions by minor component descending (then major descending), regions
/// alphabetically, leagues by tier descending, categories in their fixed order.
pub fn compare_params(a: &StatsParams, b: &StatsParams) -> Ordering {
    compare_versions(&a.version, &b.version)
        .then_with(|| a.region.as_str().cmp(b.region.as_str()))
        .then_with(|| b.league.cmp(&a.league))
        .then_with(|| category_position(a.category).cmp(&category_position(b.category)))
}

/// Newest first. Unparseable versions sort last, by name.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (version_components(a), version_components(b)) {
        (Some((a_major, a_minor)), Some((b_major, b_minor))) => b_minor
            .cmp(&a_minor)
            .then_with(|| b_major.cmp(&a_major)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn category_position(category: Category) -> usize {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(Category::ALL.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatsDocument;
    use crate::models::UnitStats;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn publish(config: &StorageConfig, version: &str, region: Region, league: League, category: Category) {
        let doc: StatsDocument<UnitStats> = StatsDocument {
            category,
            region,
            version: version.to_string(),
            league,
            count: 0,
            value: vec![],
            last_updated_ts: 0,
        };
        StatsStore::new(config).write(&doc).unwrap();
    }

    #[test]
    fn test_rebuild_sorts_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        publish(&config, "13.9", Region::Na, League::Diamond, Category::Units);
        publish(&config, "13.12", Region::Na, League::Master, Category::Traits);
        publish(&config, "13.12", Region::Euw, League::Challenger, Category::Augments);
        publish(&config, "13.12", Region::Na, League::Challenger, Category::Units);
        publish(&config, "13.12", Region::Na, League::Challenger, Category::Augments);

        let index = ParamsIndex::new(&config);
        let params = index.rebuild(&ParamsFilter::default()).unwrap();

        let summary: Vec<String> = params
            .iter()
            .map(|p| format!("{}/{}/{}/{}", p.version, p.region, p.league, p.category))
            .collect();
        assert_eq!(
            summary,
            vec![
                "13.12/EUW/CHALLENGER/augments",
                "13.12/NA/CHALLENGER/units",
                "13.12/NA/CHALLENGER/augments",
                "13.12/NA/MASTER/traits",
                "13.9/NA/DIAMOND/units",
            ]
        );
        assert_eq!(index.all().unwrap(), params);
    }

    #[test]
    fn test_rebuild_applies_filter() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        publish(&config, "13.12", Region::Na, League::Master, Category::Units);
        publish(&config, "13.12", Region::Kr, League::Master, Category::Units);
        publish(&config, "13.1", Region::Na, League::Master, Category::Units);

        let filter = ParamsFilter {
            regions: [Region::Na].into_iter().collect(),
            leagues: HashSet::new(),
            excluded_versions: ["13.1".to_string()].into_iter().collect(),
        };
        let params = ParamsIndex::new(&config).rebuild(&filter).unwrap();

        assert_eq!(
            params,
            vec![StatsParams::new("13.12", Region::Na, League::Master, Category::Units)]
        );
    }

    #[test]
    fn test_all_before_rebuild_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        assert!(ParamsIndex::new(&config).all().unwrap().is_empty());
    }

    #[test]
    fn test_compare_versions() {
        let mut versions = vec!["12.23", "13.9", "13.12", "beta", "14.9"];
        versions.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(versions, vec!["12.23", "13.12", "14.9", "13.9", "beta"]);
    }
}
