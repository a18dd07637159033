pub mod stats;
pub mod views;

use crate::api::ApiError;
use crate::models::{version_components, StatsParams, UnknownVariant};

fn bad_request(err: UnknownVariant) -> ApiError {
    ApiError::BadRequest(err.to_string())
}

/// Parse the `/{version}/{region}/{league}/{category}` path segments.
pub(crate) fn parse_params(
    (version, region, league, category): (String, String, String, String),
) -> Result<StatsParams, ApiError> {
    let region = region.parse().map_err(bad_request)?;
    let league = league.parse().map_err(bad_request)?;
    let category = category.parse().map_err(bad_request)?;

    // Versions name directories, so only `major.minor` is accepted.
    if version_components(&version).is_none() {
        return Err(ApiError::BadRequest(format!("invalid version: {}", version)));
    }

    Ok(StatsParams::new(version, region, league, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, League, Region};

    fn segments(v: &str, r: &str, l: &str, c: &str) -> (String, String, String, String) {
        (v.to_string(), r.to_string(), l.to_string(), c.to_string())
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(segments("13.12", "euw", "Challenger", "units")).unwrap();
        assert_eq!(
            params,
            StatsParams::new("13.12", Region::Euw, League::Challenger, Category::Units)
        );
    }

    #[test]
    fn test_parse_params_rejects_unknown_names() {
        for bad in [
            segments("13.12", "MARS", "CHALLENGER", "units"),
            segments("13.12", "EUW", "WOOD", "units"),
            segments("13.12", "EUW", "CHALLENGER", "items"),
            segments("", "EUW", "CHALLENGER", "units"),
            segments("../../secret", "EUW", "CHALLENGER", "units"),
            segments("13.12/..", "EUW", "CHALLENGER", "units"),
        ] {
            assert!(matches!(parse_params(bad), Err(ApiError::BadRequest(_))));
        }
    }
}
