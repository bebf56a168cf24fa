use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use crate::core::distance::{distance_within, format_miles, haversine_km, GeoPoint};
use crate::models::Candidate;

/// Errors that can occur while retrieving venues
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Venue backend error: {0}")]
    Backend(String),

    #[error("Failed to read venue dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid venue dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of candidate venues
///
/// Implementations must be deterministic for a fixed dataset and return a
/// non-empty default set for unknown areas. Only backend failures are
/// errors.
#[async_trait]
pub trait VenueRetriever: Send + Sync {
    async fn search(
        &self,
        area: &str,
        venue_hint: Option<&str>,
    ) -> Result<Vec<Candidate>, RetrievalError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueRecord {
    pub area: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub price: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub location: GeoPoint,
}

impl NamedPlace {
    fn matches_area(&self, area: &str) -> bool {
        let wanted = normalize(area);
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|n| normalize(n) == wanted)
    }

    fn mentioned_in(&self, hint: &str) -> bool {
        let hint = normalize(hint);
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|n| hint.contains(&normalize(n)))
    }
}

/// Full directory contents, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueDataset {
    /// City-wide area; unknown areas resolve here
    pub default_area: NamedPlace,
    #[serde(default)]
    pub areas: Vec<NamedPlace>,
    #[serde(default)]
    pub landmarks: Vec<NamedPlace>,
    pub venues: Vec<VenueRecord>,
}

/// In-process venue directory
///
/// Areas select a subset of venues. A venue hint naming a known landmark
/// narrows the set to venues within `radius_km` of it. Unresolvable
/// hints, and hints with nothing in range, leave the set unfiltered.
pub struct VenueDirectory {
    dataset: VenueDataset,
    radius_km: f64,
}

impl VenueDirectory {
    pub fn new(dataset: VenueDataset, radius_km: f64) -> Self {
        Self { dataset, radius_km }
    }

    pub fn builtin(radius_km: f64) -> Self {
        Self::new(builtin_dataset(), radius_km)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, radius_km: f64) -> Result<Self, RetrievalError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let dataset: VenueDataset = serde_json::from_str(&raw)?;
        tracing::info!(
            venues = dataset.venues.len(),
            path = %path.as_ref().display(),
            "Loaded venue dataset"
        );
        Ok(Self::new(dataset, radius_km))
    }

    pub fn dataset(&self) -> &VenueDataset {
        &self.dataset
    }

    /// Area record and the venues inside it, or the city-wide default
    fn area_pool(&self, area: &str) -> (&NamedPlace, Vec<&VenueRecord>) {
        let ds = &self.dataset;
        if !ds.default_area.matches_area(area) {
            if let Some(place) = ds.areas.iter().find(|a| a.matches_area(area)) {
                let pool: Vec<_> = ds
                    .venues
                    .iter()
                    .filter(|v| place.matches_area(&v.area))
                    .collect();
                if !pool.is_empty() {
                    return (place, pool);
                }
            } else {
                tracing::debug!(area, "Unknown area, using default venue set");
            }
        }
        (&ds.default_area, ds.venues.iter().collect())
    }

    fn resolve_landmark(&self, hint: &str) -> Option<&NamedPlace> {
        self.dataset.landmarks.iter().find(|l| l.mentioned_in(hint))
    }
}

#[async_trait]
impl VenueRetriever for VenueDirectory {
    async fn search(
        &self,
        area: &str,
        venue_hint: Option<&str>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let (place, pool) = self.area_pool(area);

        let landmark = venue_hint.and_then(|hint| {
            let found = self.resolve_landmark(hint);
            if found.is_none() {
                tracing::debug!(hint, "Venue hint not locatable, skipping distance filter");
            }
            found
        });

        let Some(landmark) = landmark else {
            return Ok(pool
                .into_iter()
                .map(|v| to_candidate(v, haversine_km(place.location, v.location)))
                .collect());
        };

        let nearby: Vec<Candidate> = pool
            .iter()
            .filter_map(|v| {
                distance_within(landmark.location, v.location, self.radius_km)
                    .map(|km| to_candidate(v, km))
            })
            .collect();

        if nearby.is_empty() {
            tracing::debug!(
                landmark = %landmark.name,
                radius_km = self.radius_km,
                "No venues in range, returning full area set"
            );
            return Ok(pool
                .into_iter()
                .map(|v| to_candidate(v, haversine_km(landmark.location, v.location)))
                .collect());
        }

        Ok(nearby)
    }
}

fn to_candidate(record: &VenueRecord, km: f64) -> Candidate {
    Candidate {
        name: record.name.clone(),
        address: record.address.clone(),
        rating: record.rating,
        price: record.price.clone(),
        distance: format_miles(km),
        tags: record.tags.clone(),
        category: record.category.clone(),
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn place(name: &str, aliases: &[&str], lat: f64, lon: f64) -> NamedPlace {
    NamedPlace {
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        location: GeoPoint::new(lat, lon),
    }
}

#[allow(clippy::too_many_arguments)]
fn venue(
    area: &str,
    name: &str,
    address: &str,
    rating: f64,
    price: &str,
    category: &str,
    tags: &[&str],
    lat: f64,
    lon: f64,
) -> VenueRecord {
    VenueRecord {
        area: area.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        rating,
        price: price.to_string(),
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        location: GeoPoint::new(lat, lon),
    }
}

/// Mock San Francisco dataset
pub fn builtin_dataset() -> VenueDataset {
    VenueDataset {
        default_area: place("San Francisco", &["sf", "san francisco ca"], 37.7880, -122.4075),
        areas: vec![
            place("Soma", &["south of market"], 37.7785, -122.3948),
            place("Financial District", &["fidi", "embarcadero"], 37.7946, -122.3999),
            place("Mission", &["mission district"], 37.7599, -122.4148),
            place("Downtown", &["union square"], 37.7880, -122.4075),
            place("North Beach", &[], 37.8003, -122.4100),
            place("Hayes Valley", &[], 37.7765, -122.4240),
        ],
        landmarks: vec![
            place("GitHub HQ", &["github"], 37.7823, -122.3912),
            place("Salesforce Tower", &["salesforce"], 37.7897, -122.3972),
            place("Ferry Building", &[], 37.7955, -122.3937),
            place("Union Square", &[], 37.7880, -122.4075),
            place("Moscone Center", &["moscone"], 37.7842, -122.4016),
            place("Oracle Park", &[], 37.7786, -122.3893),
            place("Transamerica Pyramid", &["transamerica"], 37.7952, -122.4028),
            place("Dolores Park", &[], 37.7596, -122.4269),
            place("Civic Center", &["city hall"], 37.7793, -122.4193),
            place("Washington Square", &[], 37.8008, -122.4101),
        ],
        venues: vec![
            venue("Soma", "Greenleaf Salad Co.", "153 Townsend St, San Francisco, CA 94107", 4.5, "$$", "Salad",
                &["healthy", "organic", "low-carb"], 37.7787, -122.3915),
            venue("Soma", "Protein Bar & Kitchen", "300 Brannan St, San Francisco, CA 94107", 4.3, "$$", "Bowls",
                &["high-protein", "healthy", "diabetes-friendly"], 37.7818, -122.3920),
            venue("Soma", "Ono Poke House", "601 3rd St, San Francisco, CA 94107", 4.4, "$$", "Poke",
                &["protein", "healthy", "low-carb"], 37.7801, -122.3948),
            venue("Soma", "Brannan Street Bakery", "425 Brannan St, San Francisco, CA 94107", 4.6, "$", "Bakery",
                &["dessert", "sweets", "coffee"], 37.7790, -122.3960),
            venue("Soma", "Yerba Grill", "88 Bluxome St, San Francisco, CA 94107", 4.1, "$$", "Mediterranean",
                &["protein", "healthy", "gluten-free"], 37.7763, -122.3960),
            venue("Financial District", "Market Greens", "1 Embarcadero Center, San Francisco, CA 94111", 4.4, "$$", "Salad",
                &["healthy", "organic", "vegan"], 37.7946, -122.3990),
            venue("Financial District", "Ferry Plaza Poke", "1 Ferry Building, San Francisco, CA 94111", 4.5, "$$", "Poke",
                &["protein", "low-carb", "healthy"], 37.7955, -122.3934),
            venue("Financial District", "Montgomery Steakhouse", "345 Montgomery St, San Francisco, CA 94104", 4.2, "$$$$", "Steakhouse",
                &["protein", "low-carb", "keto"], 37.7928, -122.4025),
            venue("Financial District", "Sansome Sweets", "120 Sansome St, San Francisco, CA 94104", 4.0, "$", "Bakery",
                &["dessert", "sugary"], 37.7916, -122.4010),
            venue("Mission", "Valencia Taqueria", "2889 Mission St, San Francisco, CA 94110", 4.6, "$", "Mexican",
                &["protein", "gluten-free"], 37.7520, -122.4183),
            venue("Mission", "Dolores Garden Cafe", "3600 18th St, San Francisco, CA 94110", 4.3, "$$", "Vegan",
                &["vegan", "healthy", "organic"], 37.7615, -122.4260),
            venue("Mission", "Mission Noodle Bar", "2400 Mission St, San Francisco, CA 94110", 3.8, "$", "Vietnamese",
                &["healthy"], 37.7590, -122.4190),
            venue("Downtown", "Union Square Bistro", "333 Post St, San Francisco, CA 94108", 4.2, "$$$", "French",
                &["protein"], 37.7886, -122.4075),
            venue("Downtown", "Geary Grain Bowls", "180 Geary St, San Francisco, CA 94108", 4.4, "$$", "Bowls",
                &["healthy", "diabetes-friendly", "low-carb"], 37.7875, -122.4060),
            venue("Downtown", "Powell Street Pizza", "55 Powell St, San Francisco, CA 94102", 3.6, "$", "Pizza",
                &["comfort-food"], 37.7850, -122.4080),
            venue("North Beach", "Columbus Trattoria", "545 Columbus Ave, San Francisco, CA 94133", 4.5, "$$$", "Italian",
                &["pasta", "vegetarian"], 37.7995, -122.4085),
            venue("North Beach", "Washington Square Salads", "660 Union St, San Francisco, CA 94133", 4.1, "$$", "Salad",
                &["healthy", "organic"], 37.8006, -122.4103),
            venue("North Beach", "North Beach Cannoli", "1521 Stockton St, San Francisco, CA 94133", 4.7, "$", "Bakery",
                &["dessert", "sweets"], 37.8000, -122.4090),
            venue("Hayes Valley", "Hayes Green Kitchen", "432 Octavia St, San Francisco, CA 94102", 4.4, "$$", "Californian",
                &["healthy", "organic", "low-carb"], 37.7765, -122.4240),
            venue("Hayes Valley", "Patricia's Grill House", "300 Hayes St, San Francisco, CA 94102", 4.0, "$$", "Grill",
                &["protein", "keto"], 37.7770, -122.4210),
            venue("Hayes Valley", "Octavia Ramen", "525 Hayes St, San Francisco, CA 94102", 4.3, "$$", "Japanese",
                &["protein"], 37.7767, -122.4255),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_area_selects_subset() {
        let dir = VenueDirectory::builtin(1.5);
        let result = dir.search("SoMa", None).await.unwrap();

        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|c| c.address.ends_with("94107")));
    }

    #[tokio::test]
    async fn test_unknown_area_returns_default_set() {
        let dir = VenueDirectory::builtin(1.5);
        let result = dir.search("Atlantis", None).await.unwrap();

        assert_eq!(result.len(), dir.dataset().venues.len());
    }

    #[tokio::test]
    async fn test_landmark_filters_by_radius() {
        let dir = VenueDirectory::builtin(1.0);
        let result = dir.search("San Francisco", Some("near GitHub HQ")).await.unwrap();

        assert!(!result.is_empty());
        assert!(names(&result).contains(&"Protein Bar & Kitchen"));
        assert!(!names(&result).contains(&"Valencia Taqueria"));
    }

    #[tokio::test]
    async fn test_unresolvable_hint_returns_unfiltered() {
        let dir = VenueDirectory::builtin(1.0);
        let filtered = dir.search("Mission", Some("The Office HQ - 20th Floor")).await.unwrap();
        let plain = dir.search("Mission", None).await.unwrap();

        assert_eq!(filtered, plain);
    }

    #[tokio::test]
    async fn test_nothing_in_range_returns_area_set() {
        let dir = VenueDirectory::builtin(0.5);
        // Washington Square is far from every Mission venue
        let result = dir.search("Mission", Some("Washington Square")).await.unwrap();
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn test_deterministic_order() {
        let dir = VenueDirectory::builtin(1.5);
        let a = dir.search("Financial District", Some("Ferry Building")).await.unwrap();
        let b = dir.search("fidi", Some("ferry building")).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dataset_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venues.json");
        std::fs::write(&path, serde_json::to_string(&builtin_dataset()).unwrap()).unwrap();

        let loaded = VenueDirectory::from_file(&path, 1.0).unwrap();
        assert_eq!(loaded.dataset().venues.len(), builtin_dataset().venues.len());
    }

    #[test]
    fn test_missing_dataset_file() {
        let err = VenueDirectory::from_file("/nonexistent/venues.json", 1.0).err().unwrap();
        assert!(matches!(err, RetrievalError::Io(_)));
    }
}
