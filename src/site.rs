//! Core data types shared by the provider, the feed controller, and the CLI.
//!
//! - [`QueryAnchor`] identifies what "page 1" means right now
//! - [`SiteSummary`] is one immutable result row
//! - [`StableKey`] is the derived identity used for duplicate suppression
//! - [`SitePage`] is one page as returned by a provider

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Coordinates
// ============================================================================

/// A WGS84 position in decimal degrees.
///
/// Equality is exact at the precision supplied; nothing is rounded. Two
/// location fixes that differ in the last decimal place are different
/// anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Bit patterns used for hashing. `-0.0` is folded onto `0.0` so the
    /// key agrees with `PartialEq`.
    fn key_bits(&self) -> (u64, u64) {
        ((self.latitude + 0.0).to_bits(), (self.longitude + 0.0).to_bits())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

// ============================================================================
// Content Types
// ============================================================================

/// Category filter understood by the tourism API (`contentTypeId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    TouristSpot,
    CulturalFacility,
    Festival,
    TravelCourse,
    Leports,
    Lodging,
    Shopping,
    Restaurant,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        ContentType::TouristSpot,
        ContentType::CulturalFacility,
        ContentType::Festival,
        ContentType::TravelCourse,
        ContentType::Leports,
        ContentType::Lodging,
        ContentType::Shopping,
        ContentType::Restaurant,
    ];

    /// Numeric `contentTypeId` sent upstream.
    pub fn code(self) -> u16 {
        match self {
            ContentType::TouristSpot => 12,
            ContentType::CulturalFacility => 14,
            ContentType::Festival => 15,
            ContentType::TravelCourse => 25,
            ContentType::Leports => 28,
            ContentType::Lodging => 32,
            ContentType::Shopping => 38,
            ContentType::Restaurant => 39,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentType::TouristSpot => "tourist-spot",
            ContentType::CulturalFacility => "cultural-facility",
            ContentType::Festival => "festival",
            ContentType::TravelCourse => "travel-course",
            ContentType::Leports => "leports",
            ContentType::Lodging => "lodging",
            ContentType::Shopping => "shopping",
            ContentType::Restaurant => "restaurant",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the kebab-case name or the numeric API code.
impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u16>() {
            return Self::from_code(code).ok_or_else(|| UnknownContentType(s.to_string()));
        }
        let lowered = trimmed.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}

// ============================================================================
// Query Anchor
// ============================================================================

/// The parameters identifying the first page of the feed.
///
/// Exactly one anchor is active per controller. Any change, including a
/// change of parameters within the same variant, resets pagination.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAnchor {
    Location {
        coordinate: Coordinate,
        radius_meters: u32,
        category: Option<ContentType>,
    },
    Keyword {
        keyword: Option<String>,
        category: Option<ContentType>,
    },
}

impl QueryAnchor {
    pub fn location(coordinate: Coordinate, radius_meters: u32) -> Self {
        QueryAnchor::Location {
            coordinate,
            radius_meters,
            category: None,
        }
    }

    /// Keyword anchor. Blank keywords are stored as `None` so that
    /// `keyword("")` and a plain category browse compare equal.
    pub fn keyword(keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        let trimmed = keyword.trim();
        QueryAnchor::Keyword {
            keyword: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            category: None,
        }
    }

    pub fn browse(category: ContentType) -> Self {
        QueryAnchor::Keyword {
            keyword: None,
            category: Some(category),
        }
    }

    pub fn with_category(mut self, filter: Option<ContentType>) -> Self {
        match &mut self {
            QueryAnchor::Location { category, .. } | QueryAnchor::Keyword { category, .. } => {
                *category = filter;
            }
        }
        self
    }

    pub fn category(&self) -> Option<ContentType> {
        match self {
            QueryAnchor::Location { category, .. } | QueryAnchor::Keyword { category, .. } => {
                *category
            }
        }
    }

    pub fn is_location(&self) -> bool {
        matches!(self, QueryAnchor::Location { .. })
    }
}

impl fmt::Display for QueryAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryAnchor::Location {
                coordinate,
                radius_meters,
                category,
            } => {
                write!(f, "near {} within {}m", coordinate, radius_meters)?;
                if let Some(c) = category {
                    write!(f, " [{}]", c)?;
                }
                Ok(())
            }
            QueryAnchor::Keyword { keyword, category } => {
                match keyword {
                    Some(k) => write!(f, "\"{}\"", k)?,
                    None => f.write_str("all sites")?,
                }
                if let Some(c) = category {
                    write!(f, " [{}]", c)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Site Summary
// ============================================================================

/// Identity used for duplicate suppression: title plus coordinate.
///
/// The upstream API does not guarantee a stable per-item identifier at this
/// layer, so two distinct sites with the same title and position collapse
/// into one, and the same site returned with a slightly different position
/// is kept twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StableKey {
    title: String,
    coordinate: Option<(u64, u64)>,
}

/// One result row. Never edited after it is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub title: String,
    pub address: String,
    pub coordinate: Option<Coordinate>,
    /// Upstream content id, when the API sent one. Not used for identity.
    pub content_id: Option<String>,
    pub content_type: Option<ContentType>,
    pub thumbnail_url: Option<String>,
    /// Distance from the query coordinate (location searches only).
    pub distance_meters: Option<f64>,
}

impl SiteSummary {
    pub fn new(
        title: impl Into<String>,
        address: impl Into<String>,
        coordinate: Option<Coordinate>,
    ) -> Self {
        Self {
            title: title.into(),
            address: address.into(),
            coordinate,
            content_id: None,
            content_type: None,
            thumbnail_url: None,
            distance_meters: None,
        }
    }

    pub fn stable_key(&self) -> StableKey {
        StableKey {
            title: self.title.clone(),
            coordinate: self.coordinate.as_ref().map(Coordinate::key_bits),
        }
    }
}

/// One page of results as reported by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SitePage {
    pub items: Vec<SiteSummary>,
    pub page_no: u32,
    pub total_count: u32,
}
