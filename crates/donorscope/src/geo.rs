//! Geo view controller.
//!
//! Computes the map viewport for a filtered subset and the marker list that
//! goes with it. The viewport is always defined: when no donor in the subset
//! is located, the viewport registered for the active city (or the global
//! default) is used.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::donor::{BloodGroup, Coordinates, DonationDate, DonorRecord};
use crate::error::{Error, Result};
use crate::filter::Facet;

/// Center and zoom of a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    center: Coordinates,
    zoom: u8,
}

impl Viewport {
    /// Create a viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if `zoom` is zero.
    pub fn new(center: Coordinates, zoom: u8) -> Result<Self> {
        if zoom == 0 {
            return Err(Error::InvalidViewport {
                message: "zoom must be greater than 0".to_string(),
            });
        }
        Ok(Self { center, zoom })
    }

    /// Map center.
    #[must_use]
    pub fn center(&self) -> Coordinates {
        self.center
    }

    /// Zoom level, always positive.
    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

/// Popup details shown for a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPopup {
    /// Donor blood group.
    pub blood_group: BloodGroup,
    /// Donor contact number.
    pub contact: String,
    /// Donor address.
    pub address: String,
    /// Last donation date.
    pub last_donation: DonationDate,
}

/// A map marker for one located donor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// Identifier of the donor the marker represents.
    pub donor_id: String,
    /// Marker position.
    pub coordinates: Coordinates,
    /// Marker label (the donor name).
    pub label: String,
    /// Popup contents.
    pub popup: MarkerPopup,
}

impl Marker {
    fn for_donor(donor: &DonorRecord, coordinates: Coordinates) -> Self {
        Self {
            donor_id: donor.id().to_string(),
            coordinates,
            label: donor.name().to_string(),
            popup: MarkerPopup {
                blood_group: donor.blood_group(),
                contact: donor.contact().to_string(),
                address: donor.address().to_string(),
                last_donation: donor.last_donation(),
            },
        }
    }
}

/// Viewport and markers for one subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Where the map is centered.
    pub viewport: Viewport,
    /// One marker per located donor, in subset order.
    pub markers: Vec<Marker>,
}

/// Static viewport table: per-region defaults plus the global default and
/// the two zoom levels used when fitting donors.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    global: Viewport,
    coarse_zoom: u8,
    fine_zoom: u8,
    regions: BTreeMap<String, Viewport>,
}

impl RegionTable {
    /// Create a table with no named regions.
    ///
    /// # Errors
    ///
    /// Returns an error if either zoom level is zero.
    pub fn new(global: Viewport, coarse_zoom: u8, fine_zoom: u8) -> Result<Self> {
        if coarse_zoom == 0 || fine_zoom == 0 {
            return Err(Error::InvalidViewport {
                message: format!(
                    "coarse ({coarse_zoom}) and fine ({fine_zoom}) zoom must be greater than 0"
                ),
            });
        }
        Ok(Self {
            global,
            coarse_zoom,
            fine_zoom,
            regions: BTreeMap::new(),
        })
    }

    /// Register (or replace) the default viewport of a named region.
    #[must_use]
    pub fn with_region(mut self, name: impl Into<String>, viewport: Viewport) -> Self {
        self.regions.insert(name.into(), viewport);
        self
    }

    /// The global default viewport.
    #[must_use]
    pub fn global(&self) -> Viewport {
        self.global
    }

    /// Default viewport of a named region, if registered.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<Viewport> {
        self.regions.get(name).copied()
    }

    /// Names of the registered regions, ascending.
    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Viewport used when the subset has no located donor.
    #[must_use]
    pub fn fallback(&self, city: &Facet<String>) -> Viewport {
        city.value()
            .and_then(|name| self.region(name))
            .unwrap_or(self.global)
    }

    /// Viewport for a filtered subset under the active city facet.
    ///
    /// Located donors are framed by the midpoint of their latitude and
    /// longitude extents, at coarse zoom for `All` and fine zoom otherwise.
    pub fn viewport_for<'a, I>(&self, subset: I, city: &Facet<String>) -> Viewport
    where
        I: IntoIterator<Item = &'a DonorRecord>,
    {
        let Some(bounds) = Bounds::of(subset.into_iter().filter_map(DonorRecord::coordinates))
        else {
            let viewport = self.fallback(city);
            trace!(city = %city, zoom = viewport.zoom, "No located donors, using default viewport");
            return viewport;
        };

        let zoom = if city.is_all() {
            self.coarse_zoom
        } else {
            self.fine_zoom
        };
        Viewport {
            center: bounds.midpoint(),
            zoom,
        }
    }

    /// Viewport and markers for a filtered subset.
    #[must_use]
    pub fn map_view(&self, subset: &[&DonorRecord], city: &Facet<String>) -> MapView {
        MapView {
            viewport: self.viewport_for(subset.iter().copied(), city),
            markers: markers(subset.iter().copied()),
        }
    }
}

impl Default for RegionTable {
    /// Sri Lanka: the island overview plus the major donor cities.
    fn default() -> Self {
        let at = |lat: f64, lng: f64, zoom: u8| Viewport {
            center: Coordinates::in_range(lat, lng),
            zoom,
        };
        Self {
            global: at(7.8731, 80.7718, 7),
            coarse_zoom: 7,
            fine_zoom: 13,
            regions: BTreeMap::new(),
        }
        .with_region("Colombo", at(6.9271, 79.8612, 12))
        .with_region("Kandy", at(7.2906, 80.6337, 13))
        .with_region("Galle", at(6.0329, 80.2168, 13))
        .with_region("Jaffna", at(9.6615, 80.0255, 12))
        .with_region("Matara", at(5.9549, 80.5550, 13))
        .with_region("Anuradhapura", at(8.3114, 80.4037, 13))
        .with_region("Negombo", at(7.2111, 79.8386, 13))
        .with_region("Kurunegala", at(7.4818, 80.3609, 13))
    }
}

/// Markers for every located donor in the subset.
pub fn markers<'a, I>(subset: I) -> Vec<Marker>
where
    I: IntoIterator<Item = &'a DonorRecord>,
{
    subset
        .into_iter()
        .filter_map(|d| d.coordinates().map(|c| Marker::for_donor(d, c)))
        .collect()
}

/// Latitude/longitude extents of a set of points.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl Bounds {
    fn of(points: impl Iterator<Item = Coordinates>) -> Option<Self> {
        points.fold(None, |acc: Option<Self>, p| {
            let (lat, lng) = (p.latitude(), p.longitude());
            Some(match acc {
                None => Self {
                    min_lat: lat,
                    max_lat: lat,
                    min_lng: lng,
                    max_lng: lng,
                },
                Some(b) => Self {
                    min_lat: b.min_lat.min(lat),
                    max_lat: b.max_lat.max(lat),
                    min_lng: b.min_lng.min(lng),
                    max_lng: b.max_lng.max(lng),
                },
            })
        })
    }

    fn midpoint(&self) -> Coordinates {
        // Midpoints of valid ranges are themselves in range.
        Coordinates::in_range(
            (self.max_lat + self.min_lat) / 2.0,
            (self.max_lng + self.min_lng) / 2.0,
        )
    }
}
