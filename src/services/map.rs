// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Marker and heatmap layers for the sightings map.

use crate::models::PigeonReport;
use geo::{BoundingRect, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Serialize, Serializer};

/// Parse a stored `"<lat>, <lng>"` string.
///
/// Returns `None` for anything that is not two finite numbers separated by
/// a comma.
pub fn parse_location(location: &str) -> Option<(f64, f64)> {
    let (lat, lng) = location.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
}

const HEAT_GRADIENT: &[(&str, &str)] = &[("0.4", "blue"), ("0.65", "lime"), ("1", "red")];

fn serialize_gradient<S: Serializer>(
    gradient: &&'static [(&'static str, &'static str)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(gradient.iter().copied())
}

/// Fixed rendering parameters for the density layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapOptions {
    pub radius: u32,
    pub blur: u32,
    pub max_zoom: u32,
    pub max: f64,
    #[serde(serialize_with = "serialize_gradient")]
    pub gradient: &'static [(&'static str, &'static str)],
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            radius: 25,
            blur: 15,
            max_zoom: 18,
            max: 1.0,
            gradient: HEAT_GRADIENT,
        }
    }
}

/// Initial map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// `[lat, lng]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for Viewport {
    /// Bahía Blanca city centre
    fn default() -> Self {
        Self {
            center: [-38.7183, -62.2661],
            zoom: 13,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub report_id: String,
    pub lat: f64,
    pub lng: f64,
    pub pigeon_count: u32,
    pub alias: String,
    pub timestamp: String,
}

/// `[lat, lng, weight]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint(pub f64, pub f64, pub f64);

/// A map instance: configured once, re-synced whenever the reports change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub viewport: Viewport,
    pub heatmap: HeatmapOptions,
    pub markers: Vec<MapMarker>,
    pub heat: Vec<HeatPoint>,
    /// `[[south, west], [north, east]]` of all markers
    pub bounds: Option<[[f64; 2]; 2]>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new()
    }
}

impl MapView {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::default(),
            heatmap: HeatmapOptions::default(),
            markers: Vec::new(),
            heat: Vec::new(),
            bounds: None,
        }
    }

    /// Build a view already synced to `reports`.
    pub fn from_reports(reports: &[PigeonReport]) -> Self {
        let mut view = Self::new();
        view.sync(reports);
        view
    }

    /// Replace every marker and heat point. Reports with an unparseable
    /// location are skipped.
    pub fn sync(&mut self, reports: &[PigeonReport]) {
        self.markers.clear();
        self.heat.clear();

        for report in reports {
            let Some((lat, lng)) = parse_location(&report.location) else {
                tracing::trace!(report_id = %report.id, "Skipping unparseable location");
                continue;
            };

            self.markers.push(MapMarker {
                report_id: report.id.clone(),
                lat,
                lng,
                pigeon_count: report.pigeon_count,
                alias: report.alias.clone(),
                timestamp: report.timestamp.clone(),
            });
            self.heat
                .push(HeatPoint(lat, lng, f64::from(report.pigeon_count)));
        }

        let points: MultiPoint<f64> = self
            .markers
            .iter()
            .map(|m| Point::new(m.lng, m.lat))
            .collect();
        self.bounds = points
            .bounding_rect()
            .map(|rect| [[rect.min().y, rect.min().x], [rect.max().y, rect.max().x]]);
    }

    /// Markers as a GeoJSON FeatureCollection (`[lng, lat]` order).
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let point = Point::new(marker.lng, marker.lat);

                let mut properties = JsonObject::new();
                properties.insert("reportId".to_string(), marker.report_id.clone().into());
                properties.insert("pigeonCount".to_string(), marker.pigeon_count.into());
                properties.insert("alias".to_string(), marker.alias.clone().into());
                properties.insert("timestamp".to_string(), marker.timestamp.clone().into());

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&point))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
