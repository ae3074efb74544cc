//! Globe camera surface.
//!
//! The navigation controller drives whatever renders the globe through this
//! trait. `HeadlessGlobe` records every motion and is the only
//! implementation this crate ships; a real renderer lives on the other side
//! of the API.

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Camera altitudes in globe radii.
pub const ALT_REGION_DEFAULT: f64 = 2.0;
pub const ALT_COUNTRY: f64 = 1.0;
pub const ALT_SUB_PLACE: f64 = 0.35;
pub const ALT_PINS: f64 = 0.15;

#[derive(Debug, Clone, Serialize)]
pub struct CameraTarget {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pin {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

/// A billboard photo anchored to a tab's place.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoMarker {
    pub tab_id: u64,
    pub lat: f64,
    pub lng: f64,
    pub url: String,
}

pub trait GlobeSurface: Send {
    fn fly_to(&mut self, target: CameraTarget);
    fn show_photo_marker(&mut self, marker: PhotoMarker);
    /// Markers are keyed by tab id; closing a tab must drop its marker.
    fn remove_marker(&mut self, tab_id: u64);
    fn drop_pin(&mut self, pin: Pin);
    fn clear_pins(&mut self);
}

/// Records camera motions, markers, and pins without rendering anything.
#[derive(Default)]
pub struct HeadlessGlobe {
    pub flights: Vec<CameraTarget>,
    pub markers: Vec<PhotoMarker>,
    pub pins: Vec<Pin>,
}

impl HeadlessGlobe {
    pub fn last_flight(&self) -> Option<&CameraTarget> {
        self.flights.last()
    }
}

impl GlobeSurface for HeadlessGlobe {
    fn fly_to(&mut self, target: CameraTarget) {
        self.flights.push(target);
    }

    fn show_photo_marker(&mut self, marker: PhotoMarker) {
        self.markers.retain(|m| m.tab_id != marker.tab_id);
        self.markers.push(marker);
    }

    fn remove_marker(&mut self, tab_id: u64) {
        self.markers.retain(|m| m.tab_id != tab_id);
    }

    fn drop_pin(&mut self, pin: Pin) {
        self.pins.push(pin);
    }

    fn clear_pins(&mut self) {
        self.pins.clear();
    }
}

// Lets the controller and an observer share one recorder.
impl<G: GlobeSurface> GlobeSurface for Arc<Mutex<G>> {
    fn fly_to(&mut self, target: CameraTarget) {
        self.lock().unwrap().fly_to(target);
    }

    fn show_photo_marker(&mut self, marker: PhotoMarker) {
        self.lock().unwrap().show_photo_marker(marker);
    }

    fn remove_marker(&mut self, tab_id: u64) {
        self.lock().unwrap().remove_marker(tab_id);
    }

    fn drop_pin(&mut self, pin: Pin) {
        self.lock().unwrap().drop_pin(pin);
    }

    fn clear_pins(&mut self) {
        self.lock().unwrap().clear_pins();
    }
}
