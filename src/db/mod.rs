//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Confirmed pigeon sightings
    pub const REPORTS: &str = "reports";
    /// User feedback
    pub const ISSUES: &str = "issues";
}
