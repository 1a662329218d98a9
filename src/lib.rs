//! HTTP CRUD service over a JSON-file-backed collection of cars.
//!
//! The [`Collection`] keeps records in a pluggable map backend, hands out
//! monotonic identifiers and rewrites one JSON document after every mutation.
//! [`handlers::router`] exposes it over four `POST /car/*` routes.
//!
//! ```rust,no_run
//! use car_store::{Car, CarStore};
//!
//! let cars = CarStore::open("cars.json").unwrap();
//! let id = cars
//!     .insert(Car {
//!         name: "Ibiza".into(),
//!         color: "red".into(),
//!         manufacturer: "Seat".into(),
//!         model: "FR".into(),
//!         year: "2019".into(),
//!     })
//!     .unwrap();
//! assert_eq!(cars.at(1).map(|r| r.id), Some(id));
//! ```
//!
//! **Single-process only.** Two processes opening the same file will clobber
//! each other.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod flush;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod persist;
pub mod serializer;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use flush::FlushPolicy;
pub use model::{Car, CarPatch, Record, RecordId};
pub use store::{Collection, CollectionBuilder};

/// Default backend: an ordered map behind a `parking_lot` read-write lock.
pub type DefaultBackend<V> = parking_lot::RwLock<std::collections::BTreeMap<RecordId, V>>;

/// The car collection served over HTTP.
pub type CarStore = Collection<Car>;
