#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod history;
pub mod optimistic;
pub mod service;
pub mod telemetry;
pub mod url;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the main surface at crate root for convenience
pub use crate::clock::{SystemTimeSource, TimeSource, WallClock};
pub use crate::config::StateConfig;
pub use crate::controller::{ProductController, ProductsAction, ProductsState};
pub use crate::core::{
    NewProduct, Patch, Priority, Product, ProductFilters, ProductId, ProductPatch,
};
pub use crate::history::{KeyChord, UndoStack};
pub use crate::optimistic::{Mutation, OptimisticTracker};
pub use crate::service::{
    Navigator, Notice, Notifier, ProductPage, ProductService, ServiceError,
};
pub use crate::url::{parse_url_state, UrlState};
