//! Core library for Lanas lead intake.
//!
//! Contains the field catalog, the multi-step form state machine and its
//! step validator, the normalizer that turns a draft into a lead record, the
//! lead store, the confirmation notifier seam, the submission pipeline and
//! the CSV export. This crate depends on `lanas-storage` for the storage
//! backend trait and knows nothing about HTTP or email transports.

pub mod catalog;
pub mod error;
pub mod export;
pub mod form;
pub mod lead;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod steps;
pub mod store;
