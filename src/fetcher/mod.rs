//! Comic fetchers
//!
//! This module provides:
//! - The `ComicFetcher` abstraction used by the worker pool
//! - The HTTP implementation against the public xkcd JSON API
//!
//! The pipeline never talks to the network directly. Everything
//! goes through `ComicFetcher`, which keeps the pool testable with
//! scripted fetchers.

pub mod adapter;
pub mod xkcd;
