//! Star-history accumulation and trend prediction.
//!
//! # Overview
//!
//! This crate turns a paginated stream of timestamped star events into daily
//! counts and running cumulative totals per repository, and extrapolates when
//! one repository's cumulative series will overtake another's.
//!
//! The [`accumulate`] module holds the pure bookkeeping: daily buckets,
//! baseline reconciliation for backfilled windows, and the fold that turns
//! deltas into a monotone cumulative series. The [`predict`] module fits
//! short-horizon least-squares trends over several lookback windows and
//! aggregates them into a single crossing prediction. Neither module touches
//! the network, so both are testable with synthetic data.
//!
//! The `api` feature exposes the [`api::StarClient`] trait implemented by
//! concrete HTTP clients; the `fetch` feature adds the pagination loop that
//! drives such a client, one task per repository.

pub mod accumulate;
#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod predict;
