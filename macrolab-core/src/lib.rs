//! MacroLab Core: collection of Brazilian and US macroeconomic time series.
//!
//! This crate contains the collection pipeline:
//! - Domain types (sources, frequencies, series requests, tables, windows)
//! - A retrying fetcher over a pluggable transport
//! - One adapter per provider (SGS, OData, IPEADATA, SIDRA, FRED, IFI)
//! - The orchestrator that buckets collected series by frequency
//! - Harmonization into wide frames and parquet storage

pub mod clock;
pub mod config;
pub mod data;
pub mod domain;
