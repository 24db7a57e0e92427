//! Multi-region cloud inventory collector
//!
//! Enumerates compute instances, managed clusters, database instances and
//! object storage buckets across every enabled region of an AWS account and
//! reports them as one JSON document, keyed by region, alongside a ledger of
//! the regions that could not be read.

pub mod aws;
pub mod config;
pub mod error;
pub mod inventory;
pub mod provider;
