//! AWS API interaction module
//!
//! The concrete [`CloudApi`](crate::provider::CloudApi) the binary runs
//! against: credential resolution, SigV4 request signing and decoding of the
//! XML and JSON wire formats.
//!
//! # Module Structure
//!
//! - [`credentials`] - static credentials from the environment or `~/.aws/credentials`
//! - [`client`] - per-service URLs and the `CloudApi` implementation
//! - [`http`] - signed requests, error documents, XML to JSON
//!
//! # Example
//!
//! ```ignore
//! use cloud_inventory::aws::client::AwsClient;
//! use cloud_inventory::provider::CloudApi;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = AwsClient::new("default", None, None)?;
//!     let regions = client.list_regions("us-east-1").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod credentials;
pub mod http;
