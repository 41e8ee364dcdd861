//! HTTP collaborators for the search core: the signed listing transport and
//! the community/school lookup client.

pub mod lookup;
pub mod transport;

use homesearch_core::config::AppConfig;
use homesearch_core::{FilterNormalizer, ListingService, RequestBuilder};
use thiserror::Error;

pub use lookup::{lookup_results, lookup_url, HttpEntityResolver};
pub use transport::HttpTransport;

pub type HttpListingService = ListingService<HttpEntityResolver, HttpTransport>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Wires a [`ListingService`] over real HTTP from loaded configuration.
pub fn listing_service(config: &AppConfig) -> Result<HttpListingService, ClientError> {
    let resolver = HttpEntityResolver::from_config(&config.lookup)?;
    let transport = HttpTransport::from_config(&config.api)?;
    Ok(ListingService::new(
        FilterNormalizer::new(resolver, config.search.page_size),
        RequestBuilder::from_config(&config.api),
        transport,
        config.search.site_base_url.clone(),
    ))
}
