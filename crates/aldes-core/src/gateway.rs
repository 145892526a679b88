// ── Product gateway seam ──
//
// The two remote calls the product model needs. `AldesClient` is the
// production implementation; tests plug in scripted fakes.

use std::future::Future;

use aldes_api::{AldesClient, ProductDocument};

use crate::error::CoreError;

/// Remote operations a [`Product`](crate::Product) performs.
pub trait ProductGateway: Send + Sync + 'static {
    /// Fetch the current status document of a product.
    fn get_product(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<ProductDocument, CoreError>> + Send;

    /// Ask the product to switch to the mode with the given firmware code.
    fn request_set_mode(
        &self,
        id: &str,
        code: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl ProductGateway for AldesClient {
    async fn get_product(&self, id: &str) -> Result<ProductDocument, CoreError> {
        Ok(AldesClient::get_product(self, id).await?)
    }

    async fn request_set_mode(&self, id: &str, code: &str) -> Result<(), CoreError> {
        Ok(AldesClient::request_set_mode(self, id, code).await?)
    }
}
