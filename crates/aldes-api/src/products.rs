// Product endpoints: listing, per-product document, mode command.

use tracing::info;

use crate::client::AldesClient;
use crate::error::Error;
use crate::models::{CommandRequest, ProductDocument, ProductSummary};

const PRODUCTS_PATH: &str = "aldesoc/v5/users/me/products";

impl AldesClient {
    /// List every product registered on the account.
    pub async fn list_products(&self) -> Result<Vec<ProductSummary>, Error> {
        let url = self.api_url(PRODUCTS_PATH)?;
        self.get_json(url).await
    }

    /// Fetch the current status document of one product.
    pub async fn get_product(&self, id: &str) -> Result<ProductDocument, Error> {
        let url = self.api_url(&format!("{PRODUCTS_PATH}/{id}"))?;
        self.get_json(url).await
    }

    /// Ask the device to switch to the mode with the given code.
    ///
    /// Returns once the API has accepted the command; the device applies it
    /// asynchronously and reports the new mode on a later `get_product`.
    pub async fn request_set_mode(&self, id: &str, code: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("{PRODUCTS_PATH}/{id}/commands"))?;
        info!(product = id, mode = code, "requesting mode change");
        self.post_json(url, &CommandRequest::change_mode(code)).await
    }
}
