//! Listing data structure.

use serde::{Deserialize, Serialize};

/// Placeholder used when a listing has no title element.
pub const NO_TITLE: &str = "No title";
/// Placeholder used when a listing has no price element.
pub const NO_PRICE: &str = "Price not listed";
/// Placeholder used when a listing has no address element.
pub const NO_ADDRESS: &str = "Address not listed";
/// Placeholder used when a listing has no date element.
pub const NO_DATE: &str = "Date not listed";

/// A single listing extracted from a results page.
///
/// Field names on disk follow the state file format:
/// `id, title, price, address, date, image, link`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingItem {
    /// External listing identifier, absent when the page omits it
    #[serde(default)]
    pub id: Option<String>,

    /// Listing title
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Display price
    #[serde(default = "defaults::price")]
    pub price: String,

    /// Street / neighbourhood line
    #[serde(default = "defaults::address")]
    pub address: String,

    /// Posting date as shown on the page
    #[serde(rename = "date", default = "defaults::date")]
    pub posted_date: String,

    /// Thumbnail image URL
    #[serde(rename = "image", default)]
    pub image_url: Option<String>,

    /// Link to the listing's detail page
    #[serde(rename = "link", default)]
    pub detail_link: Option<String>,
}

impl ListingItem {
    /// Create an item with placeholder display fields.
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            title: NO_TITLE.to_string(),
            price: NO_PRICE.to_string(),
            address: NO_ADDRESS.to_string(),
            posted_date: NO_DATE.to_string(),
            image_url: None,
            detail_link: None,
        }
    }

    /// Link for display, `#` when the listing has none.
    pub fn link_or_placeholder(&self) -> &str {
        self.detail_link.as_deref().unwrap_or("#")
    }
}

mod defaults {
    pub fn title() -> String {
        super::NO_TITLE.into()
    }
    pub fn price() -> String {
        super::NO_PRICE.into()
    }
    pub fn address() -> String {
        super::NO_ADDRESS.into()
    }
    pub fn date() -> String {
        super::NO_DATE.into()
    }
}
