// src/services/extractor.rs

//! Listing extractor.
//!
//! Turns a results page into `ListingItem`s in document order. Malformed
//! markup never fails: missing fields fall back to placeholders and a page
//! without listing containers yields nothing.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ExtractorConfig, ListingItem, NO_ADDRESS, NO_DATE, NO_PRICE, NO_TITLE};
use crate::utils::{normalize_whitespace, resolve_url};

/// Log target for anti-bot challenge pages, kept apart from ordinary
/// "no listings" results.
pub const CHALLENGE_LOG_TARGET: &str = "yad2_watch::challenge";

/// What a page turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The site answered with its bot-challenge page
    Challenge,
    /// Listing containers found on the page, possibly none
    Listings(Vec<ListingItem>),
}

impl Extraction {
    pub fn into_items(self) -> Vec<ListingItem> {
        match self {
            Extraction::Challenge => Vec::new(),
            Extraction::Listings(items) => items,
        }
    }
}

/// Parses listing pages using configured selectors.
pub struct Extractor {
    page_title: Selector,
    item: Selector,
    title: Selector,
    price: Selector,
    address: Selector,
    date: Selector,
    image: Selector,
    id_attributes: Vec<String>,
    challenge_marker: String,
    link_template: String,
}

impl Extractor {
    /// Build an extractor, rejecting invalid selectors up front.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            page_title: Self::parse_selector("title")?,
            item: Self::parse_selector(&config.item_selector)?,
            title: Self::parse_selector(&config.title_selector)?,
            price: Self::parse_selector(&config.price_selector)?,
            address: Self::parse_selector(&config.address_selector)?,
            date: Self::parse_selector(&config.date_selector)?,
            image: Self::parse_selector(&config.image_selector)?,
            id_attributes: config.id_attributes.clone(),
            challenge_marker: config.challenge_marker.clone(),
            link_template: config.link_template.clone(),
        })
    }

    /// Extract listings, treating a challenge page as an empty result.
    pub fn extract(&self, html: &str) -> Vec<ListingItem> {
        self.parse(html, None).into_items()
    }

    /// Parse a page, distinguishing challenge pages from real results.
    ///
    /// Relative image URLs are resolved against `base` when given.
    pub fn parse(&self, html: &str, base: Option<&Url>) -> Extraction {
        let document = Html::parse_document(html);

        if self.is_challenge(&document) {
            log::warn!(
                target: CHALLENGE_LOG_TARGET,
                "Challenge page detected, the site is throttling requests. Try again later."
            );
            return Extraction::Challenge;
        }

        let items: Vec<ListingItem> = document
            .select(&self.item)
            .map(|container| self.parse_item(container, base))
            .collect();

        log::info!("Found {} listings on the page", items.len());
        Extraction::Listings(items)
    }

    fn is_challenge(&self, document: &Html) -> bool {
        if self.challenge_marker.is_empty() {
            return false;
        }
        document
            .select(&self.page_title)
            .next()
            .map(|title| title.text().collect::<String>().contains(&self.challenge_marker))
            .unwrap_or(false)
    }

    fn parse_item(&self, container: ElementRef<'_>, base: Option<&Url>) -> ListingItem {
        let id = self
            .id_attributes
            .iter()
            .find_map(|attr| {
                container
                    .value()
                    .attr(attr)
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
            })
            .map(str::to_string);

        let image_url = container
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(|src| match base {
                Some(base) => resolve_url(base, src),
                None => src.to_string(),
            });

        let detail_link = id
            .as_deref()
            .map(|id| self.link_template.replace("{id}", id));

        ListingItem {
            title: Self::text_or(container, &self.title, NO_TITLE),
            price: Self::text_or(container, &self.price, NO_PRICE),
            address: Self::text_or(container, &self.address, NO_ADDRESS),
            posted_date: Self::text_or(container, &self.date, NO_DATE),
            image_url,
            detail_link,
            id,
        }
    }

    fn text_or(container: ElementRef<'_>, selector: &Selector, placeholder: &str) -> String {
        container
            .select(selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| placeholder.to_string())
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
