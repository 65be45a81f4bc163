//! Clients for the external services the agents consume

pub mod tavily;
pub mod web;
pub mod yahoo;

pub use tavily::{SearchBackend, SearchResult, TavilyClient};
pub use web::{FetchedPage, HttpFetcher, PageFetcher, WebContentFetcher, html_to_text};
pub use yahoo::{PriceBar, PriceSource, YahooPriceSource};
