pub mod aggregate;
pub mod browser;
pub mod calendar;
pub mod embedded;
pub mod error;
pub mod fetch;
pub mod markup;
pub mod normalize;
pub mod sites;
pub mod types;

pub use aggregate::{Aggregator, FlavorSource};
pub use browser::{ChromeConfig, ChromeRenderer, RenderSession, Renderer};
pub use error::ScraperError;
pub use fetch::{FetchConfig, FetchPath, FetchedPage, PageFetcher};
pub use markup::{Node, ParsedMarkup};
pub use normalize::normalize_flavor;
pub use sites::{default_sites, ScrapeContext, SiteExtractor};
pub use types::{Extraction, RawFlavor, Strategy};
