// Main library file for the attraction browser

// Export the modules of the search/render/pagination flow
pub mod api;
pub mod browser;
pub mod page;
pub mod scroll;

// Re-export key types for convenience
pub use api::{ApiError, Attraction, ClientConfig, HttpScenicSpotApi, ScenicSpotApi};
pub use browser::{
    AttractionBrowser, BrowserConfig, BrowserEvent, BrowserHandle, MORE_DATA_TEXT,
    NO_MORE_DATA_TEXT,
};
pub use page::{Indicator, PageDoc, PlaceBlock};
pub use scroll::{ScrollState, ScrollTrigger};
