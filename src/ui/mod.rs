//! UI collaborator: the banner surface the engine drives, plus terminal
//! styling for the CLI.

pub mod banner;
pub mod style;

pub use banner::{BANNER_ELEMENT_ID, BannerPresenter, DocumentBanner, MANAGE_ELEMENT_ID};
