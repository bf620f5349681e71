pub mod banner;

pub use banner::BannerWidget;
