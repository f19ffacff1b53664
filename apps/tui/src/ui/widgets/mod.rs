pub mod heatmap;
pub mod popup;
