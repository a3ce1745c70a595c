pub mod recipients;
