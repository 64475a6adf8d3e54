pub mod duplicate_filter;
pub mod fingerprinter;
