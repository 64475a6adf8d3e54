pub mod dct_fingerprinter;
