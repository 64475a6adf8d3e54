pub mod background_row_estimator;
