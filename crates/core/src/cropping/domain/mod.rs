pub mod crop_estimator;
