pub mod polling_detection_effect;
