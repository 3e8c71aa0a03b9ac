pub mod detection_event;
pub mod detection_gate;
pub mod effect_definition;
pub mod face_presence;
