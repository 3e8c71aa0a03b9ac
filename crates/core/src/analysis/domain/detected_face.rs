use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRectangle {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Head rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadPose {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaceAttributes {
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub smile: Option<f64>,
    pub glasses: Option<String>,
    pub head_pose: Option<HeadPose>,
}

/// One face reported by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    #[serde(default)]
    pub face_id: Option<String>,
    pub face_rectangle: FaceRectangle,
    /// Landmark name (e.g. `pupilLeft`, `noseTip`) to position.
    #[serde(default)]
    pub face_landmarks: Option<BTreeMap<String, Point>>,
    #[serde(default)]
    pub face_attributes: Option<FaceAttributes>,
}

impl DetectedFace {
    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        let r = &self.face_rectangle;
        let mut parts = vec![format!("{}x{} at ({}, {})", r.width, r.height, r.left, r.top)];
        if let Some(attrs) = &self.face_attributes {
            if let Some(age) = attrs.age {
                parts.push(format!("age {age:.0}"));
            }
            if let Some(gender) = &attrs.gender {
                parts.push(gender.clone());
            }
            if let Some(pose) = attrs.head_pose {
                parts.push(format!("yaw {:.1}", pose.yaw));
            }
        }
        parts.join(", ")
    }
}
