/// Which attribute classes the face service should compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Identification support; the mirror never asks for it.
    pub return_face_id: bool,
    pub landmarks: bool,
    pub attributes: bool,
    pub head_pose: bool,
}

impl AnalysisRequest {
    /// Landmarks, attributes and head pose; no identification.
    pub const MIRROR: AnalysisRequest = AnalysisRequest {
        return_face_id: false,
        landmarks: true,
        attributes: true,
        head_pose: true,
    };

    /// Attribute names in the form the detect endpoint expects.
    pub fn attribute_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.attributes {
            names.extend_from_slice(&["age", "gender", "smile", "glasses"]);
        }
        if self.head_pose {
            names.push("headPose");
        }
        names
    }
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self::MIRROR
    }
}
