/// Answers whether a face is visible in the live stream right now.
///
/// This is the seam where a platform face detector plugs into the polling
/// effect; the detection algorithm itself lives outside this crate.
pub trait FacePresence: Send {
    fn face_present(&mut self) -> bool;
}

/// Reports the same answer on every poll.
pub struct ConstantPresence(pub bool);

impl FacePresence for ConstantPresence {
    fn face_present(&mut self) -> bool {
        self.0
    }
}
