use image::metadata::Orientation;

/// One still photo as it came off the capture device: encoded image bytes
/// plus the orientation to stamp on it when it is re-encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    data: Vec<u8>,
    orientation: Orientation,
}

impl CapturedFrame {
    pub fn new(data: Vec<u8>, orientation: Orientation) -> Self {
        Self { data, orientation }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let frame = CapturedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xD9], Orientation::Rotate90);
        assert_eq!(frame.len(), 4);
        assert!(!frame.is_empty());
        assert_eq!(frame.orientation(), Orientation::Rotate90);
        assert_eq!(frame.data()[..2], [0xFF, 0xD8]);
    }
}
