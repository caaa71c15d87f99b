use crate::stimulus::ImageId;
use crate::target::TargetSide;

/// Key identity as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    H,
    Other,
}

/// A single drawable element of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    FixationCross,
    Stimulus(ImageId),
    Target(ImageId, TargetSide),
    RestMessage,
}

/// What should be on screen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Frame {
    pub fixation: bool,
    pub stimulus: Option<ImageId>,
    pub target: Option<(ImageId, TargetSide)>,
    pub rest_message: bool,
}

impl Frame {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn rest() -> Self {
        Self {
            rest_message: true,
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::blank()
    }

    /// Elements in back-to-front draw order.
    pub fn elements(&self) -> Vec<Element> {
        let mut elements = Vec::with_capacity(3);
        if self.rest_message {
            elements.push(Element::RestMessage);
        }
        if self.fixation {
            elements.push(Element::FixationCross);
        }
        if let Some(image) = self.stimulus {
            elements.push(Element::Stimulus(image));
        }
        if let Some((image, side)) = self.target {
            elements.push(Element::Target(image, side));
        }
        elements
    }
}
