use crate::geometry::Point;

/// Input delivered by the host. Pointer positions are in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    KeyPress(char),
    MouseDown(Point),
    MouseMove(Point),
    MouseUp(Point),
    Click(Point),
}
