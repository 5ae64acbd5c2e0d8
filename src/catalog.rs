use serde::{Deserialize, Serialize};

/// Loop indices as numbered inside a view
pub const LOOP_DOWN: usize = 0;
pub const LOOP_LEFT: usize = 1;
pub const LOOP_RIGHT: usize = 2;
pub const LOOP_UP: usize = 3;
pub const LOOP_DOWN_RIGHT: usize = 4;
pub const LOOP_UP_RIGHT: usize = 5;
pub const LOOP_DOWN_LEFT: usize = 6;
pub const LOOP_UP_LEFT: usize = 7;

/// A single frame of a loop
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Sprite shown for this frame
    pub sprite: u32,
    /// Extra ticks this frame stays on screen
    #[serde(default)]
    pub delay: i32,
    /// Draw the sprite mirrored horizontally
    #[serde(default)]
    pub flipped: bool,
    /// Sprite width in room units, used for the default blocking footprint
    #[serde(default = "default_frame_width")]
    pub width: i32,
}

fn default_frame_width() -> i32 { 24 }

impl Frame {
    pub fn new(sprite: u32, delay: i32) -> Self {
        Frame {
            sprite,
            delay,
            flipped: false,
            width: default_frame_width(),
        }
    }
}

/// An ordered list of frames, one loop per direction in a walking view
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    pub frames: Vec<Frame>,
}

impl Loop {
    pub fn new(frames: Vec<Frame>) -> Self {
        Loop { frames }
    }

    /// Loop made of `count` frames with consecutive sprite numbers
    pub fn uniform(first_sprite: u32, count: usize, delay: i32) -> Self {
        let frames = (0..count)
            .map(|i| Frame::new(first_sprite + i as u32, delay))
            .collect();
        Loop { frames }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// A view: the loops of one animated body
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub loops: Vec<Loop>,
}

impl View {
    pub fn new(loops: Vec<Loop>) -> Self {
        View { loops }
    }

    /// Walking view with `loop_count` loops of `frames_per_loop` frames each
    pub fn walking(loop_count: usize, frames_per_loop: usize, delay: i32) -> Self {
        let loops = (0..loop_count)
            .map(|l| Loop::uniform((l * frames_per_loop) as u32, frames_per_loop, delay))
            .collect();
        View { loops }
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Number of frames in a loop, 0 if the loop does not exist
    pub fn frame_count(&self, loop_index: usize) -> usize {
        self.loops.get(loop_index).map_or(0, Loop::frame_count)
    }

    /// Whether the loop exists and has at least one frame
    pub fn has_frames(&self, loop_index: usize) -> bool {
        self.frame_count(loop_index) > 0
    }

    pub fn frame(&self, loop_index: usize, frame: usize) -> Option<&Frame> {
        self.loops.get(loop_index)?.frames.get(frame)
    }

    /// First loop that has any frames
    pub fn first_loop_with_frames(&self) -> Option<usize> {
        self.loops.iter().position(|l| !l.is_empty())
    }
}

/// Read-only collection of views shared by every character
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationCatalog {
    pub views: Vec<View>,
}

impl AnimationCatalog {
    pub fn new(views: Vec<View>) -> Self {
        AnimationCatalog { views }
    }

    /// Load a catalog from its JSON description
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn view(&self, view: usize) -> Option<&View> {
        self.views.get(view)
    }

    /// Loop lookup, `None` if either index is out of range
    pub fn get_loop(&self, view: usize, loop_index: usize) -> Option<&Loop> {
        self.views.get(view)?.loops.get(loop_index)
    }

    /// Number of frames in a loop of a view, 0 when missing
    pub fn frame_count(&self, view: usize, loop_index: usize) -> usize {
        self.view(view).map_or(0, |v| v.frame_count(loop_index))
    }
}
