use serde::{Deserialize, Serialize};

use crate::pathfinding::Point;

/// Rows covered above the feet without a blocking height
const DEFAULT_ROWS_ABOVE: i32 = 2;
/// Rows covered below the feet without a blocking height
const DEFAULT_ROWS_BELOW: i32 = 3;
/// Sprite width minus this gives the default blocking width
const SPRITE_WIDTH_MARGIN: i32 = 4;

/// Ground rectangle a character blocks for others, in room units.
/// `left..right` and `top..bottom` are half-open ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Footprint {
    /// Footprint centered on the feet at `origin`.
    ///
    /// A blocking width below 1 falls back to the sprite width minus a small
    /// margin. A blocking height below 1 covers `y-2 ..= y+3`.
    /// The horizontal extent is clipped to the room.
    pub fn around(origin: Point, blocking_width: i32, blocking_height: i32, sprite_width: i32, room_width: i32) -> Self {
        let mut width = if blocking_width < 1 {
            sprite_width - SPRITE_WIDTH_MARGIN
        } else {
            blocking_width
        };

        let mut left = origin.x - width / 2;
        if left < 0 {
            width += left;
            left = 0;
        }
        if left + width >= room_width {
            width = room_width - left;
        }

        let (top, bottom) = if blocking_height > 0 {
            (origin.y - blocking_height / 2, origin.y + (blocking_height + 1) / 2)
        } else {
            (origin.y - DEFAULT_ROWS_ABOVE, origin.y + DEFAULT_ROWS_BELOW + 1)
        };

        Footprint {
            left,
            right: left + width.max(0),
            top,
            bottom,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// Whether a character standing at `mover` is inside another character's footprint
pub fn footprint_overlap(mover: Point, other: &Footprint) -> bool {
    other.contains(mover)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_blocking_size() {
        let fp = Footprint::around(Point::new(100, 50), 10, 4, 30, 320);
        assert_eq!(fp, Footprint { left: 95, right: 105, top: 48, bottom: 52 });
        assert!(footprint_overlap(Point::new(95, 48), &fp));
        assert!(!footprint_overlap(Point::new(105, 50), &fp));
        assert!(!footprint_overlap(Point::new(100, 52), &fp));
    }

    #[test]
    fn test_default_size_from_sprite() {
        let fp = Footprint::around(Point::new(100, 50), 0, 0, 24, 320);
        assert_eq!(fp.right - fp.left, 20);
        assert_eq!((fp.top, fp.bottom), (48, 54));
    }

    #[test]
    fn test_clipped_to_room() {
        let fp = Footprint::around(Point::new(2, 50), 10, 0, 24, 320);
        assert_eq!((fp.left, fp.right), (0, 7));
        let fp = Footprint::around(Point::new(318, 50), 10, 0, 24, 320);
        assert_eq!((fp.left, fp.right), (313, 320));
    }
}
