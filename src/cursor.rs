use crate::error::ContextError;

/// The vertical position the layout is currently at. It can only ever move down the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
}

impl Cursor {
    pub fn new(y: f32) -> Self {
        Cursor { y }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Moves the cursor down by `distance` points, refusing any distance that would move it up.
    pub fn move_down(&mut self, distance: f32) -> Result<(), ContextError> {
        if !(distance >= 0.0 && distance.is_finite()) {
            return Err(ContextError::with_context(format!(
                "Unable to move the cursor by {} points from y = {}, it can only move down",
                distance, self.y
            )));
        }
        self.y -= distance;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves_down_only() {
        let mut cursor = Cursor::new(562.0);
        cursor.move_down(35.0).unwrap();
        cursor.move_down(0.0).unwrap();
        assert_eq!(cursor.y(), 527.0);

        assert!(cursor.move_down(-14.0).is_err());
        assert!(cursor.move_down(f32::NAN).is_err());
        assert_eq!(cursor.y(), 527.0);
    }
}
