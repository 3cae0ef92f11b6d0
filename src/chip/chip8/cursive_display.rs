use cursive::{
    theme::{BaseColor, Color, ColorStyle},
    view::View,
    Printer, Vec2,
};

use crate::chip::chip8::constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};

/// Represents the display of the Chip 8. It holds a snapshot of the output
/// pins, so the machine itself never has to be shared with the UI thread.
pub struct Display {
    pixels: [bool; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
}

impl Display {
    /// Creates a new display from a slice of row major pixels. Missing
    /// pixels stay off, surplus ones are ignored.
    pub fn new(pixels: &[bool]) -> Self {
        let mut tmp = [false; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT];
        let len = pixels.len().min(tmp.len());
        tmp[..len].copy_from_slice(&pixels[..len]);
        Display { pixels: tmp }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < CHIP8_DISPLAY_WIDTH
            && y < CHIP8_DISPLAY_HEIGHT
            && self.pixels[x + CHIP8_DISPLAY_WIDTH * y]
    }

    /// A paused marker is drawn into the top left corner.
    pub fn paused(self) -> PausedDisplay {
        PausedDisplay { display: self }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Implements cursive::view::View for Display to enable drawing it
/// as a View out of the box.
impl View for Display {
    fn draw(&self, printer: &Printer) {
        printer.with_color(
            ColorStyle::new(Color::Dark(BaseColor::Black), Color::RgbLowRes(0, 0, 0)),
            |printer| {
                for x in 0..CHIP8_DISPLAY_WIDTH {
                    for y in 0..CHIP8_DISPLAY_HEIGHT {
                        if self.is_set(x, y) {
                            printer.print((x, y), " ");
                        }
                    }
                }
            },
        );
    }

    fn required_size(&mut self, _: Vec2) -> Vec2 {
        Vec2 {
            x: CHIP8_DISPLAY_WIDTH,
            y: CHIP8_DISPLAY_HEIGHT,
        }
    }
}

/// A display showing that execution is paused.
pub struct PausedDisplay {
    display: Display,
}

impl View for PausedDisplay {
    fn draw(&self, printer: &Printer) {
        self.display.draw(printer);
        printer.print((0, 0), "|| paused");
    }

    fn required_size(&mut self, constraint: Vec2) -> Vec2 {
        self.display.required_size(constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::Display;

    #[test]
    fn test_new_from_short_slice() {
        let display = Display::new(&[false, true]);
        assert!(display.is_set(1, 0));
        assert!(!display.is_set(0, 0));
        assert!(!display.is_set(63, 31));
    }

    #[test]
    fn test_out_of_range_pixels_are_off() {
        let display = Display::new(&[true; 64 * 32]);
        assert!(display.is_set(63, 31));
        assert!(!display.is_set(64, 0));
        assert!(!display.is_set(0, 32));
    }
}
