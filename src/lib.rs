//! A small CHIP-8 style virtual machine. The machine has 4KB of memory with a
//! hexadecimal glyph font at the bottom and programs loaded at 0x200, sixteen
//! byte registers, a sixteen level call stack, a 64x32 monochrome framebuffer
//! and two countdown timers. The instruction set follows the table described
//! [here](https://en.wikipedia.org/wiki/CHIP-8#Opcode_table), except that
//! sprites are clipped at the screen edges instead of wrapping around.
//!
//! The machine itself lives in [`chip::chip8`], the threaded cycle driver in
//! [`chip::runner`]. For graphical output the text UI relies on the cursive
//! text user interface library.
pub mod chip;
