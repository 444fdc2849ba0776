use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Interactive chat mode
    Chat,
    /// Autonomous action mode
    Auto,
}

impl Mode {
    /// Accepts the number or the name, ignoring case and surrounding whitespace.
    pub fn from_choice(choice: &str) -> Option<Mode> {
        match choice.trim().to_lowercase().as_str() {
            "1" | "chat" => Some(Mode::Chat),
            "2" | "auto" => Some(Mode::Auto),
            _ => None,
        }
    }
}

/// Prompt until a valid mode is entered. End of input is an error.
pub async fn choose_mode<R, W>(input: &mut R, out: &mut W) -> Result<Mode>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        writeln!(out, "\nAvailable modes:")?;
        writeln!(out, "1. chat    - Interactive chat mode")?;
        writeln!(out, "2. auto    - Autonomous action mode")?;
        write!(out, "\nChoose a mode (enter number or name): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            return Err(Error::InputClosed);
        }

        if let Some(mode) = Mode::from_choice(&line) {
            return Ok(mode);
        }
        writeln!(out, "Invalid choice. Please try again.")?;
    }
}
