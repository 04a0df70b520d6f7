//! Terminal bell as the "match found" sound.

use std::io::Write;

use cohstats_core::refine::AudioCue;

pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&self, volume: f32) -> cohstats_core::Result<()> {
        // The bell has no volume; muted means silent.
        if volume <= 0.0 {
            return Ok(());
        }
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}
