use crate::model::{BogusFrame, Frame, FrameModel};

/// How method bodies get modelled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Track provenance at all
    ///
    /// When this is off, every method gets a [`BogusFrame`] and nothing about the stack can be
    /// inspected afterwards. Contract violations also go unnoticed, since nothing is counted.
    pub track_provenance: bool,

    /// Write the full frame (locals and stack) to the replay output after every instruction
    ///
    /// This is extremely verbose and only useful when chasing a miscounted stack effect.
    pub dump_each_instruction: bool,

    /// Fail a replay when it meets a mnemonic it doesn't know
    ///
    /// Otherwise the instruction is skipped with a warning, which leaves the stack model
    /// misaligned for the rest of the method.
    pub stop_on_unknown_mnemonic: bool,
}

impl Settings {
    pub fn new() -> Settings {
        Settings::default()
    }

    /// Make the frame model for a method with the given limits
    pub fn new_frame(&self, max_locals: u16, max_stack: u16) -> Box<dyn FrameModel> {
        if self.track_provenance {
            Box::new(Frame::new(max_locals, max_stack))
        } else {
            Box::new(BogusFrame::new())
        }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            track_provenance: true,
            dump_each_instruction: false,
            stop_on_unknown_mnemonic: true,
        }
    }
}
