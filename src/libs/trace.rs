/// Run-time verbosity of the evaluation stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace {
    detailed: bool,
}

impl Trace {
    pub fn new(detailed: bool) -> Self {
        Self { detailed }
    }

    pub fn is_detailed(&self) -> bool {
        self.detailed
    }

    /// Writes a per-stage diagnostic to stdout when detailed output is on.
    pub fn stage(&self, msg: impl FnOnce() -> String) {
        if self.detailed {
            println!("{}", msg());
        }
    }
}
