/// Create/edit dialog state. No seed means create mode, a seed means edit mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog<S> {
    Closed,
    Open { seed: Option<S> },
}

impl<S> Default for Dialog<S> {
    fn default() -> Self {
        Dialog::Closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit,
}

impl<S> Dialog<S> {
    pub fn open_create(&mut self) {
        *self = Dialog::Open { seed: None };
    }

    pub fn open_edit(&mut self, seed: S) {
        *self = Dialog::Open { seed: Some(seed) };
    }

    pub fn close(&mut self) {
        *self = Dialog::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Dialog::Open { .. })
    }

    pub fn mode(&self) -> Option<DialogMode> {
        match self {
            Dialog::Closed => None,
            Dialog::Open { seed: None } => Some(DialogMode::Create),
            Dialog::Open { seed: Some(_) } => Some(DialogMode::Edit),
        }
    }

    pub fn seed(&self) -> Option<&S> {
        match self {
            Dialog::Open { seed } => seed.as_ref(),
            Dialog::Closed => None,
        }
    }
}
