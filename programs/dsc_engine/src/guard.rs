use std::cell::Cell;
use std::rc::Rc;

use anchor_lang::prelude::*;

use crate::error::DscError;

/// Non-reentrancy flag shared by the engine and anything it hands a clone to.
#[derive(Clone, Debug, Default)]
pub struct ReentrancyGuard {
    entered: Rc<Cell<bool>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock; it is released when the returned token drops.
    pub fn enter(&self) -> Result<Entered> {
        require!(!self.entered.get(), DscError::Reentrancy);
        self.entered.set(true);
        Ok(Entered {
            entered: Rc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

#[must_use = "the lock is released as soon as this is dropped"]
#[derive(Debug)]
pub struct Entered {
    entered: Rc<Cell<bool>>,
}

impl Drop for Entered {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}
