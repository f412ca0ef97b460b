//! Controller configuration: the JSON document and its compiled form.
//!
//! ```no_run
//! use pedalchord_core::config::{compile, ControllerDocument};
//!
//! let document = ControllerDocument::load("conf/controller.json")?;
//! let controller = compile(&document)?;
//! println!("{} banks", controller.banks().len());
//! # Ok::<(), pedalchord_core::Error>(())
//! ```

mod compile;
pub mod document;
mod model;

pub use compile::compile;
pub use document::{ControllerDocument, Scalar};
pub use model::{
    Bank, BankSelect, Controller, NoteMessage, OnBankChange, Pedal, PedalRef, QuitStatus, Trigger,
    CC_LAST_BANK, CC_LIST_BANKS, CC_NEXT_BANK, CC_PANIC, CC_PREVIOUS_BANK, MAX_DIRECT_BANK,
};
