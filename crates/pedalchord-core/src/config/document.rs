//! The on-disk controller document.
//!
//! Field names follow the attribute names of the controller format
//! (`InChannel`, `BassPedalVelocity`, `Bank`, `Pedal`, ...). Scalar attributes
//! accept JSON numbers or strings, so `"Octave": 1` and `"Octave": "1"` are
//! the same.

use super::model::{OnBankChange, Trigger};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_BANK_SELECT_CONTROLLER: u8 = 102;

/// A number-or-string attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Number(n) => Cow::Owned(n.to_string()),
            Scalar::Text(s) => Cow::Borrowed(s.trim()),
        }
    }

    /// Comma-separated items, trimmed.
    pub fn items(&self) -> Vec<String> {
        self.as_text()
            .split(',')
            .map(|item| item.trim().to_string())
            .collect()
    }

    pub fn to_int(&self, what: &str) -> Result<i64> {
        match self {
            Scalar::Number(n) => Ok(*n),
            Scalar::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} '{}' is not a number", what, s))),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Scalar::Text(text.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n)
    }
}

/// Parses a 1-based channel into a 0-based one.
pub(crate) fn parse_channel(value: &str, what: &str) -> Result<u8> {
    match value.trim().parse::<u8>() {
        Ok(channel @ 1..=16) => Ok(channel - 1),
        _ => Err(Error::Config(format!(
            "{} '{}' must be a channel between 1 and 16",
            what, value
        ))),
    }
}

pub(crate) fn parse_channel_list(value: &Scalar, what: &str) -> Result<Vec<u8>> {
    value
        .items()
        .iter()
        .map(|item| parse_channel(item, what))
        .collect()
}

/// Attributes that can be set globally and overridden per bank and per pedal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_bass_pedal_channel: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_chord_channel: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_pedal_velocity: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_velocity: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_pedal_transpose: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_transpose: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub octave: Option<Scalar>,
}

impl Overrides {
    fn validate_channels(&self, scope: &str) -> Result<()> {
        if let Some(channels) = &self.out_bass_pedal_channel {
            parse_channel_list(channels, &format!("{} OutBassPedalChannel", scope))?;
        }
        if let Some(channels) = &self.out_chord_channel {
            parse_channel_list(channels, &format!("{} OutChordChannel", scope))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    Midi,
    SysEx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(rename = "Type", default)]
    pub kind: MessageType,
    /// Space-separated hex bytes.
    pub string: String,
}

/// `Start` / `Stop` blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBlock {
    #[serde(rename = "Message", default)]
    pub messages: Vec<MessageDocument>,
}

/// The panic command, inline or read from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanicSource {
    Inline(String),
    Node(PanicNode),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PanicNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PedalDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Scalar>,
    #[serde(flatten)]
    pub overrides: Overrides,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_note: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_notes: Option<Scalar>,
    #[serde(rename = "Message", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_select: Option<Scalar>,
    #[serde(default)]
    pub send_panic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BankDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub overrides: Overrides,
    #[serde(rename = "Pedal", default)]
    pub pedals: Vec<PedalDocument>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ControllerDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_channel: Option<Scalar>,
    #[serde(flatten)]
    pub overrides: Overrides,
    #[serde(default)]
    pub midi_echo: bool,
    #[serde(default)]
    pub pedal_monophony: bool,
    #[serde(default = "default_true")]
    pub min_velocity_note_off: bool,
    #[serde(default)]
    pub on_bank_change: OnBankChange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_select_controller: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_bank: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<MessageBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<MessageBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panic: Option<PanicSource>,
    #[serde(rename = "Bank", default)]
    pub banks: Vec<BankDocument>,

    /// Directory that relative `Panic.File` paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ControllerDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut document = Self::from_json(&text)?;
        document.base_dir = path.parent().map(Path::to_path_buf);
        Ok(document)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Zero-based input channel.
    pub fn in_channel(&self) -> Result<u8> {
        match &self.in_channel {
            Some(value) => parse_channel(&value.as_text(), "InChannel"),
            None => Ok(0),
        }
    }

    pub fn bank_select_controller(&self) -> Result<u8> {
        let Some(value) = &self.bank_select_controller else {
            return Ok(DEFAULT_BANK_SELECT_CONTROLLER);
        };
        match value.to_int("BankSelectController")? {
            n @ 0..=127 => Ok(n as u8),
            n => Err(Error::Config(format!(
                "BankSelectController {} must be between 0 and 127",
                n
            ))),
        }
    }

    /// Zero-based initial bank.
    pub fn initial_bank(&self) -> Result<usize> {
        let Some(value) = &self.initial_bank else {
            return Ok(0);
        };
        let bank = value.to_int("InitialBank")?;
        if bank < 1 || bank as usize > self.banks.len() {
            return Err(Error::Config(format!(
                "InitialBank {} must be between 1 and {}",
                bank,
                self.banks.len()
            )));
        }
        Ok(bank as usize - 1)
    }

    /// Text of the panic command, reading `Panic.File` if needed.
    pub fn panic_text(&self) -> Result<Option<String>> {
        match &self.panic {
            None => Ok(None),
            Some(PanicSource::Inline(text)) => Ok(Some(text.clone())),
            Some(PanicSource::Node(node)) => match (&node.command, &node.file) {
                (Some(_), Some(_)) => Err(Error::Config(
                    "Panic takes either an inline command or a File, not both".to_string(),
                )),
                (Some(text), None) => Ok(Some(text.clone())),
                (None, Some(file)) => {
                    let path = match &self.base_dir {
                        Some(dir) if file.is_relative() => dir.join(file),
                        _ => file.clone(),
                    };
                    Ok(Some(std::fs::read_to_string(path)?))
                }
                (None, None) => Err(Error::Config(
                    "Panic needs an inline command or a File".to_string(),
                )),
            },
        }
    }

    /// Structural checks that do not need the compiler.
    pub fn validate(&self) -> Result<()> {
        if self.banks.is_empty() {
            return Err(Error::Config("at least one Bank is required".to_string()));
        }
        self.in_channel()?;
        self.bank_select_controller()?;
        self.initial_bank()?;
        self.overrides.validate_channels("global")?;

        for (bank_index, bank) in self.banks.iter().enumerate() {
            let scope = format!("bank {}", bank_index + 1);
            if bank.pedals.is_empty() {
                return Err(Error::Config(format!("{} has no pedals", scope)));
            }
            bank.overrides.validate_channels(&scope)?;

            for (pedal_index, pedal) in bank.pedals.iter().enumerate() {
                let scope = format!("bank {} pedal {}", bank_index + 1, pedal_index + 1);
                if pedal.note.is_none() {
                    return Err(Error::Config(format!("{} has no Note", scope)));
                }
                pedal.overrides.validate_channels(&scope)?;
                if let Some(message) = pedal.messages.iter().find(|m| m.trigger.is_none()) {
                    return Err(Error::Config(format!(
                        "{} message '{}' has no Trigger",
                        scope, message.string
                    )));
                }
            }
        }
        Ok(())
    }
}
