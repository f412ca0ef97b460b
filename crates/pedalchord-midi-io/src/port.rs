//! Port descriptions and port selection by number or name pattern.

use std::convert::Infallible;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use wildmatch::WildMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortType {
    Input,
    Output,
}

impl PortType {
    pub fn name(&self) -> &'static str {
        match self {
            PortType::Input => "input",
            PortType::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Zero-based index as reported by the backend.
    pub index: usize,
    pub name: String,
    pub port_type: PortType,
}

/// How the user picks a port on the command line.
///
/// All digits selects by the 1-based number shown by `list`; anything else is
/// a case-insensitive name pattern. Patterns with `*` or `?` are globs
/// matched against the whole name, plain text matches any part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelector {
    Number(usize),
    Pattern(String),
}

impl PortSelector {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = text.parse() {
                return PortSelector::Number(number);
            }
        }
        PortSelector::Pattern(text.to_string())
    }

    pub fn matches(&self, port: &PortInfo) -> bool {
        match self {
            PortSelector::Number(number) => *number >= 1 && port.index == number - 1,
            PortSelector::Pattern(pattern) => name_matches(pattern, &port.name),
        }
    }

    /// First port accepted by this selector.
    pub fn resolve<'a>(&self, ports: &'a [PortInfo]) -> Option<&'a PortInfo> {
        ports.iter().find(|port| self.matches(port))
    }
}

impl FromStr for PortSelector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for PortSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSelector::Number(number) => write!(f, "{}", number),
            PortSelector::Pattern(pattern) => f.write_str(pattern),
        }
    }
}

/// Lists `ports` and asks for one by number until a listed number is typed.
///
/// Returns `None` when there is nothing to choose from or the input ends.
pub fn prompt_port<R: BufRead, W: Write>(
    port_type: PortType,
    ports: &[PortInfo],
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<PortSelector>> {
    if ports.is_empty() {
        return Ok(None);
    }
    loop {
        writeln!(output, "Available MIDI {} ports:", port_type.name())?;
        for port in ports {
            writeln!(output, "  {}: {}", port.index + 1, port.name)?;
        }
        write!(output, "Type the port you want to use [1-{}]: ", ports.len())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(number) if ports.iter().any(|port| port.index + 1 == number) => {
                return Ok(Some(PortSelector::Number(number)));
            }
            _ => writeln!(output, "Invalid port number '{}'", line.trim())?,
        }
    }
}

fn name_matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();
    if !pattern.contains(|c: char| c == '*' || c == '?') {
        return name.contains(&pattern);
    }
    WildMatch::new(&pattern).matches(&name)
}
