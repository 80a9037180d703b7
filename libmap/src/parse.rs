use std::collections::{BTreeSet, VecDeque};
use std::fmt::Display;

use crate::library::{
    Capability, Caps, ClkPolKind, ClockDef, Library, MemoryDimsDef, MemoryInitKind, OptionValue, Options, PortGroupDef,
    PortKind, RamDef, RamKind, RdEnKind, ResetKind, ResetValDef, ResetValKind, SrstKind, TransKind, TransTarget,
    WrTransDef,
};

#[derive(Debug)]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses one library file into `lib`. Files parsed into the same library
/// accumulate their RAM definitions in order.
pub fn parse(file: &str, source: &str, lib: &mut Library) -> Result<(), ParseError> {
    Parser::new(file, source, lib).parse()
}

struct Parser<'a> {
    file: &'a str,
    lib: &'a mut Library,
    lines: std::str::Lines<'a>,
    line_number: usize,
    tokens: VecDeque<String>,
    option_stack: Vec<(String, OptionValue)>,
    portoption_stack: Vec<(String, OptionValue)>,
    active: bool,
}

// Base-0 integer syntax: 0x/0X hex, leading-0 octal, decimal otherwise.
fn parse_int(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let value = if let Some(digits) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(digits, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -value } else { value })
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, source: &'a str, lib: &'a mut Library) -> Self {
        Parser {
            file,
            lib,
            lines: source.lines(),
            line_number: 0,
            tokens: VecDeque::new(),
            option_stack: vec![],
            portoption_stack: vec![],
            active: true,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.line_number, message)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError { file: self.file.to_owned(), line, message: message.into() }
    }

    /// Returns the next token without consuming it; the empty string stands
    /// for end of file.
    fn peek_token(&mut self) -> String {
        loop {
            if let Some(token) = self.tokens.front() {
                return token.clone();
            }
            let Some(line) = self.lines.next() else {
                return String::new();
            };
            self.line_number += 1;
            for token in line.split_whitespace() {
                if token.starts_with('#') {
                    break;
                }
                if token.len() > 1 && token.ends_with(';') {
                    self.tokens.push_back(token[..token.len() - 1].to_owned());
                    self.tokens.push_back(";".to_owned());
                } else {
                    self.tokens.push_back(token.to_owned());
                }
            }
        }
    }

    fn get_token(&mut self) -> String {
        let token = self.peek_token();
        if !token.is_empty() {
            self.tokens.pop_front();
        }
        token
    }

    fn get_id(&mut self) -> Result<String, ParseError> {
        let token = self.get_token();
        if !(token.starts_with('$') || token.starts_with('\\')) {
            return Err(self.error(format!("expected id string, got `{}`.", token)));
        }
        Ok(token)
    }

    fn get_name(&mut self) -> Result<String, ParseError> {
        let token = self.get_token();
        let mut chars = token.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|chr| chr.is_ascii_alphanumeric() || chr == '_')
            }
            None => false,
        };
        if !valid {
            return Err(self.error(format!("expected name, got `{}`.", token)));
        }
        Ok(token)
    }

    fn get_string(&mut self) -> Result<String, ParseError> {
        let token = self.get_token();
        if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
            return Err(self.error(format!("expected string, got `{}`.", token)));
        }
        Ok(token[1..token.len() - 1].to_owned())
    }

    fn peek_string(&mut self) -> bool {
        self.peek_token().starts_with('"')
    }

    fn get_int(&mut self) -> Result<i64, ParseError> {
        let token = self.get_token();
        match parse_int(&token) {
            Some(value) => Ok(value),
            None => Err(self.error(format!("expected int, got `{}`.", token))),
        }
    }

    fn get_unsigned(&mut self) -> Result<usize, ParseError> {
        let value = self.get_int()?;
        usize::try_from(value).map_err(|_| self.error(format!("expected unsigned int, got `{}`.", value)))
    }

    fn peek_int(&mut self) -> bool {
        self.peek_token().chars().next().is_some_and(|chr| chr.is_ascii_digit())
    }

    fn get_semi(&mut self) -> Result<(), ParseError> {
        let token = self.get_token();
        if token != ";" {
            return Err(self.error(format!("expected `;`, got `{}`.", token)));
        }
        Ok(())
    }

    fn get_value(&mut self) -> Result<OptionValue, ParseError> {
        if self.peek_string() {
            Ok(OptionValue::String(self.get_string()?))
        } else {
            Ok(OptionValue::Int(self.get_int()?))
        }
    }

    /// Records the define as consulted and updates the activity flag; the
    /// saved outer flag is returned for restoration after the block.
    fn enter_ifdef(&mut self, polarity: bool) -> Result<bool, ParseError> {
        let save = self.active;
        let name = self.get_name()?;
        self.lib.defines_unused.shift_remove(&name);
        let defined = self.lib.defines.contains(&name);
        self.active = save && (defined == polarity);
        Ok(save)
    }

    fn enter_else(&mut self, save: bool) {
        self.get_token();
        self.active = !self.active && save;
    }

    fn options(&self) -> Options {
        self.option_stack.iter().cloned().collect()
    }

    fn portoptions(&self) -> Options {
        self.portoption_stack.iter().cloned().collect()
    }

    fn add_cap<T>(&self, caps: &mut Caps<T>, val: T) {
        if self.active {
            caps.push(Capability::new(val, self.options(), self.portoptions()));
        }
    }

    fn check_read_item(&self, port: &PortGroupDef, item: &str) -> Result<(), ParseError> {
        if port.kind != PortKind::Sr && port.kind != PortKind::Srsw {
            return Err(self.error(format!("`{}` only allowed on sync read ports.", item)));
        }
        Ok(())
    }

    fn check_write_item(&self, port: &PortGroupDef, item: &str) -> Result<(), ParseError> {
        if port.kind == PortKind::Ar || port.kind == PortKind::Sr {
            return Err(self.error(format!("`{}` only allowed on write ports.", item)));
        }
        Ok(())
    }

    fn parse_port_block(&mut self, port: &mut PortGroupDef) -> Result<(), ParseError> {
        if self.peek_token() == "{" {
            self.get_token();
            while self.peek_token() != "}" {
                self.parse_port_item(port)?;
            }
            self.get_token();
        } else {
            self.parse_port_item(port)?;
        }
        Ok(())
    }

    fn parse_ram_block(&mut self, ram: &mut RamDef) -> Result<(), ParseError> {
        if self.peek_token() == "{" {
            self.get_token();
            while self.peek_token() != "}" {
                self.parse_ram_item(ram)?;
            }
            self.get_token();
        } else {
            self.parse_ram_item(ram)?;
        }
        Ok(())
    }

    fn parse_top_block(&mut self) -> Result<(), ParseError> {
        if self.peek_token() == "{" {
            self.get_token();
            while self.peek_token() != "}" {
                self.parse_top_item()?;
            }
            self.get_token();
        } else {
            self.parse_top_item()?;
        }
        Ok(())
    }

    fn parse_port_item(&mut self, port: &mut PortGroupDef) -> Result<(), ParseError> {
        let token = self.get_token();
        match token.as_str() {
            "ifdef" | "ifndef" => {
                let save = self.enter_ifdef(token == "ifdef")?;
                self.parse_port_block(port)?;
                if self.peek_token() == "else" {
                    self.enter_else(save);
                    self.parse_port_block(port)?;
                }
                self.active = save;
            }
            "option" => {
                let name = self.get_string()?;
                let value = self.get_value()?;
                self.option_stack.push((name, value));
                self.parse_port_block(port)?;
                self.option_stack.pop();
            }
            "portoption" => {
                let name = self.get_string()?;
                let value = self.get_value()?;
                self.portoption_stack.push((name, value));
                self.parse_port_block(port)?;
                self.portoption_stack.pop();
            }
            "clock" => {
                if port.kind == PortKind::Ar {
                    return Err(self.error("`clock` not allowed in async read port."));
                }
                let kind = match self.peek_token().as_str() {
                    "anyedge" => ClkPolKind::Anyedge,
                    "posedge" => ClkPolKind::Posedge,
                    "negedge" => ClkPolKind::Negedge,
                    token => {
                        return Err(
                            self.error(format!("expected `posedge`, `negedge`, or `anyedge`, got `{}`.", token))
                        );
                    }
                };
                self.get_token();
                let name = if self.peek_string() { Some(self.get_string()?) } else { None };
                self.get_semi()?;
                self.add_cap(&mut port.clock, ClockDef { kind, name });
            }
            "width" => {
                loop {
                    let width = self.get_unsigned()?;
                    self.add_cap(&mut port.width, width);
                    if !self.peek_int() {
                        break;
                    }
                }
                self.get_semi()?;
            }
            "mixwidth" => {
                self.get_semi()?;
                self.add_cap(&mut port.mixwidth, ());
            }
            "addrce" => {
                self.get_semi()?;
                self.add_cap(&mut port.addrce, ());
            }
            "rden" => {
                self.check_read_item(port, "rden")?;
                let token = self.get_token();
                let val = match token.as_str() {
                    "none" => RdEnKind::None,
                    "any" => RdEnKind::Any,
                    "write-implies" | "write-excludes" => {
                        if port.kind != PortKind::Srsw {
                            return Err(self.error(format!("`{}` only makes sense for read+write ports.", token)));
                        }
                        if token == "write-implies" {
                            RdEnKind::WriteImplies
                        } else {
                            RdEnKind::WriteExcludes
                        }
                    }
                    token => {
                        return Err(self.error(format!(
                            "expected `none`, `any`, `write-implies`, or `write-excludes`, got `{}`.",
                            token
                        )));
                    }
                };
                self.get_semi()?;
                self.add_cap(&mut port.rden, val);
            }
            "rdinitval" | "rdsrstval" | "rdarstval" => {
                self.check_read_item(port, &token)?;
                let kind = match token.as_str() {
                    "rdinitval" => ResetKind::Init,
                    "rdsrstval" => ResetKind::Sync,
                    "rdarstval" => ResetKind::Async,
                    _ => unreachable!(),
                };
                let val_kind = match self.peek_token().as_str() {
                    "none" => {
                        self.get_token();
                        ResetValKind::None
                    }
                    "zero" => {
                        self.get_token();
                        ResetValKind::Zero
                    }
                    _ => ResetValKind::Named(self.get_string()?),
                };
                self.get_semi()?;
                self.add_cap(&mut port.rdrstval, ResetValDef { kind, val_kind });
            }
            "rdsrstmode" => {
                self.check_read_item(port, "rdsrstmode")?;
                let token = self.get_token();
                let val = match token.as_str() {
                    "en-over-srst" => SrstKind::EnOverSrst,
                    "srst-over-en" => SrstKind::SrstOverEn,
                    "any" => SrstKind::Any,
                    token => {
                        return Err(self.error(format!(
                            "expected `en-over-srst`, `srst-over-en`, or `any`, got `{}`.",
                            token
                        )));
                    }
                };
                self.get_semi()?;
                self.add_cap(&mut port.rdsrstmode, val);
            }
            "wrbe" => {
                self.check_write_item(port, "wrbe")?;
                let width = self.get_unsigned()?;
                self.add_cap(&mut port.wrbe, width);
                self.get_semi()?;
            }
            "wrprio" => {
                self.check_write_item(port, "wrprio")?;
                loop {
                    let name = self.get_string()?;
                    self.add_cap(&mut port.wrprio, name);
                    if !self.peek_string() {
                        break;
                    }
                }
                self.get_semi()?;
            }
            "wrtrans" => {
                self.check_write_item(port, "wrtrans")?;
                let target = match self.peek_token().as_str() {
                    "self" => {
                        if port.kind != PortKind::Srsw {
                            return Err(self.error("`wrtrans self` only allowed on sync read + sync write ports."));
                        }
                        self.get_token();
                        TransTarget::Own
                    }
                    "other" => {
                        self.get_token();
                        TransTarget::Other
                    }
                    _ => TransTarget::Named(self.get_string()?),
                };
                let token = self.get_token();
                let kind = match token.as_str() {
                    "new" => TransKind::New,
                    "old" => TransKind::Old,
                    token => return Err(self.error(format!("expected `new` or `old`, got `{}`.", token))),
                };
                self.get_semi()?;
                self.add_cap(&mut port.wrtrans, WrTransDef { target, kind });
            }
            "wrcs" => {
                self.check_write_item(port, "wrcs")?;
                let width = self.get_unsigned()?;
                self.add_cap(&mut port.wrcs, width);
                self.get_semi()?;
            }
            "" => return Err(self.error("unexpected EOF while parsing port item.")),
            token => return Err(self.error(format!("unknown port-level item `{}`.", token))),
        }
        Ok(())
    }

    fn parse_ram_item(&mut self, ram: &mut RamDef) -> Result<(), ParseError> {
        let token = self.get_token();
        match token.as_str() {
            "ifdef" | "ifndef" => {
                let save = self.enter_ifdef(token == "ifdef")?;
                self.parse_ram_block(ram)?;
                if self.peek_token() == "else" {
                    self.enter_else(save);
                    self.parse_ram_block(ram)?;
                }
                self.active = save;
            }
            "option" => {
                let name = self.get_string()?;
                let value = self.get_value()?;
                self.option_stack.push((name, value));
                self.parse_ram_block(ram)?;
                self.option_stack.pop();
            }
            "dims" => {
                let abits = self.get_unsigned()?;
                let dbits = self.get_unsigned()?;
                self.get_semi()?;
                self.add_cap(&mut ram.dims, MemoryDimsDef { abits, dbits });
            }
            "init" => {
                let token = self.get_token();
                let kind = match token.as_str() {
                    "zero" => MemoryInitKind::Zero,
                    "any" => MemoryInitKind::Any,
                    "none" => MemoryInitKind::None,
                    token => return Err(self.error(format!("expected `zero`, `any`, or `none`, got `{}`.", token))),
                };
                self.get_semi()?;
                self.add_cap(&mut ram.init, kind);
            }
            "style" => {
                loop {
                    let style = self.get_string()?;
                    self.add_cap(&mut ram.style, style);
                    if !self.peek_string() {
                        break;
                    }
                }
                self.get_semi()?;
            }
            "port" => {
                let orig_line = self.line_number;
                let token = self.get_token();
                let kind = match token.as_str() {
                    "ar" => PortKind::Ar,
                    "sr" => PortKind::Sr,
                    "sw" => PortKind::Sw,
                    "arsw" => PortKind::Arsw,
                    "srsw" => PortKind::Srsw,
                    token => {
                        return Err(
                            self.error(format!("expected `ar`, `sr`, `sw`, `arsw`, or `srsw`, got `{}`.", token))
                        );
                    }
                };
                let mut port = PortGroupDef::new(kind);
                loop {
                    port.names.push(self.get_string()?);
                    if !self.peek_string() {
                        break;
                    }
                }
                self.parse_port_block(&mut port)?;
                if self.active {
                    // Add defaults for some capabilities.
                    if port.kind != PortKind::Ar && port.clock.is_empty() {
                        self.add_cap(&mut port.clock, ClockDef { kind: ClkPolKind::Anyedge, name: None });
                    }
                    if port.width.is_empty() {
                        self.add_cap(&mut port.width, 1);
                    }
                    // Refuse to guess this one, there is no safe default.
                    if (port.kind == PortKind::Sr || port.kind == PortKind::Srsw) && port.rden.is_empty() {
                        return Err(self.error_at(orig_line, "`rden` capability should be specified."));
                    }
                    self.add_cap(&mut ram.ports, port);
                }
            }
            "" => return Err(self.error("unexpected EOF while parsing ram item.")),
            token => return Err(self.error(format!("unknown ram-level item `{}`.", token))),
        }
        Ok(())
    }

    fn parse_top_item(&mut self) -> Result<(), ParseError> {
        let token = self.get_token();
        match token.as_str() {
            "ifdef" | "ifndef" => {
                let save = self.enter_ifdef(token == "ifdef")?;
                self.parse_top_block()?;
                if self.peek_token() == "else" {
                    self.enter_else(save);
                    self.parse_top_block()?;
                }
                self.active = save;
            }
            "ram" => {
                let orig_line = self.line_number;
                let token = self.get_token();
                let kind = match token.as_str() {
                    "distributed" => RamKind::Distributed,
                    "block" => RamKind::Block,
                    "huge" => RamKind::Huge,
                    token => {
                        return Err(self.error(format!("expected `distributed`, `block`, or `huge`, got `{}`.", token)))
                    }
                };
                let id = self.get_id()?;
                let mut ram = RamDef::new(id, kind);
                self.parse_ram_block(&mut ram)?;
                if self.active {
                    if ram.dims.is_empty() {
                        return Err(self.error_at(orig_line, "`dims` capability should be specified."));
                    }
                    if ram.ports.is_empty() {
                        return Err(self.error_at(orig_line, "at least one port group should be specified."));
                    }
                    let mut pnedge_clocks = BTreeSet::new();
                    let mut anyedge_clocks = BTreeSet::new();
                    for port in &ram.ports {
                        for def in &port.val.clock {
                            let Some(name) = &def.val.name else { continue };
                            if def.val.kind == ClkPolKind::Anyedge {
                                anyedge_clocks.insert(name.clone());
                            } else {
                                pnedge_clocks.insert(name.clone());
                            }
                        }
                    }
                    for name in &pnedge_clocks {
                        if anyedge_clocks.contains(name) {
                            return Err(self.error_at(
                                orig_line,
                                format!("named clock \"{}\" used with both posedge/negedge and anyedge clocks.", name),
                            ));
                        }
                    }
                    self.lib.ram_defs.push(ram);
                }
            }
            "" => return Err(self.error("unexpected EOF while parsing top item.")),
            token => return Err(self.error(format!("unknown top-level item `{}`.", token))),
        }
        Ok(())
    }

    fn parse(&mut self) -> Result<(), ParseError> {
        while !self.peek_token().is_empty() {
            self.parse_top_item()?;
        }
        Ok(())
    }
}
