use std::fmt::{self, Display};

use indexmap::{IndexMap, IndexSet};
use log::warn;

/// Requested or provided RAM class. `Auto`, `Logic`, and `NotLogic` only
/// occur as mapping requests derived from attributes; RAM definitions carry
/// one of the remaining three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamKind {
    Auto,
    Logic,
    NotLogic,
    Distributed,
    Block,
    Huge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryInitKind {
    None,
    Zero,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Asynchronous read.
    Ar,
    /// Synchronous read.
    Sr,
    /// Synchronous write.
    Sw,
    /// Synchronous read and write sharing one address.
    Srsw,
    /// Asynchronous read plus synchronous write sharing one address.
    Arsw,
}

impl PortKind {
    pub fn can_read(self) -> bool {
        self != PortKind::Sw
    }

    pub fn can_write(self) -> bool {
        !matches!(self, PortKind::Ar | PortKind::Sr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClkPolKind {
    Anyedge,
    Posedge,
    Negedge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdEnKind {
    None,
    Any,
    WriteImplies,
    WriteExcludes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Init,
    Async,
    Sync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetValKind {
    None,
    Zero,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrstKind {
    SrstOverEn,
    EnOverSrst,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransTarget {
    /// The read port sharing this write port's address.
    Own,
    /// Any read port other than the one sharing this write port.
    Other,
    /// The port group with the given first name.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransKind {
    New,
    Old,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i64),
    String(String),
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionValue::Int(value) => write!(f, "{}", value),
            OptionValue::String(value) => write!(f, "\"{}\"", value),
        }
    }
}

pub type Options = IndexMap<String, OptionValue>;

/// A value declared inside the library, together with the option bindings
/// that were in scope at its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability<T> {
    pub val: T,
    pub opts: Options,
    pub portopts: Options,
}

impl<T> Capability<T> {
    pub fn new(val: T, opts: Options, portopts: Options) -> Self {
        Capability { val, opts, portopts }
    }
}

pub type Caps<T> = Vec<Capability<T>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDef {
    pub kind: ClkPolKind,
    /// Ports referring to the same clock name must resolve to one clock.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetValDef {
    pub kind: ResetKind,
    pub val_kind: ResetValKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrTransDef {
    pub target: TransTarget,
    pub kind: TransKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortGroupDef {
    pub kind: PortKind,
    /// One name per physical port in the group.
    pub names: Vec<String>,
    pub clock: Caps<ClockDef>,
    pub width: Caps<usize>,
    pub mixwidth: Caps<()>,
    pub addrce: Caps<()>,
    pub rden: Caps<RdEnKind>,
    pub rdrstval: Caps<ResetValDef>,
    pub rdsrstmode: Caps<SrstKind>,
    pub wrbe: Caps<usize>,
    pub wrprio: Caps<String>,
    pub wrtrans: Caps<WrTransDef>,
    pub wrcs: Caps<usize>,
}

impl PortGroupDef {
    pub fn new(kind: PortKind) -> Self {
        PortGroupDef {
            kind,
            names: vec![],
            clock: vec![],
            width: vec![],
            mixwidth: vec![],
            addrce: vec![],
            rden: vec![],
            rdrstval: vec![],
            rdsrstmode: vec![],
            wrbe: vec![],
            wrprio: vec![],
            wrtrans: vec![],
            wrcs: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDimsDef {
    pub abits: usize,
    pub dbits: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RamDef {
    pub id: String,
    pub kind: RamKind,
    pub ports: Caps<PortGroupDef>,
    pub dims: Caps<MemoryDimsDef>,
    pub init: Caps<MemoryInitKind>,
    pub style: Caps<String>,
}

impl RamDef {
    pub fn new(id: String, kind: RamKind) -> Self {
        RamDef { id, kind, ports: vec![], dims: vec![], init: vec![], style: vec![] }
    }
}

/// An ordered collection of RAM definitions accumulated over one or more
/// library files, sharing one set of build-time defines.
#[derive(Debug, Clone)]
pub struct Library {
    pub ram_defs: Vec<RamDef>,
    pub defines: IndexSet<String>,
    pub defines_unused: IndexSet<String>,
}

impl Library {
    pub fn new(defines: IndexSet<String>) -> Library {
        let defines_unused = defines.clone();
        Library { ram_defs: vec![], defines, defines_unused }
    }

    /// To be called once all files are parsed.
    pub fn prepare(&self) {
        for define in &self.defines_unused {
            warn!("define {} not used in the library.", define);
        }
    }
}

// The serialized form wraps every capability in the `option`/`portoption`
// items reproducing its envelope, so reparsing it (with no defines) yields
// the same in-memory library.

fn open_envelope(f: &mut fmt::Formatter, indent: &mut String, opts: &Options, portopts: &Options) -> fmt::Result {
    for (name, value) in opts {
        writeln!(f, "{}option \"{}\" {} {{", indent, name, value)?;
        indent.push_str("    ");
    }
    for (name, value) in portopts {
        writeln!(f, "{}portoption \"{}\" {} {{", indent, name, value)?;
        indent.push_str("    ");
    }
    Ok(())
}

fn close_envelope(f: &mut fmt::Formatter, indent: &mut String, opts: &Options, portopts: &Options) -> fmt::Result {
    for _ in 0..opts.len() + portopts.len() {
        indent.truncate(indent.len() - 4);
        writeln!(f, "{}}}", indent)?;
    }
    Ok(())
}

fn write_cap<T>(
    f: &mut fmt::Formatter,
    indent: &mut String,
    cap: &Capability<T>,
    body: impl Fn(&mut fmt::Formatter, &T) -> fmt::Result,
) -> fmt::Result {
    open_envelope(f, indent, &cap.opts, &cap.portopts)?;
    write!(f, "{}", indent)?;
    body(f, &cap.val)?;
    writeln!(f)?;
    close_envelope(f, indent, &cap.opts, &cap.portopts)
}

fn write_port(f: &mut fmt::Formatter, indent: &mut String, port: &PortGroupDef) -> fmt::Result {
    let kind = match port.kind {
        PortKind::Ar => "ar",
        PortKind::Sr => "sr",
        PortKind::Sw => "sw",
        PortKind::Srsw => "srsw",
        PortKind::Arsw => "arsw",
    };
    write!(f, "{}port {}", indent, kind)?;
    for name in &port.names {
        write!(f, " \"{}\"", name)?;
    }
    writeln!(f, " {{")?;
    indent.push_str("    ");
    for cap in &port.clock {
        write_cap(f, indent, cap, |f, def| {
            let kind = match def.kind {
                ClkPolKind::Anyedge => "anyedge",
                ClkPolKind::Posedge => "posedge",
                ClkPolKind::Negedge => "negedge",
            };
            write!(f, "clock {}", kind)?;
            if let Some(name) = &def.name {
                write!(f, " \"{}\"", name)?;
            }
            write!(f, ";")
        })?;
    }
    for cap in &port.width {
        write_cap(f, indent, cap, |f, width| write!(f, "width {};", width))?;
    }
    for cap in &port.mixwidth {
        write_cap(f, indent, cap, |f, ()| write!(f, "mixwidth;"))?;
    }
    for cap in &port.addrce {
        write_cap(f, indent, cap, |f, ()| write!(f, "addrce;"))?;
    }
    for cap in &port.rden {
        write_cap(f, indent, cap, |f, kind| {
            let kind = match kind {
                RdEnKind::None => "none",
                RdEnKind::Any => "any",
                RdEnKind::WriteImplies => "write-implies",
                RdEnKind::WriteExcludes => "write-excludes",
            };
            write!(f, "rden {};", kind)
        })?;
    }
    for cap in &port.rdrstval {
        write_cap(f, indent, cap, |f, def| {
            let item = match def.kind {
                ResetKind::Init => "rdinitval",
                ResetKind::Async => "rdarstval",
                ResetKind::Sync => "rdsrstval",
            };
            match &def.val_kind {
                ResetValKind::None => write!(f, "{} none;", item),
                ResetValKind::Zero => write!(f, "{} zero;", item),
                ResetValKind::Named(name) => write!(f, "{} \"{}\";", item, name),
            }
        })?;
    }
    for cap in &port.rdsrstmode {
        write_cap(f, indent, cap, |f, kind| {
            let kind = match kind {
                SrstKind::SrstOverEn => "srst-over-en",
                SrstKind::EnOverSrst => "en-over-srst",
                SrstKind::Any => "any",
            };
            write!(f, "rdsrstmode {};", kind)
        })?;
    }
    for cap in &port.wrbe {
        write_cap(f, indent, cap, |f, width| write!(f, "wrbe {};", width))?;
    }
    for cap in &port.wrprio {
        write_cap(f, indent, cap, |f, name| write!(f, "wrprio \"{}\";", name))?;
    }
    for cap in &port.wrtrans {
        write_cap(f, indent, cap, |f, def| {
            write!(f, "wrtrans ")?;
            match &def.target {
                TransTarget::Own => write!(f, "self")?,
                TransTarget::Other => write!(f, "other")?,
                TransTarget::Named(name) => write!(f, "\"{}\"", name)?,
            }
            match def.kind {
                TransKind::New => write!(f, " new;"),
                TransKind::Old => write!(f, " old;"),
            }
        })?;
    }
    for cap in &port.wrcs {
        write_cap(f, indent, cap, |f, width| write!(f, "wrcs {};", width))?;
    }
    indent.truncate(indent.len() - 4);
    writeln!(f, "{}}}", indent)
}

impl Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut indent = String::new();
        for ram_def in &self.ram_defs {
            let kind = match ram_def.kind {
                RamKind::Distributed => "distributed",
                RamKind::Block => "block",
                RamKind::Huge => "huge",
                _ => unreachable!("request-only kind in a RAM definition"),
            };
            writeln!(f, "ram {} {} {{", kind, ram_def.id)?;
            indent.push_str("    ");
            for cap in &ram_def.dims {
                write_cap(f, &mut indent, cap, |f, dims| write!(f, "dims {} {};", dims.abits, dims.dbits))?;
            }
            for cap in &ram_def.init {
                write_cap(f, &mut indent, cap, |f, kind| {
                    let kind = match kind {
                        MemoryInitKind::None => "none",
                        MemoryInitKind::Zero => "zero",
                        MemoryInitKind::Any => "any",
                    };
                    write!(f, "init {};", kind)
                })?;
            }
            for cap in &ram_def.style {
                write_cap(f, &mut indent, cap, |f, style| write!(f, "style \"{}\";", style))?;
            }
            for cap in &ram_def.ports {
                open_envelope(f, &mut indent, &cap.opts, &cap.portopts)?;
                write_port(f, &mut indent, &cap.val)?;
                close_envelope(f, &mut indent, &cap.opts, &cap.portopts)?;
            }
            indent.truncate(indent.len() - 4);
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
