//! Mapping of memories onto a library of RAM primitives.
//!
//! The library text format describes a family of target RAM cells as trees
//! of guarded capabilities; the planner enumerates, for one memory at a
//! time, every way of placing its ports onto one RAM definition that keeps
//! all option, clock, and reset value bindings consistent, recording which
//! missing features have to be made up for in outside logic. Picking among
//! the surviving candidates (and shaping data widths to the primitive) is
//! left to the caller.

mod config;
mod library;
mod map;
mod options;
mod parse;
mod sat;

pub use config::{apply_rstval, MemConfig, RdPortConfig, WrPortConfig};
pub use library::{
    Capability, Caps, ClkPolKind, ClockDef, Library, MemoryDimsDef, MemoryInitKind, OptionValue, Options,
    PortGroupDef, PortKind, RamDef, RamKind, RdEnKind, ResetKind, ResetValDef, ResetValKind, SrstKind, TransKind,
    TransTarget, WrTransDef,
};
pub use map::{map_memory, MapError, MapOutcome};
pub use options::{apply_opts, opts_applied};
pub use parse::{parse, ParseError};
pub use sat::{ConeSat, Lit};
