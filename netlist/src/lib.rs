mod logic;
mod value;
mod design;
mod sigmap;
mod memory;
mod parse;

pub use logic::{Const, Trit};
pub use value::{ControlNet, Net, Value};
pub use design::{Cell, Design};
pub use sigmap::SigMap;
pub use memory::{AttrValue, Memory, MemoryPortRelation, MemoryReadFlipFlop, MemoryReadPort, MemoryWritePort};
pub use parse::{parse, ParseError};
