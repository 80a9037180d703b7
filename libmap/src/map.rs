use std::collections::BTreeMap;
use std::fmt::Write;

use log::debug;

use memlib_netlist::{AttrValue, Design, Memory, MemoryPortRelation, SigMap};

use crate::config::{apply_rstval, MemConfig, RdPortConfig, WrPortConfig};
use crate::library::{Library, MemoryInitKind, PortKind, RamKind, RdEnKind, ResetKind, SrstKind, TransKind, TransTarget};
use crate::options::apply_opts;
use crate::sat::{ConeSat, Lit};

/// Raised only when an explicitly requested RAM kind or style rules out
/// every RAM definition. An empty candidate set without such a request is
/// not an error; the memory is left to the logic fallback or escalated by
/// the caller.
#[derive(Debug)]
pub enum MapError {
    NoRamOfKind(RamKind),
    NoRamWithStyle(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::NoRamOfKind(kind) => {
                let kind = match kind {
                    RamKind::Distributed => "distributed",
                    RamKind::Block => "block",
                    RamKind::Huge => "huge",
                    _ => "",
                };
                write!(f, "no available {} RAMs", kind)
            }
            MapError::NoRamWithStyle(style) => write!(f, "no available RAMs with style \"{}\"", style),
        }
    }
}

impl std::error::Error for MapError {}

/// The planner's verdict for one memory: every feasible configuration, plus
/// whether the all-soft-logic fallback is available. Geometry selection and
/// costing between the candidates happen downstream.
#[derive(Debug, Clone)]
pub struct MapOutcome {
    /// The mapping kind requested through attributes.
    pub kind: RamKind,
    /// The specific style requested through attributes, if any.
    pub style: Option<String>,
    pub logic_ok: bool,
    pub cfgs: Vec<MemConfig>,
}

const STYLE_ATTRS: [&str; 8] =
    ["ram_block", "rom_block", "ram_style", "rom_style", "ramstyle", "romstyle", "syn_ramstyle", "syn_romstyle"];

// Go through memory attributes to determine the requested mapping style.
fn determine_style(mem: &Memory) -> (RamKind, Option<String>) {
    for attr in STYLE_ATTRS {
        let Some(value) = mem.attr(attr) else { continue };
        match value {
            AttrValue::Int(_) => return (RamKind::NotLogic, None),
            AttrValue::String(value) => {
                return match value.as_str() {
                    "auto" => (RamKind::Auto, None),
                    "logic" | "registers" => (RamKind::Logic, None),
                    "distributed" => (RamKind::Distributed, None),
                    "block" | "block_ram" | "ebr" => (RamKind::Block, None),
                    "huge" | "ultra" => (RamKind::Huge, None),
                    _ => (RamKind::NotLogic, Some(value.clone())),
                };
            }
        }
    }
    if matches!(mem.attr("logic_block"), Some(AttrValue::Int(1))) {
        return (RamKind::Logic, None);
    }
    (RamKind::Auto, None)
}

struct MemMapping<'a> {
    sigmap: &'a SigMap,
    sat: ConeSat<'a>,
    mem: &'a Memory,
    lib: &'a Library,
    cfgs: Vec<MemConfig>,
    kind: RamKind,
    style: Option<String>,
    wr_en_cache: BTreeMap<usize, Lit>,
    wr_implies_rd_cache: BTreeMap<(usize, usize), bool>,
    wr_excludes_rd_cache: BTreeMap<(usize, usize), bool>,
}

/// Runs the planner for one memory against the library. `sigmap` must be
/// the design's undef-mux map, shared between the memories of the design.
pub fn map_memory(design: &Design, sigmap: &SigMap, mem: &Memory, lib: &Library) -> Result<MapOutcome, MapError> {
    let (kind, style) = determine_style(mem);
    let mut mapping = MemMapping {
        sigmap,
        sat: ConeSat::new(design),
        mem,
        lib,
        cfgs: vec![],
        kind,
        style,
        wr_en_cache: BTreeMap::new(),
        wr_implies_rd_cache: BTreeMap::new(),
        wr_excludes_rd_cache: BTreeMap::new(),
    };
    let logic_ok = mapping.determine_logic_ok();
    if kind != RamKind::Logic {
        mapping.cfgs = (0..lib.ram_defs.len()).map(MemConfig::new).collect();
        mapping.handle_ram_kind()?;
        mapping.handle_ram_style()?;
        mapping.handle_init();
        mapping.handle_wr_ports();
        mapping.handle_rd_ports();
        mapping.handle_trans();
        // The stages so far can rule candidates out entirely; the remaining
        // ones can at worst demand emulation.
        mapping.handle_priority();
        mapping.handle_rd_rstval(ResetKind::Init);
        mapping.handle_rd_rstval(ResetKind::Async);
        mapping.handle_rd_rstval(ResetKind::Sync);
    }
    let outcome =
        MapOutcome { kind: mapping.kind, style: mapping.style.clone(), logic_ok, cfgs: std::mem::take(&mut mapping.cfgs) };
    debug!("mapping candidates:\n{}", outcome.describe(lib));
    Ok(outcome)
}

impl<'a> MemMapping<'a> {
    // The memory can go to soft logic iff all write ports share one clock.
    fn determine_logic_ok(&self) -> bool {
        if self.kind != RamKind::Auto && self.kind != RamKind::Logic {
            return false;
        }
        let Some(first) = self.mem.write_ports.first() else { return true };
        self.mem.write_ports.iter().all(|port| port.is_clocked() && port.clock == first.clock)
    }

    // Apply the RAM kind restriction (distributed/block/huge), if any.
    fn handle_ram_kind(&mut self) -> Result<(), MapError> {
        if !matches!(self.kind, RamKind::Distributed | RamKind::Block | RamKind::Huge) {
            return Ok(());
        }
        let (lib, kind) = (self.lib, self.kind);
        self.cfgs.retain(|cfg| lib.ram_defs[cfg.ram_def].kind == kind);
        if self.cfgs.is_empty() {
            return Err(MapError::NoRamOfKind(self.kind));
        }
        Ok(())
    }

    // Apply the specific RAM style restriction, if any.
    fn handle_ram_style(&mut self) -> Result<(), MapError> {
        let Some(style) = self.style.clone() else { return Ok(()) };
        let mut new_cfgs = vec![];
        for cfg in std::mem::take(&mut self.cfgs) {
            for def in &self.lib.ram_defs[cfg.ram_def].style {
                if def.val != style {
                    continue;
                }
                let mut new_cfg = cfg.clone();
                if !apply_opts(&mut new_cfg.opts, &def.opts) {
                    continue;
                }
                new_cfgs.push(new_cfg);
            }
        }
        self.cfgs = new_cfgs;
        if self.cfgs.is_empty() {
            return Err(MapError::NoRamWithStyle(style));
        }
        Ok(())
    }

    // Handle memory initializer restrictions, if any.
    fn handle_init(&mut self) {
        if self.mem.init_value.is_undef() {
            return;
        }
        let has_one = self.mem.init_value.has_one();
        let mut new_cfgs = vec![];
        for cfg in std::mem::take(&mut self.cfgs) {
            for def in &self.lib.ram_defs[cfg.ram_def].init {
                let usable = if has_one {
                    def.val == MemoryInitKind::Any
                } else {
                    matches!(def.val, MemoryInitKind::Any | MemoryInitKind::Zero)
                };
                if !usable {
                    continue;
                }
                let mut new_cfg = cfg.clone();
                if !apply_opts(&mut new_cfg.opts, &def.opts) {
                    continue;
                }
                new_cfgs.push(new_cfg);
            }
        }
        self.cfgs = new_cfgs;
    }

    // Perform write port assignment, validating clock options as we go.
    fn handle_wr_ports(&mut self) {
        let (mem, lib) = (self.mem, self.lib);
        for port in &mem.write_ports {
            if !port.is_clocked() {
                // Unclocked write ports are not supported by anything.
                self.cfgs.clear();
                return;
            }
            let mut new_cfgs = vec![];
            for cfg in std::mem::take(&mut self.cfgs) {
                let ram_def = &lib.ram_defs[cfg.ram_def];
                for (didx, def) in ram_def.ports.iter().enumerate() {
                    if !def.val.kind.can_write() {
                        continue;
                    }
                    // The group must still have a port left over after the
                    // previously assigned write ports.
                    let used = cfg.wr_ports.iter().filter(|other| other.port_def == didx).count();
                    if used >= def.val.names.len() {
                        continue;
                    }
                    let mut cfg2 = cfg.clone();
                    if !apply_opts(&mut cfg2.opts, &def.opts) {
                        continue;
                    }
                    let pcfg2 = WrPortConfig::new(didx);
                    for cdef in &def.val.clock {
                        let mut cfg3 = cfg2.clone();
                        let mut pcfg3 = pcfg2.clone();
                        if !apply_opts(&mut cfg3.opts, &cdef.opts) {
                            continue;
                        }
                        if !apply_opts(&mut pcfg3.portopts, &cdef.portopts) {
                            continue;
                        }
                        if !cfg3.apply_clock(&cdef.val, port.clock) {
                            continue;
                        }
                        cfg3.wr_ports.push(pcfg3);
                        new_cfgs.push(cfg3);
                    }
                }
            }
            self.cfgs = new_cfgs;
        }
    }

    // Perform read port assignment, validating clock and rden options as we
    // go. Every read port either claims a fresh primitive port or shares
    // one already claimed by a write port.
    fn handle_rd_ports(&mut self) {
        let (mem, lib) = (self.mem, self.lib);
        for pidx in 0..mem.read_ports.len() {
            let port = &mem.read_ports[pidx];
            let mut new_cfgs = vec![];
            for cfg in std::mem::take(&mut self.cfgs) {
                let ram_def = &lib.ram_defs[cfg.ram_def];
                // First pass: read port not shared with a write port.
                for (didx, def) in ram_def.ports.iter().enumerate() {
                    if !def.val.kind.can_read() {
                        continue;
                    }
                    let sync_def = matches!(def.val.kind, PortKind::Sr | PortKind::Srsw);
                    // An async source port accepts only async definitions.
                    if port.flip_flop.is_none() && sync_def {
                        continue;
                    }
                    // Overuse by other read ports is fine; it only means
                    // the memory gets duplicated downstream.
                    let used = cfg.wr_ports.iter().filter(|other| other.port_def == didx).count();
                    if used >= def.val.names.len() {
                        continue;
                    }
                    let mut cfg2 = cfg.clone();
                    if !apply_opts(&mut cfg2.opts, &def.opts) {
                        continue;
                    }
                    let mut pcfg2 = RdPortConfig::new(didx);
                    if sync_def {
                        let flip_flop = port.flip_flop.as_ref().unwrap();
                        for cdef in &def.val.clock {
                            let mut cfg3 = cfg2.clone();
                            let mut pcfg3 = pcfg2.clone();
                            if !apply_opts(&mut cfg3.opts, &cdef.opts) {
                                continue;
                            }
                            if !apply_opts(&mut pcfg3.portopts, &cdef.portopts) {
                                continue;
                            }
                            if !cfg3.apply_clock(&cdef.val, flip_flop.clock) {
                                continue;
                            }
                            for endef in &def.val.rden {
                                let mut cfg4 = cfg3.clone();
                                let mut pcfg4 = pcfg3.clone();
                                if !apply_opts(&mut cfg4.opts, &endef.opts) {
                                    continue;
                                }
                                if !apply_opts(&mut pcfg4.portopts, &endef.portopts) {
                                    continue;
                                }
                                if endef.val == RdEnKind::None && flip_flop.has_enable() {
                                    pcfg4.emu_en = true;
                                }
                                cfg4.rd_ports.push(pcfg4);
                                new_cfgs.push(cfg4);
                            }
                        }
                    } else {
                        pcfg2.emu_sync = port.flip_flop.is_some();
                        cfg2.rd_ports.push(pcfg2);
                        new_cfgs.push(cfg2);
                    }
                }
                // Second pass: read port shared with a write port.
                for wpidx in 0..mem.write_ports.len() {
                    let wport = &mem.write_ports[wpidx];
                    let didx = cfg.wr_ports[wpidx].port_def;
                    let def = &ram_def.ports[didx];
                    if cfg.wr_ports[wpidx].rd_port.is_some() {
                        continue;
                    }
                    if !def.val.kind.can_read() {
                        continue;
                    }
                    if !self.addr_compatible(wpidx, pidx) {
                        continue;
                    }
                    if def.val.kind == PortKind::Srsw {
                        let Some(flip_flop) = &port.flip_flop else { continue };
                        if flip_flop.clock != wport.clock {
                            continue;
                        }
                    }
                    let mut cfg2 = cfg.clone();
                    cfg2.wr_ports[wpidx].rd_port = Some(pidx);
                    let mut pcfg2 = RdPortConfig::new(didx);
                    pcfg2.wr_port = Some(wpidx);
                    pcfg2.emu_sync = port.flip_flop.is_some() && def.val.kind == PortKind::Arsw;
                    if def.val.kind == PortKind::Srsw {
                        let flip_flop = port.flip_flop.as_ref().unwrap();
                        for endef in &def.val.rden {
                            let mut cfg3 = cfg2.clone();
                            let mut pcfg3 = pcfg2.clone();
                            if !cfg3.apply_wrport_opts(wpidx, endef) {
                                continue;
                            }
                            match endef.val {
                                RdEnKind::None => pcfg3.emu_en = flip_flop.has_enable(),
                                RdEnKind::Any => (),
                                RdEnKind::WriteImplies => pcfg3.emu_en = !self.wr_implies_rd(wpidx, pidx),
                                RdEnKind::WriteExcludes => {
                                    if !self.wr_excludes_rd(wpidx, pidx) {
                                        continue;
                                    }
                                }
                            }
                            cfg3.rd_ports.push(pcfg3);
                            new_cfgs.push(cfg3);
                        }
                    } else {
                        cfg2.rd_ports.push(pcfg2);
                        new_cfgs.push(cfg2);
                    }
                }
            }
            self.cfgs = new_cfgs;
        }
    }

    // Validate transparency restrictions, deciding where transparency has
    // to be realized in outside logic.
    fn handle_trans(&mut self) {
        let (mem, lib) = (self.mem, self.lib);
        for rpidx in 0..mem.read_ports.len() {
            let Some(flip_flop) = &mem.read_ports[rpidx].flip_flop else { continue };
            for wpidx in 0..mem.write_ports.len() {
                let wport = &mem.write_ports[wpidx];
                if !wport.is_clocked() {
                    continue;
                }
                if flip_flop.clock != wport.clock {
                    continue;
                }
                let transparent = match flip_flop.relations[wpidx] {
                    // A don't-care collision leaves nothing to uphold.
                    MemoryPortRelation::Undefined => continue,
                    MemoryPortRelation::Transparent => true,
                    MemoryPortRelation::ReadBeforeWrite => false,
                };
                let mut new_cfgs = vec![];
                for mut cfg in std::mem::take(&mut self.cfgs) {
                    let ram_def = &lib.ram_defs[cfg.ram_def];
                    let wpdef = &ram_def.ports[cfg.wr_ports[wpidx].port_def];
                    let rpdef = &ram_def.ports[cfg.rd_ports[rpidx].port_def];
                    if cfg.rd_ports[rpidx].emu_sync {
                        // The synthesized output register covers it; only
                        // transparency needs explicit logic.
                        if transparent {
                            cfg.rd_ports[rpidx].emu_trans.push(wpidx);
                        }
                        new_cfgs.push(cfg);
                    } else {
                        // Split through the applicable wrtrans capabilities.
                        // Reading the old value requires a capability; for
                        // transparent pairs emulation remains a fallback.
                        let mut found_free = false;
                        for tdef in &wpdef.val.wrtrans {
                            let matches_target = match &tdef.val.target {
                                TransTarget::Own => cfg.wr_ports[wpidx].rd_port == Some(rpidx),
                                TransTarget::Other => cfg.wr_ports[wpidx].rd_port != Some(rpidx),
                                TransTarget::Named(name) => rpdef.val.names[0] == *name,
                            };
                            if !matches_target {
                                continue;
                            }
                            if transparent != (tdef.val.kind == TransKind::New) {
                                continue;
                            }
                            let mut cfg2 = cfg.clone();
                            if cfg2.wrport_opts_applied(wpidx, tdef) {
                                found_free = true;
                            } else if !cfg2.apply_wrport_opts(wpidx, tdef) {
                                continue;
                            }
                            new_cfgs.push(cfg2);
                        }
                        if !found_free && transparent {
                            // No free capability; emulation is either the
                            // only way or may beat the splitting cost.
                            cfg.rd_ports[rpidx].emu_trans.push(wpidx);
                            new_cfgs.push(cfg);
                        }
                    }
                }
                self.cfgs = new_cfgs;
            }
        }
    }

    // Determine where soft priority logic has to be added.
    fn handle_priority(&mut self) {
        let (mem, lib) = (self.mem, self.lib);
        for p1idx in 0..mem.write_ports.len() {
            for p2idx in 0..mem.write_ports.len() {
                let port2 = &mem.write_ports[p2idx];
                if !port2.priority_over.get(p1idx).copied().unwrap_or(false) {
                    continue;
                }
                let mut new_cfgs = vec![];
                for mut cfg in std::mem::take(&mut self.cfgs) {
                    let ram_def = &lib.ram_defs[cfg.ram_def];
                    let p1def = &ram_def.ports[cfg.wr_ports[p1idx].port_def];
                    let p2def = &ram_def.ports[cfg.wr_ports[p2idx].port_def];
                    let mut found_free = false;
                    for prdef in &p2def.val.wrprio {
                        if p1def.val.names[0] != prdef.val {
                            continue;
                        }
                        let mut cfg2 = cfg.clone();
                        if cfg2.wrport_opts_applied(p2idx, prdef) {
                            found_free = true;
                        } else if !cfg2.apply_wrport_opts(p2idx, prdef) {
                            continue;
                        }
                        new_cfgs.push(cfg2);
                    }
                    if !found_free {
                        cfg.wr_ports[p2idx].emu_prio.push(p1idx);
                        new_cfgs.push(cfg);
                    }
                }
                self.cfgs = new_cfgs;
            }
        }
    }

    // Determine where soft logic has to cover a read port's init value,
    // async reset, or sync reset, binding named reset values as we go.
    fn handle_rd_rstval(&mut self, reset_kind: ResetKind) {
        let (mem, lib) = (self.mem, self.lib);
        for pidx in 0..mem.read_ports.len() {
            let Some(flip_flop) = &mem.read_ports[pidx].flip_flop else { continue };
            let value = match reset_kind {
                ResetKind::Init => {
                    if !flip_flop.has_init_value() {
                        continue;
                    }
                    &flip_flop.init_value
                }
                ResetKind::Async => {
                    if !flip_flop.has_clear() || !flip_flop.has_clear_value() {
                        continue;
                    }
                    &flip_flop.clear_value
                }
                ResetKind::Sync => {
                    if !flip_flop.has_reset() || !flip_flop.has_reset_value() {
                        continue;
                    }
                    &flip_flop.reset_value
                }
            };
            let mut new_cfgs = vec![];
            for mut cfg in std::mem::take(&mut self.cfgs) {
                let ram_def = &lib.ram_defs[cfg.ram_def];
                let pdef = &ram_def.ports[cfg.rd_ports[pidx].port_def];
                if cfg.rd_ports[pidx].emu_sync {
                    // The synthesized output register covers it for free.
                    new_cfgs.push(cfg);
                    continue;
                }
                let mut found_free = false;
                for rstdef in &pdef.val.rdrstval {
                    if rstdef.val.kind != reset_kind {
                        continue;
                    }
                    let mut cfg2 = cfg.clone();
                    if !apply_rstval(&mut cfg2.rd_ports[pidx], &rstdef.val, value) {
                        continue;
                    }
                    if cfg2.rdport_opts_applied(pidx, rstdef) {
                        found_free = true;
                    } else if !cfg2.apply_rdport_opts(pidx, rstdef) {
                        continue;
                    }
                    if reset_kind == ResetKind::Sync && flip_flop.has_enable() {
                        // The relative priority of enable and sync reset
                        // must end up right; any mode is usable, at worst
                        // the priority is emulated.
                        for mdef in &pdef.val.rdsrstmode {
                            let mut cfg3 = cfg2.clone();
                            if mdef.val == SrstKind::SrstOverEn && flip_flop.enable_over_reset {
                                cfg3.rd_ports[pidx].emu_srst_en_prio = true;
                            }
                            if mdef.val == SrstKind::EnOverSrst && !flip_flop.enable_over_reset {
                                cfg3.rd_ports[pidx].emu_srst_en_prio = true;
                            }
                            if !cfg3.apply_rdport_opts(pidx, mdef) {
                                continue;
                            }
                            new_cfgs.push(cfg3);
                        }
                    } else {
                        new_cfgs.push(cfg2);
                    }
                }
                if !found_free {
                    let pcfg = &mut cfg.rd_ports[pidx];
                    match reset_kind {
                        ResetKind::Init => pcfg.emu_init = true,
                        ResetKind::Async => pcfg.emu_arst = true,
                        ResetKind::Sync => pcfg.emu_srst = true,
                    }
                    new_cfgs.push(cfg);
                }
            }
            self.cfgs = new_cfgs;
        }
    }

    // Two ports can share a primitive port only when their addresses are
    // structurally the same signal, seen through the undef-mux map, above
    // the shared wide-address bits.
    fn addr_compatible(&self, wpidx: usize, rpidx: usize) -> bool {
        let wport = &self.mem.write_ports[wpidx];
        let rport = &self.mem.read_ports[rpidx];
        let max_wide_log2 = rport.wide_log2(self.mem).max(wport.wide_log2(self.mem));
        let raddr = rport.addr.slice(max_wide_log2.min(rport.addr.len())..);
        let waddr = wport.addr.slice(max_wide_log2.min(wport.addr.len())..);
        let abits = raddr.len().max(waddr.len());
        let raddr = raddr.zext(abits);
        let waddr = waddr.zext(abits);
        self.sigmap.map_value(&raddr) == self.sigmap.map_value(&waddr)
    }

    fn wr_en(&mut self, wpidx: usize) -> Lit {
        if let Some(&lit) = self.wr_en_cache.get(&wpidx) {
            return lit;
        }
        let lit = self.sat.or_reduce(&self.mem.write_ports[wpidx].mask);
        self.wr_en_cache.insert(wpidx, lit);
        lit
    }

    fn rd_en(&mut self, rpidx: usize) -> Lit {
        let enable = self.mem.read_ports[rpidx].flip_flop.as_ref().unwrap().enable;
        self.sat.import_control_net(enable)
    }

    /// Whenever any write enable bit holds, the read enable holds.
    fn wr_implies_rd(&mut self, wpidx: usize, rpidx: usize) -> bool {
        if let Some(&result) = self.wr_implies_rd_cache.get(&(wpidx, rpidx)) {
            return result;
        }
        let wr_en = self.wr_en(wpidx);
        let rd_en = self.rd_en(rpidx);
        let not_rd_en = self.sat.not(rd_en);
        let result = !self.sat.solve(&[wr_en, not_rd_en]);
        self.wr_implies_rd_cache.insert((wpidx, rpidx), result);
        result
    }

    /// The write enable and the read enable are never true at once.
    fn wr_excludes_rd(&mut self, wpidx: usize, rpidx: usize) -> bool {
        if let Some(&result) = self.wr_excludes_rd_cache.get(&(wpidx, rpidx)) {
            return result;
        }
        let wr_en = self.wr_en(wpidx);
        let rd_en = self.rd_en(rpidx);
        let result = !self.sat.solve(&[wr_en, rd_en]);
        self.wr_excludes_rd_cache.insert((wpidx, rpidx), result);
        result
    }
}

impl MapOutcome {
    pub fn is_mappable(&self) -> bool {
        !self.cfgs.is_empty() || self.logic_ok
    }

    /// Renders the candidate list the way a downstream selector would want
    /// to see it while debugging.
    pub fn describe(&self, lib: &Library) -> String {
        let mut text = String::new();
        if self.logic_ok {
            writeln!(text, "- logic fallback").unwrap();
        }
        for cfg in &self.cfgs {
            let ram_def = &lib.ram_defs[cfg.ram_def];
            writeln!(text, "- {}:", ram_def.id).unwrap();
            for (name, value) in &cfg.opts {
                writeln!(text, "  - option {} {}", name, value).unwrap();
            }
            for (pidx, pcfg) in cfg.wr_ports.iter().enumerate() {
                let pdef = &ram_def.ports[pcfg.port_def].val;
                match pcfg.rd_port {
                    None => writeln!(text, "  - write port {}: port group {}", pidx, pdef.names[0]).unwrap(),
                    Some(rd_port) => writeln!(
                        text,
                        "  - write port {}: port group {} (shared with read port {})",
                        pidx, pdef.names[0], rd_port
                    )
                    .unwrap(),
                }
                for (name, value) in &pcfg.portopts {
                    writeln!(text, "    - option {} {}", name, value).unwrap();
                }
                for &other in &pcfg.emu_prio {
                    writeln!(text, "    - emulate priority over write port {}", other).unwrap();
                }
            }
            for (pidx, pcfg) in cfg.rd_ports.iter().enumerate() {
                let pdef = &ram_def.ports[pcfg.port_def].val;
                match pcfg.wr_port {
                    None => writeln!(text, "  - read port {}: port group {}", pidx, pdef.names[0]).unwrap(),
                    Some(wr_port) => writeln!(
                        text,
                        "  - read port {}: port group {} (shared with write port {})",
                        pidx, pdef.names[0], wr_port
                    )
                    .unwrap(),
                }
                for (name, value) in &pcfg.portopts {
                    writeln!(text, "    - option {} {}", name, value).unwrap();
                }
                for (name, value) in &pcfg.resetvals {
                    writeln!(text, "    - reset value {} = {}", name, value).unwrap();
                }
                if pcfg.emu_sync {
                    writeln!(text, "    - emulate data register").unwrap();
                }
                if pcfg.emu_en {
                    writeln!(text, "    - emulate clock enable").unwrap();
                }
                if pcfg.emu_arst {
                    writeln!(text, "    - emulate async reset").unwrap();
                }
                if pcfg.emu_srst {
                    writeln!(text, "    - emulate sync reset").unwrap();
                }
                if pcfg.emu_init {
                    writeln!(text, "    - emulate init value").unwrap();
                }
                if pcfg.emu_srst_en_prio {
                    writeln!(text, "    - emulate sync reset / enable priority").unwrap();
                }
                for &other in &pcfg.emu_trans {
                    writeln!(text, "    - emulate transparency with write port {}", other).unwrap();
                }
            }
        }
        text
    }
}
