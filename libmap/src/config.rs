use indexmap::IndexMap;

use memlib_netlist::{Const, ControlNet, Net};

use crate::library::{Capability, ClkPolKind, ClockDef, Options, ResetValDef, ResetValKind};
use crate::options::{apply_opts, opts_applied};

/// Assignment of one source write port to a primitive port group.
#[derive(Debug, Clone, PartialEq)]
pub struct WrPortConfig {
    /// Index of the source read port this port is merged with.
    pub rd_port: Option<usize>,
    /// Index of the port group in the RAM definition.
    pub port_def: usize,
    /// Already-decided port option settings.
    pub portopts: Options,
    /// Emulate priority over these source write ports in outside logic.
    pub emu_prio: Vec<usize>,
    /// Chosen width for this port; picked by the geometry stage.
    pub width: usize,
    /// Chosen byte-enable unit width; picked by the geometry stage.
    pub wrbe: usize,
}

impl WrPortConfig {
    pub fn new(port_def: usize) -> Self {
        WrPortConfig { rd_port: None, port_def, portopts: Options::new(), emu_prio: vec![], width: 0, wrbe: 0 }
    }
}

/// Assignment of one source read port to a primitive port group.
#[derive(Debug, Clone, PartialEq)]
pub struct RdPortConfig {
    /// Index of the source write port this port is merged with. When set,
    /// the paired write port's portopts are authoritative and `portopts`
    /// here stays unused.
    pub wr_port: Option<usize>,
    /// Index of the port group in the RAM definition.
    pub port_def: usize,
    pub portopts: Options,
    /// Values bound to the named reset value slots of the port group.
    pub resetvals: IndexMap<String, Const>,
    /// A sync source port mapped onto an async primitive port; the output
    /// register is synthesized outside. Excludes the remaining emulations.
    pub emu_sync: bool,
    pub emu_en: bool,
    pub emu_arst: bool,
    pub emu_srst: bool,
    pub emu_init: bool,
    /// Emulate the enable / sync reset priority.
    pub emu_srst_en_prio: bool,
    /// Emulate transparency with these source write ports in outside logic.
    pub emu_trans: Vec<usize>,
    /// Chosen width for this port; picked by the geometry stage.
    pub width: usize,
}

impl RdPortConfig {
    pub fn new(port_def: usize) -> Self {
        RdPortConfig {
            wr_port: None,
            port_def,
            portopts: Options::new(),
            resetvals: IndexMap::new(),
            emu_sync: false,
            emu_en: false,
            emu_arst: false,
            emu_srst: false,
            emu_init: false,
            emu_srst_en_prio: false,
            emu_trans: vec![],
            width: 0,
        }
    }
}

/// One still-feasible placement of a memory into one RAM definition. All
/// cross-references are indices: into the library for `ram_def`, into the
/// RAM definition's port groups for `port_def`, and into the source
/// memory's port lists for the pairing links.
#[derive(Debug, Clone, PartialEq)]
pub struct MemConfig {
    pub ram_def: usize,
    /// Already-decided RAM option settings.
    pub opts: Options,
    pub wr_ports: Vec<WrPortConfig>,
    pub rd_ports: Vec<RdPortConfig>,
    /// Clock assignments for named anyedge clocks: signal and shared
    /// polarity.
    pub clocks_anyedge: IndexMap<String, (Net, bool)>,
    /// Clock assignments for named posedge/negedge clocks: signal and the
    /// "needs inversion" flag.
    pub clocks_pnedge: IndexMap<String, (Net, bool)>,
}

impl MemConfig {
    pub fn new(ram_def: usize) -> Self {
        MemConfig {
            ram_def,
            opts: Options::new(),
            wr_ports: vec![],
            rd_ports: vec![],
            clocks_anyedge: IndexMap::new(),
            clocks_pnedge: IndexMap::new(),
        }
    }

    pub fn apply_wrport_opts<T>(&mut self, pidx: usize, cap: &Capability<T>) -> bool {
        apply_opts(&mut self.opts, &cap.opts) && apply_opts(&mut self.wr_ports[pidx].portopts, &cap.portopts)
    }

    pub fn apply_rdport_opts<T>(&mut self, pidx: usize, cap: &Capability<T>) -> bool {
        if let Some(wr_port) = self.rd_ports[pidx].wr_port {
            return self.apply_wrport_opts(wr_port, cap);
        }
        apply_opts(&mut self.opts, &cap.opts) && apply_opts(&mut self.rd_ports[pidx].portopts, &cap.portopts)
    }

    pub fn wrport_opts_applied<T>(&self, pidx: usize, cap: &Capability<T>) -> bool {
        opts_applied(&self.opts, &cap.opts) && opts_applied(&self.wr_ports[pidx].portopts, &cap.portopts)
    }

    pub fn rdport_opts_applied<T>(&self, pidx: usize, cap: &Capability<T>) -> bool {
        if let Some(wr_port) = self.rd_ports[pidx].wr_port {
            return self.wrport_opts_applied(wr_port, cap);
        }
        opts_applied(&self.opts, &cap.opts) && opts_applied(&self.rd_ports[pidx].portopts, &cap.portopts)
    }

    /// Binds the source clock to the clock definition's name, or checks the
    /// existing binding. Unnamed clocks always succeed and record nothing.
    pub fn apply_clock(&mut self, def: &ClockDef, clock: ControlNet) -> bool {
        let Some(name) = &def.name else { return true };
        let net = clock.net();
        if def.kind == ClkPolKind::Anyedge {
            match self.clocks_anyedge.get(name) {
                None => {
                    self.clocks_anyedge.insert(name.clone(), (net, clock.is_positive()));
                    true
                }
                Some(&bound) => bound == (net, clock.is_positive()),
            }
        } else {
            let flip = clock.is_positive() ^ (def.kind == ClkPolKind::Posedge);
            match self.clocks_pnedge.get(name) {
                None => {
                    self.clocks_pnedge.insert(name.clone(), (net, flip));
                    true
                }
                Some(&bound) => bound == (net, flip),
            }
        }
    }
}

/// Binds `val` to the reset value capability: zero slots accept values with
/// no set bits, named slots are bound on first use and must agree later.
pub fn apply_rstval(pcfg: &mut RdPortConfig, def: &ResetValDef, val: &Const) -> bool {
    match &def.val_kind {
        ResetValKind::None => false,
        ResetValKind::Zero => !val.has_one(),
        ResetValKind::Named(name) => match pcfg.resetvals.get(name) {
            None => {
                pcfg.resetvals.insert(name.clone(), val.clone());
                true
            }
            Some(bound) => bound == val,
        },
    }
}

#[cfg(test)]
mod test {
    use super::{apply_rstval, MemConfig, RdPortConfig};
    use crate::library::{ClkPolKind, ClockDef, ResetKind, ResetValDef, ResetValKind};
    use memlib_netlist::{Const, ControlNet, Net};
    use std::str::FromStr;

    fn named(kind: ClkPolKind) -> ClockDef {
        ClockDef { kind, name: Some("CLK".to_owned()) }
    }

    #[test]
    fn test_apply_clock_anyedge() {
        let mut cfg = MemConfig::new(0);
        let clk = ControlNet::Pos(Net::from(true));
        assert!(cfg.apply_clock(&named(ClkPolKind::Anyedge), clk));
        assert!(cfg.apply_clock(&named(ClkPolKind::Anyedge), clk));
        assert!(!cfg.apply_clock(&named(ClkPolKind::Anyedge), ControlNet::Neg(clk.net())));
    }

    #[test]
    fn test_apply_clock_pnedge() {
        let mut cfg = MemConfig::new(0);
        let net = Net::from(true);
        // posedge source on a posedge pin and negedge source on a negedge
        // pin agree on the inverter setting.
        assert!(cfg.apply_clock(&named(ClkPolKind::Posedge), ControlNet::Pos(net)));
        assert!(cfg.apply_clock(&named(ClkPolKind::Negedge), ControlNet::Neg(net)));
        assert!(!cfg.apply_clock(&named(ClkPolKind::Negedge), ControlNet::Pos(net)));
    }

    #[test]
    fn test_apply_clock_unnamed() {
        let mut cfg = MemConfig::new(0);
        let def = ClockDef { kind: ClkPolKind::Anyedge, name: None };
        assert!(cfg.apply_clock(&def, ControlNet::Pos(Net::from(true))));
        assert!(cfg.clocks_anyedge.is_empty());
    }

    #[test]
    fn test_apply_rstval() {
        let mut pcfg = RdPortConfig::new(0);
        let zero = ResetValDef { kind: ResetKind::Sync, val_kind: ResetValKind::Zero };
        assert!(apply_rstval(&mut pcfg, &zero, &Const::from_str("0X00").unwrap()));
        assert!(!apply_rstval(&mut pcfg, &zero, &Const::from_str("0100").unwrap()));
        let named = ResetValDef { kind: ResetKind::Sync, val_kind: ResetValKind::Named("RV".to_owned()) };
        assert!(apply_rstval(&mut pcfg, &named, &Const::from_str("1010").unwrap()));
        assert!(apply_rstval(&mut pcfg, &named, &Const::from_str("1010").unwrap()));
        assert!(!apply_rstval(&mut pcfg, &named, &Const::from_str("1111").unwrap()));
    }
}
