use std::collections::BTreeMap;

use crate::{Cell, Design, Net, Value};

/// A canonicalizing net map. Defaults to the identity; aliases added for a
/// net redirect it (transitively) to another net.
#[derive(Debug, Clone, Default)]
pub struct SigMap {
    aliases: BTreeMap<Net, Net>,
}

impl SigMap {
    pub fn new() -> SigMap {
        SigMap::default()
    }

    pub fn alias(&mut self, from: Net, to: Net) {
        assert!(from.as_const().is_none());
        if from != to {
            self.aliases.insert(from, to);
        }
    }

    pub fn map_net(&self, net: Net) -> Net {
        let mut net = net;
        while let Some(&target) = self.aliases.get(&net) {
            net = target;
        }
        net
    }

    pub fn map_value(&self, value: &Value) -> Value {
        Value::from_iter(value.iter().map(|net| self.map_net(net)))
    }
}

impl Design {
    /// Builds a net map that sees through muxes with a fully-undef input:
    /// the output of such a mux is an alias for the other input.
    pub fn xmux_map(&self) -> SigMap {
        let mut map = SigMap::new();
        for (cell, output) in self.iter_cells() {
            if let Cell::Mux(_, arg1, arg2) = cell {
                let keep = if arg1.is_undef() {
                    arg2
                } else if arg2.is_undef() {
                    arg1
                } else {
                    continue;
                };
                for (net, target) in output.iter().zip(keep.iter()) {
                    map.alias(net, target);
                }
            }
        }
        map
    }
}

#[cfg(test)]
mod test {
    use super::SigMap;
    use crate::{Design, Net, Value};

    #[test]
    fn test_chase() {
        let mut map = SigMap::new();
        let nets: Vec<Net> = (0..3).map(Net::from_index).collect();
        map.alias(nets[2], nets[1]);
        map.alias(nets[1], nets[0]);
        assert_eq!(map.map_net(nets[2]), nets[0]);
        assert_eq!(map.map_net(Net::ONE), Net::ONE);
    }

    #[test]
    fn test_xmux() {
        let mut design = Design::new();
        let addr = design.add_input("addr", 4);
        let sel = design.add_input("sel", 1);
        let muxed = design.add_mux(sel[0], Value::undef(4), addr.clone());
        let map = design.xmux_map();
        assert_eq!(map.map_value(&muxed), addr);
        let opaque = design.add_mux(sel[0], Value::zero(4), addr.clone());
        assert_eq!(design.xmux_map().map_value(&opaque), opaque);
    }
}
