use std::collections::BTreeMap;

use memlib_netlist::{Cell, ControlNet, Design, Net, Trit, Value};

/// A literal in the solver's node table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Lit(usize);

#[derive(Debug, Clone, Copy)]
enum Node {
    Const(bool),
    Var(usize),
    Not(Lit),
    And(Lit, Lit),
    Or(Lit, Lit),
    Xor(Lit, Lit),
    Mux(Lit, Lit, Lit),
}

/// A small satisfiability oracle over the combinational cones feeding
/// memory port enables. Nets are imported on demand by walking their
/// drivers down to inputs and undriven nets, which become free variables;
/// queries are answered by exhaustive enumeration over those variables.
///
/// Above `var_limit` free variables a query conservatively reports
/// "satisfiable", so derived predicates fail towards emulation rather than
/// claiming a proof.
#[derive(Debug)]
pub struct ConeSat<'a> {
    design: &'a Design,
    nodes: Vec<Node>,
    num_vars: usize,
    imported: BTreeMap<Net, Lit>,
    var_limit: usize,
}

impl<'a> ConeSat<'a> {
    pub fn new(design: &'a Design) -> Self {
        ConeSat { design, nodes: vec![], num_vars: 0, imported: BTreeMap::new(), var_limit: 20 }
    }

    fn add_node(&mut self, node: Node) -> Lit {
        self.nodes.push(node);
        Lit(self.nodes.len() - 1)
    }

    fn add_var(&mut self) -> Lit {
        let index = self.num_vars;
        self.num_vars += 1;
        self.add_node(Node::Var(index))
    }

    pub fn import_net(&mut self, net: Net) -> Lit {
        if let Some(&lit) = self.imported.get(&net) {
            return lit;
        }
        let lit = match net.as_const() {
            Some(Trit::Zero) => self.add_node(Node::Const(false)),
            Some(Trit::One) => self.add_node(Node::Const(true)),
            // an undef bit can settle either way
            Some(Trit::Undef) => self.add_var(),
            None => match self.design.driver(net) {
                None => self.add_var(),
                Some((cell, offset)) => match cell {
                    Cell::Input(_, _) | Cell::Void(_) => self.add_var(),
                    Cell::Not(arg) => {
                        let arg = self.import_net(arg[offset]);
                        self.add_node(Node::Not(arg))
                    }
                    Cell::And(arg1, arg2) => {
                        let args = (self.import_net(arg1[offset]), self.import_net(arg2[offset]));
                        self.add_node(Node::And(args.0, args.1))
                    }
                    Cell::Or(arg1, arg2) => {
                        let args = (self.import_net(arg1[offset]), self.import_net(arg2[offset]));
                        self.add_node(Node::Or(args.0, args.1))
                    }
                    Cell::Xor(arg1, arg2) => {
                        let args = (self.import_net(arg1[offset]), self.import_net(arg2[offset]));
                        self.add_node(Node::Xor(args.0, args.1))
                    }
                    Cell::Mux(sel, arg1, arg2) => {
                        let sel = self.import_net(*sel);
                        let args = (self.import_net(arg1[offset]), self.import_net(arg2[offset]));
                        self.add_node(Node::Mux(sel, args.0, args.1))
                    }
                    Cell::Output(_, _) => unreachable!("output cells drive no nets"),
                },
            },
        };
        self.imported.insert(net, lit);
        lit
    }

    pub fn import_control_net(&mut self, control_net: ControlNet) -> Lit {
        let lit = self.import_net(control_net.net());
        if control_net.is_negative() {
            self.not(lit)
        } else {
            lit
        }
    }

    /// Imports every bit of `value` and reduces them with `Or`; an empty
    /// value yields constant false.
    pub fn or_reduce(&mut self, value: &Value) -> Lit {
        let mut result = None;
        for net in value.iter() {
            let lit = self.import_net(net);
            result = Some(match result {
                None => lit,
                Some(acc) => self.add_node(Node::Or(acc, lit)),
            });
        }
        result.unwrap_or_else(|| self.add_node(Node::Const(false)))
    }

    pub fn not(&mut self, lit: Lit) -> Lit {
        self.add_node(Node::Not(lit))
    }

    fn eval(&self, lit: Lit, assignment: u64, cache: &mut [Option<bool>]) -> bool {
        if let Some(value) = cache[lit.0] {
            return value;
        }
        let value = match self.nodes[lit.0] {
            Node::Const(value) => value,
            Node::Var(index) => assignment & (1 << index) != 0,
            Node::Not(arg) => !self.eval(arg, assignment, cache),
            Node::And(arg1, arg2) => self.eval(arg1, assignment, cache) & self.eval(arg2, assignment, cache),
            Node::Or(arg1, arg2) => self.eval(arg1, assignment, cache) | self.eval(arg2, assignment, cache),
            Node::Xor(arg1, arg2) => self.eval(arg1, assignment, cache) ^ self.eval(arg2, assignment, cache),
            Node::Mux(sel, arg1, arg2) => {
                if self.eval(sel, assignment, cache) {
                    self.eval(arg1, assignment, cache)
                } else {
                    self.eval(arg2, assignment, cache)
                }
            }
        };
        cache[lit.0] = Some(value);
        value
    }

    /// True iff some assignment of the free variables makes every
    /// assumption literal true at once.
    pub fn solve(&mut self, assumptions: &[Lit]) -> bool {
        if self.num_vars > self.var_limit {
            return true;
        }
        for assignment in 0u64..1 << self.num_vars {
            let mut cache = vec![None; self.nodes.len()];
            if assumptions.iter().all(|&lit| self.eval(lit, assignment, &mut cache)) {
                return true;
            }
        }
        false
    }
}
