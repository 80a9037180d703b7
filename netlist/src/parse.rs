use std::{collections::BTreeMap, fmt::Display, ops::Range, str::FromStr};

use yap::{one_of, types::WithContext, IntoTokens, TokenLocation, Tokens};

use crate::{
    AttrValue, Const, ControlNet, Design, Memory, MemoryPortRelation, MemoryReadFlipFlop, MemoryReadPort,
    MemoryWritePort, Net, Value,
};

#[derive(Debug)]
struct Context {
    design: Design,
    def_map: BTreeMap<usize, Value>, // definition: index -> value
}

impl Context {
    fn new() -> Context {
        Context { design: Design::new(), def_map: BTreeMap::new() }
    }

    fn add_def(&mut self, index: usize, width: usize, value: Value) {
        assert_eq!(value.len(), width, "cell width should match declaration width");
        assert_eq!(self.def_map.insert(index, value), None, "cell indices cannot be reused");
    }

    fn get_use(&self, index: usize, offsets: Range<usize>) -> Value {
        let value = self.def_map.get(&index).expect("reference should follow its definition");
        value.slice(offsets)
    }
}

fn parse_space(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    t.skip_while(|c| *c == ' ' || *c == '\t') > 0
}

fn parse_comment(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    if !t.token(';') {
        return false;
    }
    t.skip_while(|c| *c != '\n');
    true
}

fn parse_blank(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    let space = parse_space(t);
    let comment = parse_comment(t);
    space || comment
}

fn parse_symbol(t: &mut WithContext<impl Tokens<Item = char>, Context>, symbol: char) -> Option<()> {
    if !t.token(symbol) {
        return None;
    }
    Some(())
}

fn parse_decimal<T: FromStr>(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<T> {
    t.take_while(|c| c.is_digit(10) || *c == '-').parse::<T, String>().ok()
}

fn parse_string_char(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<char> {
    match t.next() {
        Some('"' | '\\') => None,
        Some(char) if char.is_ascii() => Some(char),
        _ => None,
    }
}

fn parse_string(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    parse_symbol(t, '"')?;
    let chars = t.many(|t| parse_string_char(t)).collect::<String>();
    parse_symbol(t, '"')?;
    Some(chars)
}

fn parse_const(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Const> {
    t.take_while(|c| *c == 'X' || *c == '0' || *c == '1').parse::<Const, String>().ok().and_then(|value| {
        if !value.is_empty() {
            Some(value)
        } else {
            None
        }
    })
}

fn parse_keyword(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    let name: String = t.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '>')).collect();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

fn parse_keyword_eq(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    let keyword = parse_keyword(t)?;
    parse_blank(t);
    parse_symbol(t, '=')?;
    parse_blank(t);
    Some(keyword)
}

#[must_use]
fn parse_keyword_expect(t: &mut WithContext<impl Tokens<Item = char>, Context>, expected: &str) -> Option<()> {
    let keyword = parse_keyword(t)?;
    if keyword != expected {
        return None;
    }
    Some(())
}

#[must_use]
fn parse_keyword_eq_expect(t: &mut WithContext<impl Tokens<Item = char>, Context>, expected: &str) -> Option<()> {
    let keyword = parse_keyword_eq(t)?;
    if keyword != expected {
        return None;
    }
    Some(())
}

fn parse_cell_index(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<usize> {
    parse_symbol(t, '%')?;
    parse_decimal(t)
}

fn parse_cell_index_width(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<(usize, usize)> {
    let cell_index = parse_cell_index(t)?;
    parse_symbol(t, ':')?;
    let width = parse_decimal(t)?;
    Some((cell_index, width))
}

fn parse_cell_index_placeholder(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<usize> {
    let cell_index = parse_cell_index(t)?;
    parse_symbol(t, ':')?;
    parse_symbol(t, '_')?;
    Some(cell_index)
}

fn parse_cell_index_offset_width(
    t: &mut WithContext<impl Tokens<Item = char>, Context>,
) -> Option<(usize, usize, usize)> {
    let cell_index = parse_cell_index(t)?;
    let offset = if parse_symbol(t, '+').is_some() {
        parse_decimal(t)?
    } else {
        0
    };
    let width = if parse_symbol(t, ':').is_some() {
        parse_decimal(t)?
    } else {
        1
    };
    Some((cell_index, offset, width))
}

fn parse_value_part(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Value> {
    let value = one_of!(t;
        parse_const(t).map(Value::from),
        parse_cell_index_offset_width(t).map(|(cell_index, offset, width)| {
            t.context().get_use(cell_index, offset..offset + width)
        }),
    )?;
    if parse_symbol(t, '*').is_some() {
        let repeat = parse_decimal(t)?;
        Some(value.repeat(repeat))
    } else {
        Some(value)
    }
}

fn parse_value_concat(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Value> {
    let mut value = Value::new();
    parse_symbol(t, '[')?;
    let parts = Vec::from_iter(
        t.many(|t| {
            parse_blank(t);
            parse_value_part(t)
        })
        .as_iter(),
    );
    for part in parts.into_iter().rev() {
        value.extend(part.iter());
    }
    parse_blank(t);
    parse_symbol(t, ']')?;
    Some(value)
}

fn parse_value_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Value> {
    parse_blank(t);
    one_of!(t;
        parse_value_part(t),
        parse_value_concat(t)
    )
}

fn parse_net_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Net> {
    parse_blank(t);
    parse_value_part(t).map(|value| {
        assert_eq!(value.len(), 1, "reference should be a single net");
        value[0]
    })
}

fn parse_control_net_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<ControlNet> {
    parse_blank(t);
    let negated = parse_symbol(t, '!').is_some();
    let net = parse_net_arg(t)?;
    if negated {
        Some(ControlNet::Neg(net))
    } else {
        Some(ControlNet::Pos(net))
    }
}

fn parse_control_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>, name: &str) -> Option<ControlNet> {
    parse_blank(t);
    parse_keyword_eq_expect(t, name)?;
    parse_control_net_arg(t)
}

fn parse_string_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<String> {
    parse_blank(t);
    parse_string(t)
}

fn parse_reset_control_net_arg(
    t: &mut WithContext<impl Tokens<Item = char>, Context>,
    name: &str,
) -> Option<(ControlNet, Option<Const>)> {
    parse_control_arg(t, name).map(|control_net| {
        let value = t.optional(|t| {
            parse_blank(t);
            parse_symbol(t, ',')?;
            parse_blank(t);
            parse_const(t)
        });
        (control_net, value)
    })
}

fn parse_enable_over_reset_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<bool> {
    parse_blank(t);
    one_of!(t;
        parse_keyword(t).filter(|kw| kw == "rst>en").map(|_| false),
        parse_keyword(t).filter(|kw| kw == "en>rst").map(|_| true),
    )
}

fn parse_init_value_arg(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<Const> {
    parse_blank(t);
    parse_keyword_eq_expect(t, "init")?;
    parse_const(t)
}

fn parse_attr_value(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<AttrValue> {
    one_of!(t;
        parse_symbol(t, '#').and_then(|()| parse_decimal(t)).map(AttrValue::Int),
        parse_string(t).map(AttrValue::String),
    )
}

fn parse_memory_write(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<MemoryWritePort> {
    parse_keyword_expect(t, "write")?;
    parse_blank(t);
    parse_keyword_eq_expect(t, "addr")?;
    let addr = parse_value_arg(t)?;
    parse_blank(t);
    parse_keyword_eq_expect(t, "data")?;
    let data = parse_value_arg(t)?;
    parse_blank(t);
    let mask = t
        .optional(|t| {
            parse_keyword_eq_expect(t, "mask")?;
            parse_value_arg(t)
        })
        .unwrap_or_else(|| Value::ones(data.len()));
    let clock = parse_control_arg(t, "clk")?;
    let priority_over_indices = t
        .optional(|t| {
            parse_blank(t);
            parse_keyword_eq_expect(t, "prio")?;
            parse_symbol(t, '[')?;
            let indices = Vec::from_iter(
                t.many(|t| {
                    parse_blank(t);
                    parse_symbol(t, '#')?;
                    parse_decimal::<usize>(t)
                })
                .as_iter(),
            );
            parse_blank(t);
            parse_symbol(t, ']')?;
            Some(indices)
        })
        .unwrap_or_default();
    let mut priority_over = vec![];
    for index in priority_over_indices {
        if priority_over.len() <= index {
            priority_over.resize(index + 1, false);
        }
        priority_over[index] = true;
    }
    Some(MemoryWritePort { addr, data, mask, clock, priority_over })
}

fn parse_memory_read(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<MemoryReadPort> {
    let (index, width) = parse_cell_index_width(t)?;
    parse_blank(t);
    parse_symbol(t, '=')?;
    parse_blank(t);
    parse_keyword_expect(t, "read")?;
    parse_blank(t);
    parse_keyword_eq_expect(t, "addr")?;
    let addr = parse_value_arg(t)?;
    let flip_flop = t.optional(|t| {
        let clock = parse_control_arg(t, "clk")?;
        let (clear, clear_value) =
            t.optional(|t| parse_reset_control_net_arg(t, "clr")).unwrap_or((ControlNet::ZERO, None));
        let (reset, reset_value) =
            t.optional(|t| parse_reset_control_net_arg(t, "rst")).unwrap_or((ControlNet::ZERO, None));
        let enable = t.optional(|t| parse_control_arg(t, "en")).unwrap_or(ControlNet::ONE);
        let enable_over_reset = t.optional(|t| parse_enable_over_reset_arg(t)).unwrap_or(false);
        let init_value = t.optional(|t| parse_init_value_arg(t)).unwrap_or_else(|| Const::undef(width));
        let mut relations = vec![];
        parse_blank(t);
        if parse_symbol(t, '[').is_some() {
            while let Some(()) = t.optional(|t| {
                parse_blank(t);
                let keyword = parse_keyword(t)?;
                relations.push(match keyword.as_str() {
                    "undef" => MemoryPortRelation::Undefined,
                    "rdfirst" => MemoryPortRelation::ReadBeforeWrite,
                    "trans" => MemoryPortRelation::Transparent,
                    _ => return None,
                });
                Some(())
            }) {}
            parse_blank(t);
            parse_symbol(t, ']')?;
        }
        Some(MemoryReadFlipFlop {
            clock,
            clear,
            clear_value: clear_value.unwrap_or_else(|| Const::undef(width)),
            reset,
            reset_value: reset_value.unwrap_or_else(|| Const::undef(width)),
            enable,
            enable_over_reset,
            init_value,
            relations,
        })
    });
    let ctx = t.context_mut();
    let output = ctx.design.add_void(width);
    ctx.add_def(index, width, output);
    Some(MemoryReadPort { addr, data_len: width, flip_flop })
}

fn parse_memory(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    parse_cell_index_placeholder(t)?;
    parse_blank(t);
    parse_symbol(t, '=')?;
    parse_blank(t);
    parse_keyword_expect(t, "memory")?;
    parse_blank(t);
    parse_keyword_eq_expect(t, "depth")?;
    parse_symbol(t, '#')?;
    let depth = parse_decimal(t)?;
    parse_blank(t);
    parse_keyword_eq_expect(t, "width")?;
    parse_symbol(t, '#')?;
    let width = parse_decimal(t)?;
    parse_blank(t);
    parse_symbol(t, '{')?;
    parse_blank(t);
    parse_symbol(t, '\n')?;
    let mut memory = Memory {
        depth,
        width,
        init_value: Const::new(),
        attributes: Default::default(),
        write_ports: vec![],
        read_ports: vec![],
    };
    while let Some(()) = t.optional(|t| {
        parse_blank(t);
        one_of!(t;
            parse_memory_read(t).map(|port| memory.read_ports.push(port)),
            parse_memory_write(t).map(|port| memory.write_ports.push(port)),
            parse_keyword_expect(t, "init").and_then(|()| {
                parse_blank(t);
                parse_const(t).map(|value| memory.init_value.extend(value.iter()))
            }),
            parse_keyword_expect(t, "attr").and_then(|()| {
                parse_blank(t);
                let name = parse_string(t)?;
                parse_blank(t);
                parse_symbol(t, '=')?;
                parse_blank(t);
                let value = parse_attr_value(t)?;
                assert!(memory.attributes.insert(name, value).is_none(), "duplicate attribute name");
                Some(())
            }),
        )?;
        parse_blank(t);
        parse_symbol(t, '\n')?;
        Some(())
    }) {}
    parse_blank(t);
    parse_symbol(t, '}')?;
    let pad = (depth * width).checked_sub(memory.init_value.len()).expect("init value too long for memory");
    memory.init_value = std::mem::take(&mut memory.init_value).concat(Const::undef(pad));
    let write_count = memory.write_ports.len();
    for (index, port) in memory.write_ports.iter_mut().enumerate() {
        assert!(port.priority_over.len() <= index, "priority must refer to an earlier write port");
        port.priority_over.resize(index, false);
    }
    for port in memory.read_ports.iter_mut() {
        if let Some(flip_flop) = &mut port.flip_flop {
            assert!(flip_flop.relations.len() <= write_count, "more relations than write ports");
            flip_flop.relations.resize(write_count, MemoryPortRelation::Undefined);
        }
    }
    t.context_mut().design.add_memory(memory);
    Some(())
}

fn parse_builtin(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    let (index, width) = parse_cell_index_width(t)?;
    parse_blank(t);
    parse_symbol(t, '=')?;
    parse_blank(t);
    let keyword = parse_keyword(t)?;
    let output = match keyword.as_ref() {
        "input" => {
            let name = parse_string_arg(t)?;
            t.context_mut().design.add_input(name, width)
        }
        "not" => {
            let arg = parse_value_arg(t)?;
            t.context_mut().design.add_not(arg)
        }
        "and" => {
            let (arg1, arg2) = (parse_value_arg(t)?, parse_value_arg(t)?);
            t.context_mut().design.add_and(arg1, arg2)
        }
        "or" => {
            let (arg1, arg2) = (parse_value_arg(t)?, parse_value_arg(t)?);
            t.context_mut().design.add_or(arg1, arg2)
        }
        "xor" => {
            let (arg1, arg2) = (parse_value_arg(t)?, parse_value_arg(t)?);
            t.context_mut().design.add_xor(arg1, arg2)
        }
        "mux" => {
            let sel = parse_net_arg(t)?;
            let (arg1, arg2) = (parse_value_arg(t)?, parse_value_arg(t)?);
            t.context_mut().design.add_mux(sel, arg1, arg2)
        }
        "output" => {
            let name = parse_string_arg(t)?;
            let arg = parse_value_arg(t)?;
            t.context_mut().design.add_output(name, arg);
            Value::new()
        }
        _ => return None,
    };
    t.context_mut().add_def(index, width, output);
    Some(())
}

fn parse_cell(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> Option<()> {
    one_of!(t;
        parse_memory(t),
        parse_builtin(t),
    )?;
    parse_blank(t);
    parse_symbol(t, '\n')?;
    Some(())
}

fn parse_line(t: &mut WithContext<impl Tokens<Item = char>, Context>) -> bool {
    parse_blank(t);
    one_of!(t;
        parse_cell(t).is_some(),
        t.token('\n')
    )
}

#[derive(Debug)]
pub struct ParseError {
    source: String,
    offset: usize,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse near offset {}: {:?}", self.offset, &self.source[self.offset..])
    }
}

impl std::error::Error for ParseError {}

pub fn parse(source: &str) -> Result<Design, ParseError> {
    let context = Context::new();
    let mut tokens = source.into_tokens().with_context(context);
    while parse_line(&mut tokens) {}
    parse_blank(&mut tokens);
    let (mut tokens, context) = tokens.into_parts();
    if !tokens.eof() {
        return Err(ParseError { source: String::from(source), offset: tokens.location().offset() });
    }
    Ok(context.design)
}

impl FromStr for Design {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        crate::parse(source)
    }
}
