use std::str::FromStr;

use memlib_netlist::{AttrValue, ControlNet, Design, MemoryPortRelation, Net};

#[test]
fn test_memory() {
    let design = Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"wa\"\n",
        "%20:1 = input \"we\"\n",
        "%21:1 = input \"re\"\n",
        "%30:4 = input \"ra\"\n",
        "%40:1 = input \"clk\"\n",
        "%50:_ = memory depth=#16 width=#4 {\n",
        "    init 0101\n",
        "    attr \"ram_style\" = \"block\"\n",
        "    write addr=%10:4 data=%0:4 mask=%20*4 clk=%40\n",
        "    %50:4 = read addr=%30:4 clk=!%40 en=%21 [trans]\n",
        "}\n",
        "%60:0 = output \"rd\" %50:4\n",
    ))
    .unwrap();
    assert_eq!(design.memories().len(), 1);
    let memory = &design.memories()[0];
    assert_eq!(memory.depth, 16);
    assert_eq!(memory.width, 4);
    assert!(memory.has_init());
    assert_eq!(memory.init_value.len(), 64);
    assert!(memory.init_value.has_one());
    assert_eq!(memory.attr("ram_style"), Some(&AttrValue::String("block".to_owned())));

    let write_port = &memory.write_ports[0];
    assert_eq!(write_port.mask.len(), 4);
    assert_eq!(write_port.mask[0], write_port.mask[3]);
    assert!(write_port.is_clocked());
    assert!(write_port.clock.is_positive());

    let read_port = &memory.read_ports[0];
    assert_eq!(read_port.data_len, 4);
    let flip_flop = read_port.flip_flop.as_ref().unwrap();
    assert!(flip_flop.clock.is_negative());
    assert!(flip_flop.has_enable());
    assert!(!flip_flop.has_reset());
    assert!(!flip_flop.has_init_value());
    assert_eq!(flip_flop.relations, vec![MemoryPortRelation::Transparent]);
}

#[test]
fn test_memory_defaults() {
    let design = Design::from_str(concat!(
        "%0:2 = input \"wd\"\n",
        "%1:3 = input \"wa\"\n",
        "%2:1 = input \"clk\"\n",
        "%3:3 = input \"ra\"\n",
        "%10:_ = memory depth=#8 width=#2 {\n",
        "    write addr=%1:3 data=%0:2 clk=%2\n",
        "    %10:2 = read addr=%3:3\n",
        "}\n",
    ))
    .unwrap();
    let memory = &design.memories()[0];
    assert!(!memory.has_init());
    assert!(memory.attributes.is_empty());
    // an omitted mask enables every bit
    assert_eq!(memory.write_ports[0].mask, memlib_netlist::Value::ones(2));
    // a read port without a clock is asynchronous
    assert!(memory.read_ports[0].flip_flop.is_none());
}

#[test]
fn test_memory_priority_relations() {
    let design = Design::from_str(concat!(
        "%0:4 = input \"w0d\"\n",
        "%1:4 = input \"w1d\"\n",
        "%10:4 = input \"w0a\"\n",
        "%11:4 = input \"w1a\"\n",
        "%20:1 = input \"clk\"\n",
        "%30:4 = input \"ra\"\n",
        "%40:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 clk=%20\n",
        "    write addr=%11:4 data=%1:4 clk=%20 prio=[ #0 ]\n",
        "    %40:4 = read addr=%30:4 clk=%20 [undef rdfirst]\n",
        "}\n",
    ))
    .unwrap();
    let memory = &design.memories()[0];
    assert_eq!(memory.write_ports[0].priority_over, vec![]);
    assert_eq!(memory.write_ports[1].priority_over, vec![true]);
    let flip_flop = memory.read_ports[0].flip_flop.as_ref().unwrap();
    assert_eq!(flip_flop.relations, vec![MemoryPortRelation::Undefined, MemoryPortRelation::ReadBeforeWrite]);
}

#[test]
fn test_read_reset_values() {
    let design = Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"wa\"\n",
        "%20:1 = input \"clk\"\n",
        "%21:1 = input \"re\"\n",
        "%22:1 = input \"rst\"\n",
        "%23:1 = input \"clr\"\n",
        "%30:4 = input \"ra\"\n",
        "%40:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 clk=%20\n",
        "    %40:4 = read addr=%30:4 clk=%20 clr=%23,1111 rst=%22,0000 en=%21 en>rst init=1010 [undef]\n",
        "}\n",
    ))
    .unwrap();
    let flip_flop = design.memories()[0].read_ports[0].flip_flop.as_ref().unwrap();
    assert!(flip_flop.has_clear() && flip_flop.has_clear_value());
    assert!(flip_flop.has_reset() && flip_flop.has_reset_value());
    assert!(!flip_flop.reset_value.has_one());
    assert!(flip_flop.enable_over_reset);
    assert!(flip_flop.has_init_value());
}

#[test]
fn test_logic_cells() {
    let design = Design::from_str(concat!(
        "%0:2 = input \"a\"\n",
        "%1:2 = input \"b\"\n",
        "%2:1 = input \"s\"\n",
        "%3:2 = and %0:2 %1:2\n",
        "%4:2 = or %0:2 %1:2\n",
        "%5:2 = xor %0:2 [ %1+1 %1+0 ]\n",
        "%6:2 = not %3:2\n",
        "%7:2 = mux %2 %4:2 XX\n",
        "%8:0 = output \"q\" [ %6:2 %7:2 ]\n",
    ))
    .unwrap();
    // the undef-mux map sees through %7 to %4
    let sigmap = design.xmux_map();
    let mut mapped = vec![];
    for (cell, output) in design.iter_cells() {
        if let memlib_netlist::Cell::Mux(_, _, _) = cell {
            mapped.push(sigmap.map_value(output));
        }
    }
    assert_eq!(mapped.len(), 1);
    assert!(mapped[0].iter().all(|net| net != Net::UNDEF));
}

#[test]
fn test_comments_and_blanks() {
    let design = Design::from_str(concat!(
        "; a comment line\n",
        "\n",
        "%0:1 = input \"a\" ; trailing comment\n",
        "%1:1 = not %0\n",
    ))
    .unwrap();
    assert_eq!(design.memories().len(), 0);
    assert_eq!(design.iter_cells().count(), 2);
}

#[test]
fn test_parse_error() {
    assert!(Design::from_str("%0:1 = frobnicate \"a\"\n").is_err());
    assert!(Design::from_str("%0:1 = input\n").is_err());
    let error = Design::from_str("%0:1 = input \"a\"\ngarbage\n").unwrap_err();
    assert!(format!("{}", error).contains("garbage"));
}

#[test]
fn test_constant_clock() {
    let design = Design::from_str(concat!(
        "%0:2 = input \"wd\"\n",
        "%1:3 = input \"wa\"\n",
        "%10:_ = memory depth=#8 width=#2 {\n",
        "    write addr=%1:3 data=%0:2 clk=0\n",
        "}\n",
    ))
    .unwrap();
    let write_port = &design.memories()[0].write_ports[0];
    assert!(!write_port.is_clocked());
    assert_eq!(write_port.clock, ControlNet::Pos(Net::ZERO));
}
