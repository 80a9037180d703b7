use std::str::FromStr;

use indexmap::IndexSet;

use memlib_libmap::{map_memory, Library, MapOutcome};
use memlib_netlist::Design;

fn library(source: &str) -> Library {
    let mut lib = Library::new(IndexSet::new());
    memlib_libmap::parse("test.lib", source, &mut lib).unwrap();
    lib
}

fn map_first(design: &Design, lib: &Library) -> MapOutcome {
    let sigmap = design.xmux_map();
    map_memory(design, &sigmap, &design.memories()[0], lib).unwrap()
}

// A single-port memory whose read enable is the complement of "any write
// mask bit set": writing and reading never happen at once.
fn exclusive_design() -> Design {
    Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"addr\"\n",
        "%20:1 = input \"clk\"\n",
        "%21:4 = input \"we\"\n",
        "%22:1 = or %21+0 %21+1\n",
        "%23:1 = or %21+2 %21+3\n",
        "%24:1 = or %22 %23\n",
        "%25:1 = not %24\n",
        "%30:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 mask=%21:4 clk=%20\n",
        "    %30:4 = read addr=%10:4 clk=%20 en=%25 [undef]\n",
        "}\n",
        "%40:0 = output \"rd\" %30:4\n",
    ))
    .unwrap()
}

// The same memory, but the read enable is an unrelated input.
fn unrelated_design() -> Design {
    Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"addr\"\n",
        "%20:1 = input \"clk\"\n",
        "%21:4 = input \"we\"\n",
        "%25:1 = input \"re\"\n",
        "%30:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 mask=%21:4 clk=%20\n",
        "    %30:4 = read addr=%10:4 clk=%20 en=%25 [undef]\n",
        "}\n",
        "%40:0 = output \"rd\" %30:4\n",
    ))
    .unwrap()
}

const EXCLUDES_LIB: &str = concat!(
    "ram block $BRAM {\n",
    "    dims 4 4;\n",
    "    port srsw \"A\" {\n",
    "        rden write-excludes;\n",
    "    }\n",
    "}\n",
);

const IMPLIES_LIB: &str = concat!(
    "ram block $BRAM {\n",
    "    dims 4 4;\n",
    "    port srsw \"A\" {\n",
    "        rden write-implies;\n",
    "    }\n",
    "}\n",
);

#[test]
fn test_write_excludes_proved() {
    let outcome = map_first(&exclusive_design(), &library(EXCLUDES_LIB));
    assert_eq!(outcome.cfgs.len(), 1);
    let pcfg = &outcome.cfgs[0].rd_ports[0];
    assert_eq!(pcfg.wr_port, Some(0));
    assert!(!pcfg.emu_en);
}

#[test]
fn test_write_excludes_refuted() {
    // nothing stops the unrelated enable from being high during a write, so
    // the candidate is dropped
    let outcome = map_first(&unrelated_design(), &library(EXCLUDES_LIB));
    assert!(outcome.cfgs.is_empty());
}

#[test]
fn test_write_implies_proved() {
    // the read enable is "any write mask bit set" itself, so a write always
    // implies a read
    let design = Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"addr\"\n",
        "%20:1 = input \"clk\"\n",
        "%21:4 = input \"we\"\n",
        "%22:1 = or %21+0 %21+1\n",
        "%23:1 = or %21+2 %21+3\n",
        "%24:1 = or %22 %23\n",
        "%30:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 mask=%21:4 clk=%20\n",
        "    %30:4 = read addr=%10:4 clk=%20 en=%24 [undef]\n",
        "}\n",
        "%40:0 = output \"rd\" %30:4\n",
    ))
    .unwrap();
    let outcome = map_first(&design, &library(IMPLIES_LIB));
    assert_eq!(outcome.cfgs.len(), 1);
    assert!(!outcome.cfgs[0].rd_ports[0].emu_en);
}

#[test]
fn test_write_implies_unproved() {
    // an unrelated enable cannot be proved to cover writes; the enable gets
    // emulated instead of the candidate dying
    let outcome = map_first(&unrelated_design(), &library(IMPLIES_LIB));
    assert_eq!(outcome.cfgs.len(), 1);
    assert!(outcome.cfgs[0].rd_ports[0].emu_en);
}

#[test]
fn test_shared_port_addr_compatibility() {
    // the write address is muxed with a fully-undef value; the undef-mux
    // map must see through it for the ports to share the primitive port
    let design = Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"addr\"\n",
        "%15:1 = input \"sel\"\n",
        "%16:4 = mux %15 %10:4 XXXX\n",
        "%20:1 = input \"clk\"\n",
        "%30:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%16:4 data=%0:4 clk=%20\n",
        "    %30:4 = read addr=%10:4 clk=%20 [undef]\n",
        "}\n",
        "%40:0 = output \"rd\" %30:4\n",
    ))
    .unwrap();
    let lib = library("ram block $BRAM { dims 4 4; port srsw \"A\" { rden any; } }\n");
    let outcome = map_first(&design, &lib);
    assert_eq!(outcome.cfgs.len(), 1);
    assert_eq!(outcome.cfgs[0].rd_ports[0].wr_port, Some(0));

    // distinct addresses do not share; with only one port group and no
    // separate read port, the memory is infeasible
    let design = Design::from_str(concat!(
        "%0:4 = input \"wd\"\n",
        "%10:4 = input \"addr\"\n",
        "%11:4 = input \"raddr\"\n",
        "%20:1 = input \"clk\"\n",
        "%30:_ = memory depth=#16 width=#4 {\n",
        "    write addr=%10:4 data=%0:4 clk=%20\n",
        "    %30:4 = read addr=%11:4 clk=%20 [undef]\n",
        "}\n",
        "%40:0 = output \"rd\" %30:4\n",
    ))
    .unwrap();
    let outcome = map_first(&design, &lib);
    assert!(outcome.cfgs.is_empty());
}
