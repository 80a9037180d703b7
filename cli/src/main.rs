use std::error::Error;

use indexmap::IndexSet;

use memlib_libmap::{map_memory, Library};
use memlib_netlist::Design;

fn run() -> Result<(), Box<dyn Error>> {
    let mut lib_files: Vec<String> = vec![];
    let mut defines: Vec<String> = vec![];
    let mut input = String::new();
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Map the memories of a design to RAM cells described by a library.");
        parser.refer(&mut lib_files).add_option(
            &["-l", "--lib"],
            argparse::Collect,
            "Library file with RAM cell definitions; may be given more than once",
        );
        parser.refer(&mut defines).add_option(
            &["-D", "--define"],
            argparse::Collect,
            "Enable a condition checked within the library files; may be given any number of times",
        );
        parser.refer(&mut input).add_argument("DESIGN", argparse::Store, "Design file to map");
        parser.parse_args_or_exit();
    }

    let mut library = Library::new(IndexSet::from_iter(defines));
    for file in &lib_files {
        let source = std::fs::read_to_string(file)?;
        memlib_libmap::parse(file, &source, &mut library)?;
    }
    library.prepare();

    let design: Design = std::fs::read_to_string(&input)?.parse()?;
    let sigmap = design.xmux_map();
    for (index, memory) in design.memories().iter().enumerate() {
        let outcome = map_memory(&design, &sigmap, memory, &library)?;
        println!("memory {} ({}x{}):", index, memory.depth, memory.width);
        if outcome.cfgs.is_empty() && !outcome.logic_ok {
            println!("- not mappable");
        } else {
            print!("{}", outcome.describe(&library));
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(error) = run() {
        eprintln!("error: {}", error);
        std::process::exit(1)
    }
}
