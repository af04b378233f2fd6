use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
    time::Instant,
};

use recspl::{
    codegen::{intermediate::IntermediateGenerator, target::TargetGenerator},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::scope_analysis::ScopeAnalyzer,
    type_checker::type_checker::type_check,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: recspl <source file>");
        process::exit(1);
    }

    let source = match fs::read_to_string(&args[1]) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args[1], e);
            process::exit(1);
        }
    };

    let out_dir = PathBuf::from("out");
    if !out_dir.exists() {
        if let Err(e) = fs::create_dir(&out_dir) {
            eprintln!("Failed to create output directory: {}", e);
            process::exit(1);
        }
    }

    let start = Instant::now();

    let tokens = tokenize(&source).unwrap_or_else(|e| fail(&e.to_string()));
    println!("Tokenized in {:?}", start.elapsed());

    let parse_start = Instant::now();
    let mut tree = parse(tokens).unwrap_or_else(|e| fail(&e.to_string()));
    println!("Parsed in {:?}", parse_start.elapsed());

    let scope_start = Instant::now();
    let mut table = ScopeAnalyzer::new()
        .resolve(&mut tree)
        .unwrap_or_else(|e| fail(&e.to_string()));
    println!("Resolved scopes in {:?}", scope_start.elapsed());

    let check_start = Instant::now();
    let verdict = type_check(&tree, &mut table).unwrap_or_else(|e| fail(&e.to_string()));
    println!("Type checked in {:?}", check_start.elapsed());
    if !verdict {
        fail("type check failed");
    }

    write_out(&out_dir.join("symbols.txt"), &table.render());

    let lower_start = Instant::now();
    let intermediate = IntermediateGenerator::new(&table)
        .lower(&tree)
        .unwrap_or_else(|e| fail(&e.to_string()));
    write_out(&out_dir.join("intermediate.txt"), &intermediate);
    println!("Lowered in {:?}", lower_start.elapsed());

    let target_start = Instant::now();
    let target = TargetGenerator::new(&table)
        .generate(&tree)
        .unwrap_or_else(|e| fail(&e.to_string()));
    write_out(&out_dir.join("target.bas"), &target);
    println!("Generated target in {:?}", target_start.elapsed());

    println!("Total time: {:?}", start.elapsed());
}

fn write_out(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {}: {}", path.display(), e);
        process::exit(1);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}
