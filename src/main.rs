//! COSMAC ELF Emulator - CLI Entry Point
//!
//! Commands:
//! - `cosmac-elf run <program>` - Run an image or ASM file on an ELF
//! - `cosmac-elf asm <source>` - Assemble to a binary image
//! - `cosmac-elf disasm <image>` - Disassemble a binary image
//! - `cosmac-elf test` - Built-in self-test
//!
//! Set `RUST_LOG=debug` (or `trace`) for emulator logging.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cosmac-elf")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "An RCA CDP1802 emulator with a COSMAC ELF front panel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it idles or the cycle limit is reached
    Run {
        /// Path to the binary image or ASM file to execute
        program: String,
        /// Maximum number of machine cycles to run
        #[arg(short, long, default_value = "100000")]
        max_cycles: u64,
        /// Print every instruction as it executes
        #[arg(short, long)]
        trace: bool,
        /// Machine configuration (JSON)
        #[arg(short, long)]
        config: Option<String>,
        /// Data switch setting, e.g. 0x42 or 42h
        #[arg(short, long)]
        switches: Option<String>,
        /// Print the final register file as JSON
        #[arg(long)]
        dump_state: bool,
    },
    /// Assemble source to a binary image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file (default: source with .bin extension)
        #[arg(short, long)]
        output: Option<String>,
        /// Print the symbol table
        #[arg(long)]
        symbols: bool,
    },
    /// Disassemble a binary image to assembler text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, config, switches, dump_state }) => {
            run_program(&program, max_cycles, trace, config.as_deref(), switches.as_deref(), dump_state);
        }
        Some(Commands::Asm { source, output, symbols }) => {
            assemble_file(&source, output, symbols);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("COSMAC ELF Emulator v0.1.0");
            println!("An RCA CDP1802 emulator and assembler");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn run_program(
    path: &str,
    max_cycles: u64,
    trace: bool,
    config_path: Option<&str>,
    switches: Option<&str>,
    dump_state: bool,
) {
    use cosmac::asm::{disassemble_instruction, load_program};
    use cosmac::{Bus, Elf, MachineConfig};

    println!("🔧 Running: {}", path);

    let config = match config_path {
        Some(config_path) => match MachineConfig::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => MachineConfig::default(),
    };

    let program = match load_program(path) {
        Ok(bytes) => {
            println!("📂 Loaded {} bytes", bytes.len());
            bytes
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    };

    let mut elf = match Elf::new(config) {
        Ok(elf) => elf,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = elf.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    if let Some(text) = switches {
        match parse_switches(text) {
            Some(value) => elf.set_switches(value),
            None => {
                eprintln!("❌ Invalid switch setting: {}", text);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Execution ━━━");

    elf.set_run(true);
    let mut cycles = 0u64;
    while cycles < max_cycles && !elf.cpu().is_idle() {
        if trace {
            let pc = elf.cpu().pc();
            let bytes: Vec<u8> = (0..3).map(|i| elf.cpu().bus().read(pc.wrapping_add(i))).collect();
            let (text, _) = disassemble_instruction(&bytes);
            let regs = elf.regs();
            println!("{:04X}: {:<12} D={:02X} DF={} X={:X} Q={}", pc, text, regs.d(), regs.df() as u8, regs.x(), regs.q() as u8);
        }
        cycles += elf.step() as u64;
    }

    let regs = elf.regs();
    println!();
    println!("━━━ Result ━━━");
    println!("Cycles:  {}", cycles);
    println!("State:   {}", if elf.cpu().is_idle() { "idle" } else { "running" });
    println!("D:       {:02X}  DF: {}", regs.d(), regs.df() as u8);
    println!("P:       {:X}   X: {:X}   R(P): {:04X}", regs.p(), regs.x(), regs.pc());
    println!("Q (LED): {}", if elf.led() { "on" } else { "off" });
    println!("Display: {:02X}", elf.display());

    if dump_state {
        match serde_json::to_string_pretty(regs) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("❌ Failed to serialize state: {}", e),
        }
    }

    if cycles >= max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

/// Parse `0x42`, `42h` or decimal.
fn parse_switches(text: &str) -> Option<u8> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_suffix(['h', 'H']) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn assemble_file(source_path: &str, output: Option<String>, symbols: bool) {
    use cosmac::asm::{assemble_program, save_image};
    use std::path::Path;

    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path).with_extension("bin").display().to_string()
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let program = match assemble_program(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} bytes", program.bytes.len());

    if symbols {
        println!();
        for symbol in program.symbols.sorted() {
            println!("  {:<6} {:04X}  (line {})", symbol.name, symbol.address, symbol.line);
        }
        println!();
    }

    if let Err(e) = save_image(&out_path, &program.bytes) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use cosmac::asm::{disassemble, load_image};

    println!("📖 Disassembling: {}", image_path);
    println!();

    let image = match load_image(image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&image, 0));
}

fn run_self_test() {
    use cosmac::asm::{assemble, disassemble_instruction};
    use cosmac::cpu::OPCODE_TABLE;
    use cosmac::{Cpu, Elf, ElfBus};

    println!("━━━ CDP1802 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: Decode table coverage
    print!("Opcode table covers all 256 bytes... ");
    let ok = OPCODE_TABLE
        .iter()
        .enumerate()
        .all(|(op, info)| info.cycles == if op >> 4 == 0xC { 3 } else { 2 });
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 2: Forward references
    print!("Assembler forward reference... ");
    match assemble("BR LBL\nLBL: LDI 5") {
        Ok(bytes) if bytes == [0x30, 0x02, 0xF8, 0x05] => { println!("✓"); passed += 1; }
        other => { println!("✗ (got {:?})", other); failed += 1; }
    }

    // Test 3: Disassembly reassembles
    print!("Disassembler output reassembles... ");
    let ok = (0..=255u8).all(|op| {
        let bytes = [op, 0x12, 0x34];
        let (text, size) = disassemble_instruction(&bytes);
        matches!(assemble(&format!("  {}", text)), Ok(out) if out == bytes[..size])
    });
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 4: Arithmetic
    print!("ADD sets DF on carry... ");
    let mut cpu = Cpu::new(ElfBus::default());
    let loaded = assemble("  LDI 0F0h\n  ADI 20h\n  IDL")
        .map(|program| cpu.bus_mut().load(0, &program).is_ok())
        .unwrap_or(false);
    cpu.reset();
    cpu.run(6);
    if loaded && cpu.regs().d() == 0x10 && cpu.regs().df() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (D={:02X}, DF={})", cpu.regs().d(), cpu.regs().df());
        failed += 1;
    }

    // Test 5: Ring shift
    print!("SHRC shifts DF into bit 7... ");
    let mut cpu = Cpu::new(ElfBus::default());
    let loaded = assemble("  LDI 01h\n  SHR\n  LDI 00h\n  SHRC\n  IDL")
        .map(|program| cpu.bus_mut().load(0, &program).is_ok())
        .unwrap_or(false);
    cpu.reset();
    cpu.run(8);
    if loaded && cpu.regs().d() == 0x80 && !cpu.regs().df() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (D={:02X}, DF={})", cpu.regs().d(), cpu.regs().df());
        failed += 1;
    }

    // Test 6: ELF load mode and Q LED
    print!("ELF DMA load and Q LED... ");
    let mut elf = Elf::default();
    let loaded = assemble("  SEQ\n  IDL")
        .ok()
        .map(|program| elf.load_program(&program).is_ok())
        .unwrap_or(false);
    elf.set_run(true);
    elf.frame();
    if loaded && elf.led() && elf.cpu().is_idle() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
